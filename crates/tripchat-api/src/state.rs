//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository traits, but AppState pins them to the
//! SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use tripchat_core::service::message::MessageStore;
use tripchat_core::service::resolver::RoomResolver;
use tripchat_core::service::room::RoomRegistry;
use tripchat_core::service::user::UserService;
use tripchat_infra::config::{load_config, resolve_data_dir};
use tripchat_infra::sqlite::message::SqliteMessageRepository;
use tripchat_infra::sqlite::pool::{DatabasePool, database_url};
use tripchat_infra::sqlite::room::SqliteRoomRepository;
use tripchat_infra::sqlite::token::SqliteAccessTokenRepository;
use tripchat_infra::sqlite::user::SqliteUserDirectory;
use tripchat_types::config::ChatConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteRoomRegistry = RoomRegistry<SqliteRoomRepository, SqliteUserDirectory>;

pub type ConcreteMessageStore = MessageStore<SqliteMessageRepository, SqliteRoomRepository>;

pub type ConcreteRoomResolver = RoomResolver<SqliteRoomRepository, SqliteUserDirectory>;

pub type ConcreteUserService = UserService<SqliteUserDirectory>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<ConcreteRoomRegistry>,
    pub messages: Arc<ConcreteMessageStore>,
    pub resolver: Arc<ConcreteRoomResolver>,
    pub users: Arc<ConcreteUserService>,
    pub tokens: SqliteAccessTokenRepository,
    pub config: Arc<ChatConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir), config.storage_timeout()).await?;

        Ok(Self::from_parts(config, data_dir, db_pool))
    }

    /// Wire services over an already opened pool.
    pub fn from_parts(config: ChatConfig, data_dir: PathBuf, db_pool: DatabasePool) -> Self {
        let room_repo = SqliteRoomRepository::new(db_pool.clone());
        let user_dir = SqliteUserDirectory::new(db_pool.clone());

        let rooms = RoomRegistry::new(room_repo.clone(), user_dir.clone(), config.clone());
        let resolver = RoomResolver::new(room_repo.clone(), user_dir.clone(), &config);
        let messages = MessageStore::new(
            SqliteMessageRepository::new(db_pool.clone()),
            room_repo,
            config.clone(),
        );
        let users = UserService::new(user_dir, &config);

        Self {
            rooms: Arc::new(rooms),
            messages: Arc::new(messages),
            resolver: Arc::new(resolver),
            users: Arc::new(users),
            tokens: SqliteAccessTokenRepository::new(db_pool.clone()),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tripchat_types::user::{Role, UserId};

    /// State over a fresh database seeded with users 1, 2 and 3 plus admin 9.
    ///
    /// The returned directory must outlive the state.
    pub(crate) async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path()), ChatConfig::default().storage_timeout())
            .await
            .unwrap();
        let state = AppState::from_parts(ChatConfig::default(), dir.path().to_path_buf(), pool);
        for (id, role) in [(1, Role::User), (2, Role::User), (3, Role::User), (9, Role::Admin)] {
            state
                .users
                .upsert_user(UserId(id), &format!("User {id}"), None, role)
                .await
                .unwrap();
        }
        (state, dir)
    }
}
