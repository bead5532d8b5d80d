//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod message;
pub mod pool;
pub mod room;
pub mod token;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use tripchat_types::error::RepositoryError;

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that
/// lexicographic order matches chronological order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Map a sqlx error to the repository taxonomy.
///
/// `PoolTimedOut` means no connection was handed out before the pool's
/// acquire deadline, so no statement ran.
pub(crate) fn query_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
        sqlx::Error::PoolClosed | sqlx::Error::Io(_) => RepositoryError::Connection,
        other => RepositoryError::Query(other.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let fa = format_datetime(&a);
        let fb = format_datetime(&b);
        assert_eq!(fa, "2026-01-02T03:04:05.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_datetime(&fb).unwrap(), b);
    }

    #[test]
    fn test_query_error_mapping() {
        assert!(matches!(
            query_error(sqlx::Error::PoolTimedOut),
            RepositoryError::Timeout
        ));
        assert!(matches!(
            query_error(sqlx::Error::PoolClosed),
            RepositoryError::Connection
        ));
        assert!(matches!(
            query_error(sqlx::Error::RowNotFound),
            RepositoryError::Query(_)
        ));
    }
}
