use embedsync_core::StoreError;
use sea_orm::DbErr;

const TIMEOUT_MARKERS: &[&str] = &["57014", "statement timeout", "canceling statement"];

const BUSY_MARKERS: &[&str] = &[
    "40001",
    "40p01",
    "55p03",
    "53300",
    "deadlock",
    "could not serialize",
    "could not obtain lock",
    "lock not available",
    "database is locked",
    "too many connections",
];

const REJECTED_MARKERS: &[&str] = &[
    "42501",
    "42p01",
    "42703",
    "permission denied",
    "does not exist",
    "syntax error",
    "violates",
    "invalid input",
];

/// Map a database error onto the store error taxonomy.
///
/// Connection-level failures are `Unavailable`; query failures are
/// classified by SQLSTATE or message text; decoding failures are `Decode`.
/// Anything left over is `Other` and therefore retried.
#[must_use]
pub fn classify_db_err(err: &DbErr) -> StoreError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreError::Unavailable(message),
        DbErr::Json(_) | DbErr::Type(_) => StoreError::Decode(message),
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => StoreError::Rejected(message),
        _ if has(TIMEOUT_MARKERS) => StoreError::Timeout(message),
        _ if has(BUSY_MARKERS) => StoreError::Busy(message),
        _ if has(REJECTED_MARKERS) => StoreError::Rejected(message),
        _ => StoreError::Other(message),
    }
}
