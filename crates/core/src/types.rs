use uuid::Uuid;

/// Session primary keys are random UUIDv4 values.
pub type SessionId = Uuid;

/// Opaque identifier of the authenticated principal.
pub type UserId = Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
