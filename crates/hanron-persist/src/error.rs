use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread {thread_id} does not belong to {owner_id}")]
    Forbidden { thread_id: String, owner_id: String },

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    /// True when the backend could not be reached; callers should ask the
    /// user to try again rather than treat the request as invalid.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            #[cfg(feature = "mongodb")]
            Self::Database(e) => {
                use mongodb::error::ErrorKind;
                matches!(
                    *e.kind,
                    ErrorKind::ServerSelection { .. }
                        | ErrorKind::Io(_)
                        | ErrorKind::ConnectionPoolCleared { .. }
                )
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
