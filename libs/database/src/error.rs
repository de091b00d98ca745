/// Errors raised while establishing or preparing the database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection failed after {attempts} attempts: {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Migration error: {0}")]
    MigrationError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
