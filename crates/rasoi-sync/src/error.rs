use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Db(#[from] rasoi_db::DbError),

    #[error("Remote error: {0}")]
    Remote(#[from] rasoi_remote::RemoteError),

    #[error("Invalid draft: {0}")]
    Draft(#[from] rasoi_core::DraftError),

    #[error("No signed-in user")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, SyncError>;
