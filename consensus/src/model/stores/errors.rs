use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key {0} not found in store")]
    KeyNotFound(String),

    #[error("key {0} already exists in store")]
    KeyAlreadyExists(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait StoreResultExtensions<T> {
    /// Maps a missing key to `Ok(None)`, keeping any other error
    fn optional(self) -> StoreResult<Option<T>>;
}

impl<T> StoreResultExtensions<T> for StoreResult<T> {
    fn optional(self) -> StoreResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
