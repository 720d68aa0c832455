use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer {0} is unreachable")]
    Unreachable(String),

    #[error("peer {0} returned an invalid response: {1}")]
    InvalidResponse(String, String),
}

pub type PeerResult<T> = std::result::Result<T, PeerError>;
