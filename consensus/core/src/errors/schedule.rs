use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("delegate list is empty")]
    NoDelegates,

    #[error("failed to sum round {0}: {1}")]
    SummingFailed(u64, String),

    #[error("{0}")]
    General(String),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
