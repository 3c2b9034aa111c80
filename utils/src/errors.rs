use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SingleflightError<E> {
    /// The error produced by the leader's call, shared with every waiter.
    #[error("{0}")]
    InternalError(E),

    #[error("singleflight leader was dropped before completing its call")]
    LeaderDropped,
}
