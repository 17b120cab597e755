//! Rejections raised by the social state machines.
//!
//! Storage failures stay plain `anyhow` errors; the variants below are the
//! rule violations callers may want to tell apart, recoverable with
//! `err.downcast_ref::<SocialError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocialError {
    #[error("friendship already exists")]
    AlreadyExists,

    #[error("cannot create a relation with yourself")]
    SelfRelation,

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("cannot {action} from status '{from}'")]
    InvalidTransition { from: String, action: &'static str },

    #[error("{0} not found")]
    NotFound(String),

    #[error("not registered for this event")]
    NotRegistered,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SocialError {
    /// Extract a `SocialError` from an `anyhow` chain, if one is there
    pub fn from_anyhow(err: &anyhow::Error) -> Option<&SocialError> {
        err.downcast_ref::<SocialError>()
    }
}
