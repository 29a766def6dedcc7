use crate::channel::ListenerToken;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Channel '{name}' already defined with a different signature")]
    DuplicateChannel { name: String },

    #[error("Signature mismatch on channel '{name}': expected {expected}, found {found}")]
    SignatureMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Channel '{name}' is not defined")]
    UnknownChannel { name: String },

    #[error("Unknown listener token {token} on channel '{name}'")]
    UnknownToken { name: String, token: ListenerToken },

    #[error("Listener '{listener}' failed on channel '{name}': {source}")]
    ListenerFailure {
        name: String,
        listener: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Script registration on channel '{name}' rejected: initialization phase is over")]
    RegistrationClosed { name: String },
}

pub type EventResult<T> = Result<T, EventError>;
