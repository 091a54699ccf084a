//! # Tessera Core UI Bridge Errors
//!
//! Defines [`UiBridgeError`] for failures while talking to the host's user
//! interface, such as an unreadable answer to a confirmation prompt.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UiBridgeError {
    #[error("Failed to read user input: {0}")]
    InputError(#[from] std::io::Error),

    #[error("Unrecognised answer: '{0}'")]
    InvalidAnswer(String),
}
