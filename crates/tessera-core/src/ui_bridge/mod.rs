//! # Tessera Core UI Bridge
//!
//! The narrow interface through which the plugin core talks to the user.
//!
//! The core never renders anything itself. It asks yes/no questions
//! ([`ConfirmRequest`]), offers a choice when a plugin misbehaves
//! ([`FailureRequest`]) and hands over batch reports ([`Notice`]); the host
//! decides how to present them by implementing [`HostUi`].
//!
//! Destructive actions such as removing a plugin from the configuration only
//! happen after [`HostUi::confirm`] returned `Some(true)`. `None` means no
//! answer was available, and the core then takes the non-destructive path.
pub mod error;
pub mod messages;

pub use error::UiBridgeError;
pub use messages::{ConfirmRequest, FailureAction, FailureRequest, Notice};

/// UI message severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

/// User interaction capabilities the host provides to the plugin core
pub trait HostUi: Send + Sync {
    /// Asks a yes/no question; `None` when no answer can be obtained
    fn confirm(&self, request: &ConfirmRequest) -> Option<bool>;

    /// Shows a batch report
    fn notify(&self, notice: &Notice);

    /// Asks how to deal with a plugin that caused a failure; `None` keeps it
    fn choose_failure_action(&self, request: &FailureRequest) -> Option<FailureAction> {
        log::debug!("No user available to answer: {}", request);
        None
    }
}

/// UI for unattended runs: never answers, logs every notice
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessUi;

impl HostUi for HeadlessUi {
    fn confirm(&self, request: &ConfirmRequest) -> Option<bool> {
        log::debug!("No user available to answer: {}", request);
        None
    }

    fn notify(&self, notice: &Notice) {
        let text = notice.to_string();
        match notice.severity() {
            MessageSeverity::Debug => log::debug!("{}: {}", notice.title(), text.trim_end()),
            MessageSeverity::Info => log::info!("{}: {}", notice.title(), text.trim_end()),
            MessageSeverity::Warning => log::warn!("{}: {}", notice.title(), text.trim_end()),
            MessageSeverity::Error => log::error!("{}: {}", notice.title(), text.trim_end()),
        }
    }
}

#[cfg(test)]
mod tests;
