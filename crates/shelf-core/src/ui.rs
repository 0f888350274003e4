//! UI collaborator interface
//!
//! The library never prints or prompts on its own. Front ends implement
//! [`Ui`] to show notifications and answer confirmation prompts.

use std::fmt;

/// How prominently a notification should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification and confirmation hooks provided by a front end
pub trait Ui: Send + Sync {
    /// Show a message to the user
    fn notify(&self, message: &str, severity: Severity);

    /// Ask a yes/no question; `true` means the user agreed
    ///
    /// Called from async library operations and expected to return
    /// promptly. During `Library::import` it runs while the library's state
    /// lock is held, so a front end that waits on user input here stalls
    /// other library calls until it answers; async front ends should answer
    /// from state they already have or collect the answer up front.
    fn confirm(&self, message: &str) -> bool;
}

impl<T: Ui + ?Sized> Ui for &T {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity)
    }

    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}
