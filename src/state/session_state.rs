/// Browser session state definitions
///
/// A session never notices its own death: it moves to `Dead` only when a
/// navigation attempt reports that the browser is gone.
use std::fmt;

/// Represents the current state of the browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No browser is running (never opened, or released by `close`)
    #[default]
    Closed,

    /// The browser is running and accepted the last navigation
    Active,

    /// The last navigation found the browser crashed or disconnected
    Dead,
}

impl SessionState {
    /// Returns true if navigation can be attempted
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if a restart is needed before the next navigation
    pub fn needs_restart(&self) -> bool {
        matches!(self, Self::Dead)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Active => "active",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
