//! # Bootstrap phases and process exit status.
//!
//! Session establishment is an ordered, one-way sequence of phases:
//!
//! ```text
//! CreateApplication ─► DiscoverEndpoints ─► CreateSession ─► BrowseNamespace
//!        ─► CreateSubscription ─► AddMonitoredItems ─► AddSubscription ─► Running
//! ```
//!
//! The phase the session manager last entered is the only source of the exit
//! status: a failure at phase `P` exits with `P`'s code, a clean stop after
//! `Running` exits with [`ExitCode::Ok`], a stop caused by the transport
//! declaring the connection dead exits with [`ExitCode::NoKeepAlive`].

use std::fmt;

/// One ordered step of session establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapPhase {
    CreateApplication,
    DiscoverEndpoints,
    CreateSession,
    BrowseNamespace,
    CreateSubscription,
    AddMonitoredItems,
    AddSubscription,
    Running,
}

impl BootstrapPhase {
    /// The first phase of every bootstrap.
    pub const FIRST: Self = Self::CreateApplication;

    /// The phase following `self`, or `None` once `Running` is reached.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::CreateApplication => Some(Self::DiscoverEndpoints),
            Self::DiscoverEndpoints => Some(Self::CreateSession),
            Self::CreateSession => Some(Self::BrowseNamespace),
            Self::BrowseNamespace => Some(Self::CreateSubscription),
            Self::CreateSubscription => Some(Self::AddMonitoredItems),
            Self::AddMonitoredItems => Some(Self::AddSubscription),
            Self::AddSubscription => Some(Self::Running),
            Self::Running => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::CreateApplication => "create_application",
            Self::DiscoverEndpoints => "discover_endpoints",
            Self::CreateSession => "create_session",
            Self::BrowseNamespace => "browse_namespace",
            Self::CreateSubscription => "create_subscription",
            Self::AddMonitoredItems => "add_monitored_items",
            Self::AddSubscription => "add_subscription",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One-way cursor over [`BootstrapPhase`].
///
/// `enter` only accepts the phase that follows the current one, so a bootstrap
/// can neither skip nor repeat a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCursor {
    current: Option<BootstrapPhase>,
}

impl PhaseCursor {
    /// A cursor that has not entered any phase yet.
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The last phase entered.
    pub const fn current(&self) -> Option<BootstrapPhase> {
        self.current
    }

    /// The phase `enter` will accept next.
    pub const fn expected(&self) -> Option<BootstrapPhase> {
        match self.current {
            None => Some(BootstrapPhase::FIRST),
            Some(p) => p.next(),
        }
    }

    /// Enters `phase` if it is the expected successor; returns whether it moved.
    pub fn enter(&mut self, phase: BootstrapPhase) -> bool {
        if self.expected() == Some(phase) {
            self.current = Some(phase);
            true
        } else {
            false
        }
    }
}

impl Default for PhaseCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Final process status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    Ok,
    CreateApplication,
    DiscoverEndpoints,
    CreateSession,
    BrowseNamespace,
    CreateSubscription,
    AddMonitoredItems,
    AddSubscription,
    Running,
    NoKeepAlive,
    InvalidConfig,
}

impl ExitCode {
    /// Integer status handed to the operating system.
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0x00,
            Self::CreateApplication => 0x11,
            Self::DiscoverEndpoints => 0x12,
            Self::CreateSession => 0x13,
            Self::BrowseNamespace => 0x14,
            Self::CreateSubscription => 0x15,
            Self::AddMonitoredItems => 0x16,
            Self::AddSubscription => 0x17,
            Self::Running => 0x18,
            Self::NoKeepAlive => 0x30,
            Self::InvalidConfig => 0x40,
        }
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::CreateApplication => "error_create_application",
            Self::DiscoverEndpoints => "error_discover_endpoints",
            Self::CreateSession => "error_create_session",
            Self::BrowseNamespace => "error_browse_namespace",
            Self::CreateSubscription => "error_create_subscription",
            Self::AddMonitoredItems => "error_add_monitored_items",
            Self::AddSubscription => "error_add_subscription",
            Self::Running => "error_running",
            Self::NoKeepAlive => "error_no_keep_alive",
            Self::InvalidConfig => "error_invalid_config",
        }
    }
}

impl From<BootstrapPhase> for ExitCode {
    /// Status for a failure while in `phase`.
    fn from(phase: BootstrapPhase) -> Self {
        match phase {
            BootstrapPhase::CreateApplication => Self::CreateApplication,
            BootstrapPhase::DiscoverEndpoints => Self::DiscoverEndpoints,
            BootstrapPhase::CreateSession => Self::CreateSession,
            BootstrapPhase::BrowseNamespace => Self::BrowseNamespace,
            BootstrapPhase::CreateSubscription => Self::CreateSubscription,
            BootstrapPhase::AddMonitoredItems => Self::AddMonitoredItems,
            BootstrapPhase::AddSubscription => Self::AddSubscription,
            BootstrapPhase::Running => Self::Running,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:X})", self.as_label(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_until_running() {
        let mut seen = vec![BootstrapPhase::FIRST];
        while let Some(next) = seen.last().and_then(|p| p.next()) {
            seen.push(next);
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(seen.last(), Some(&BootstrapPhase::Running));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cursor_rejects_skips_and_repeats() {
        let mut cursor = PhaseCursor::new();
        assert!(!cursor.enter(BootstrapPhase::CreateSession));
        assert!(cursor.enter(BootstrapPhase::CreateApplication));
        assert!(!cursor.enter(BootstrapPhase::CreateApplication));
        assert!(cursor.enter(BootstrapPhase::DiscoverEndpoints));
        assert_eq!(cursor.current(), Some(BootstrapPhase::DiscoverEndpoints));
        assert_eq!(cursor.expected(), Some(BootstrapPhase::CreateSession));
    }

    #[test]
    fn failure_codes_follow_phase() {
        assert_eq!(ExitCode::from(BootstrapPhase::CreateSession).code(), 0x13);
        assert_eq!(ExitCode::from(BootstrapPhase::AddSubscription).code(), 0x17);
        assert_eq!(ExitCode::NoKeepAlive.code(), 0x30);
        assert!(ExitCode::Ok.is_ok());
    }
}
