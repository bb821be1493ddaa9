use std::fmt;

/// Connection state of a [`SessionManager`](crate::SessionManager).
///
/// ```text
/// Disconnected ─► Connecting ─► Connected ◄──────────────┐
///                     │            │ bad keep-alive       │ reconnect ok
///                     │            ▼                      │
///                     │        Reconnecting ──────────────┘
///                     │            │ keep-alive stopped
///                     ▼            ▼
///                  Failed ◄────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl SessionState {
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
