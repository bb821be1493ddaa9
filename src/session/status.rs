//! Protocol status codes.
//!
//! A [`StatusCode`] is a 32-bit value whose two top bits carry the severity
//! (`00` good, `01` uncertain, `1x` bad). Only the handful of codes the session
//! logic reacts to are named; any other value is carried through untouched.

use std::fmt;

/// 32-bit protocol status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u32);

impl StatusCode {
    pub const GOOD: Self = Self(0x0000_0000);
    pub const UNCERTAIN: Self = Self(0x4000_0000);
    pub const BAD_UNEXPECTED_ERROR: Self = Self(0x8001_0000);
    pub const BAD_COMMUNICATION_ERROR: Self = Self(0x8005_0000);
    pub const BAD_TIMEOUT: Self = Self(0x800A_0000);
    pub const BAD_SERVER_NOT_CONNECTED: Self = Self(0x800D_0000);
    pub const BAD_CERTIFICATE_UNTRUSTED: Self = Self(0x801A_0000);
    pub const BAD_NO_COMMUNICATION: Self = Self(0x8031_0000);
    pub const BAD_CONNECTION_CLOSED: Self = Self(0x80AE_0000);

    const SEVERITY_SHIFT: u32 = 30;

    /// Wraps a raw status value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw status value.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_good(self) -> bool {
        self.0 >> Self::SEVERITY_SHIFT == 0
    }

    #[inline]
    pub const fn is_uncertain(self) -> bool {
        self.0 >> Self::SEVERITY_SHIFT == 1
    }

    #[inline]
    pub const fn is_bad(self) -> bool {
        self.0 >> Self::SEVERITY_SHIFT >= 2
    }

    /// Symbolic name for the codes known to this crate.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::GOOD => "Good",
            Self::UNCERTAIN => "Uncertain",
            Self::BAD_UNEXPECTED_ERROR => "BadUnexpectedError",
            Self::BAD_COMMUNICATION_ERROR => "BadCommunicationError",
            Self::BAD_TIMEOUT => "BadTimeout",
            Self::BAD_SERVER_NOT_CONNECTED => "BadServerNotConnected",
            Self::BAD_CERTIFICATE_UNTRUSTED => "BadCertificateUntrusted",
            Self::BAD_NO_COMMUNICATION => "BadNoCommunication",
            Self::BAD_CONNECTION_CLOSED => "BadConnectionClosed",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::GOOD
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
