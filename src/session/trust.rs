//! # Certificate trust decisions.
//!
//! A [`TrustPolicy`] answers one question for the protocol client: *accept this
//! server certificate?* Certificates that validated cleanly are accepted
//! silently. Untrusted certificates are accepted or rejected according to the
//! `accept_untrusted` flag, and every such decision is published. Any other
//! validation failure is rejected.

use crate::events::{Bus, Event, EventKind};

use super::StatusCode;

/// Certificate acceptance policy handed to [`UaClient::create_application`](crate::UaClient::create_application).
#[derive(Debug, Clone)]
pub struct TrustPolicy {
    accept_untrusted: bool,
    bus: Bus,
}

impl TrustPolicy {
    pub fn new(accept_untrusted: bool, bus: Bus) -> Self {
        Self {
            accept_untrusted,
            bus,
        }
    }

    /// Decides on a certificate with `subject` whose validation produced `status`.
    pub fn validate(&self, subject: &str, status: StatusCode) -> bool {
        if status.is_good() {
            return true;
        }
        let accept = status == StatusCode::BAD_CERTIFICATE_UNTRUSTED && self.accept_untrusted;
        let kind = if accept {
            EventKind::CertificateAccepted
        } else {
            EventKind::CertificateRejected
        };
        self.bus.publish(
            Event::new(kind)
                .with_subject(subject)
                .with_status(status),
        );
        accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_follows_flag_and_is_logged() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let strict = TrustPolicy::new(false, bus.clone());
        assert!(!strict.validate("CN=plc", StatusCode::BAD_CERTIFICATE_UNTRUSTED));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::CertificateRejected);

        let lax = TrustPolicy::new(true, bus.clone());
        assert!(lax.validate("CN=plc", StatusCode::BAD_CERTIFICATE_UNTRUSTED));
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::CertificateAccepted);
        assert_eq!(ev.subject.as_deref(), Some("CN=plc"));
    }

    #[test]
    fn other_failures_are_rejected_even_when_lax() {
        let bus = Bus::new(8);
        let lax = TrustPolicy::new(true, bus);
        assert!(!lax.validate("CN=plc", StatusCode::BAD_UNEXPECTED_ERROR));
        assert!(lax.validate("CN=plc", StatusCode::GOOD));
    }
}
