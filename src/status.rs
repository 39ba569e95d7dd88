//! Periodic status frame reporter.
//!
//! Broadcasts one fixed-ID 8-byte frame every 100 ms: byte 0 carries the
//! neutral-switch state, byte 1 the throttle-enable state, and the
//! remaining bytes are reserved as zero. Pure reporting: nothing in the
//! frame feeds back into any control decision.

use crate::config::CanProfile;
use crate::traits::{CanBus, CanFrame};

/// Builds and transmits the status frame.
#[derive(Clone, Copy, Debug)]
pub struct StatusReporter {
    status_id: u32,
}

impl StatusReporter {
    /// Create a reporter transmitting on the profile's status ID.
    pub fn new(profile: &CanProfile) -> Self {
        Self {
            status_id: profile.status_id,
        }
    }

    /// Build the 8-byte status frame.
    pub fn frame(&self, in_neutral: bool, throttle_enabled: bool) -> CanFrame {
        let payload = [
            in_neutral as u8,
            throttle_enabled as u8,
            0,
            0,
            0,
            0,
            0,
            0,
        ];
        // 8-byte payload always fits
        CanFrame::new(self.status_id, &payload).unwrap()
    }

    /// Transmit the status frame.
    pub fn send<B: CanBus>(
        &self,
        bus: &mut B,
        in_neutral: bool,
        throttle_enabled: bool,
    ) -> Result<(), B::Error> {
        bus.transmit(&self.frame(in_neutral, throttle_enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockCanBus;

    #[test]
    fn frame_layout() {
        let reporter = StatusReporter::new(&CanProfile::default());
        let frame = reporter.frame(true, false);

        assert_eq!(frame.id, CanProfile::default().status_id);
        assert_eq!(frame.dlc(), 8);
        assert_eq!(&frame.data[..], &[1, 0, 0, 0, 0, 0, 0, 0]);

        let frame = reporter.frame(false, true);
        assert_eq!(&frame.data[..2], &[0, 1]);
    }

    #[test]
    fn send_transmits_on_status_id() {
        let reporter = StatusReporter::new(&CanProfile::default());
        let mut bus = MockCanBus::new();

        reporter.send(&mut bus, false, true).unwrap();
        reporter.send(&mut bus, true, true).unwrap();

        let sent = bus.transmitted_with_id(CanProfile::default().status_id);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].data[0], 1);
    }
}
