//! CAN controller abstraction: frames, error counters, and the bus trait.
//!
//! The controller is an external collaborator; the core only needs four
//! things from it: drain one frame at a time, transmit the status frame,
//! sample the transmit/receive error counters, and perform a full
//! controller reset when the recovery policy asks for one.

use heapless::Vec;

/// Maximum CAN payload length in bytes (classic CAN).
pub const MAX_FRAME_DATA: usize = 8;

/// A classic CAN frame: a 29-bit extended identifier and up to 8 data
/// bytes.
///
/// # Example
///
/// ```rust
/// use rs_bcm::CanFrame;
///
/// let frame = CanFrame::new(0x0CFF_F048, &[0xB8, 0x0B]).unwrap();
/// assert_eq!(frame.id, 0x0CFF_F048);
/// assert_eq!(frame.data.len(), 2);
///
/// // Payloads longer than 8 bytes are rejected
/// assert!(CanFrame::new(0x100, &[0; 9]).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanFrame {
    /// Raw frame identifier.
    pub id: u32,
    /// Payload bytes (0 to 8).
    pub data: Vec<u8, MAX_FRAME_DATA>,
}

impl CanFrame {
    /// Create a frame from an identifier and payload slice.
    ///
    /// Returns `None` if the payload exceeds 8 bytes.
    pub fn new(id: u32, data: &[u8]) -> Option<Self> {
        let data = Vec::from_slice(data).ok()?;
        Some(Self { id, data })
    }

    /// Payload length in bytes.
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Transmit/receive error counters sampled from the CAN controller.
///
/// The controller owns these; the dispatcher only samples them for the
/// recovery policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusErrorCounters {
    /// Transmit error count.
    pub tx_errors: u8,
    /// Receive error count.
    pub rx_errors: u8,
}

/// CAN controller trait.
///
/// # Implementation Notes
///
/// - `try_receive` must not block: return `Ok(None)` when no frame is
///   pending
/// - `reset` reinitializes the controller and clears the error counters;
///   frames queued in hardware may be lost, which the recovery policy
///   accepts
pub trait CanBus {
    /// Error type for bus operations.
    type Error;

    /// Drain one pending frame, if any.
    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::Error>;

    /// Queue a frame for transmission.
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Sample the controller's error counters.
    fn error_counters(&self) -> BusErrorCounters;

    /// Reset the controller, clearing error state.
    fn reset(&mut self) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_new_accepts_up_to_eight_bytes() {
        assert!(CanFrame::new(0x100, &[]).is_some());
        assert!(CanFrame::new(0x100, &[0; 8]).is_some());
        assert!(CanFrame::new(0x100, &[0; 9]).is_none());
    }

    #[test]
    fn frame_dlc_tracks_payload() {
        let frame = CanFrame::new(0x100, &[1, 2, 3]).unwrap();
        assert_eq!(frame.dlc(), 3);
        assert_eq!(&frame.data[..], &[1, 2, 3]);
    }

    #[test]
    fn error_counters_default_to_zero() {
        let counters = BusErrorCounters::default();
        assert_eq!(counters.tx_errors, 0);
        assert_eq!(counters.rx_errors, 0);
    }
}
