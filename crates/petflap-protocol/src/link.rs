//! Serial link over a shared receive ring and a line writer.

use crate::ring::{RxRing, RxStats};
use petflap_hardware::SerialLink;
use std::{
    io::Write,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::warn;

fn lock(ring: &Mutex<RxRing>) -> MutexGuard<'_, RxRing> {
    ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Main-loop side of the serial link.
///
/// Received bytes come from the ring filled through the paired
/// [`RxFeeder`]; lines are written to `W` with a CR LF terminator.
#[derive(Debug)]
pub struct RingLink<W> {
    ring: Arc<Mutex<RxRing>>,
    out: W,
}

impl<W: Write> RingLink<W> {
    pub fn new(out: W) -> (Self, RxFeeder) {
        let ring = Arc::new(Mutex::new(RxRing::new()));
        let feeder = RxFeeder {
            ring: Arc::clone(&ring),
        };
        (Self { ring, out }, feeder)
    }

    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<W: Write> SerialLink for RingLink<W> {
    fn read_byte(&mut self) -> Option<u8> {
        lock(&self.ring).pop()
    }

    fn byte_available(&self) -> bool {
        !lock(&self.ring).is_empty()
    }

    fn write_line(&mut self, line: &str) {
        let result = write!(self.out, "{line}\r\n").and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "Failed to write serial line");
        }
    }
}

/// Receive side of a [`RingLink`], the role of the UART interrupt.
#[derive(Debug, Clone)]
pub struct RxFeeder {
    ring: Arc<Mutex<RxRing>>,
}

impl RxFeeder {
    /// Store a received byte; `false` when it was dropped on a full ring.
    pub fn push(&self, byte: u8) -> bool {
        lock(&self.ring).push(byte)
    }

    /// `true` when the ring has room for one more byte.
    pub fn has_room(&self) -> bool {
        !lock(&self.ring).is_full()
    }

    pub fn stats(&self) -> RxStats {
        lock(&self.ring).stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fed_bytes_are_read_by_link() {
        let (mut link, feeder) = RingLink::new(Vec::new());
        assert!(!link.byte_available());

        assert!(feeder.push(b'S'));
        assert!(link.byte_available());
        assert_eq!(link.read_byte(), Some(b'S'));
        assert_eq!(link.read_byte(), None);
    }

    #[test]
    fn test_lines_end_with_crlf() {
        let (mut link, _feeder) = RingLink::new(Vec::new());
        link.write_line("STATUS: ok");
        link.write_line("Total: 0");
        let written = String::from_utf8(link.into_writer()).unwrap();
        assert_eq!(written, "STATUS: ok\r\nTotal: 0\r\n");
    }

    #[test]
    fn test_feeder_reports_overflow() {
        let (_link, feeder) = RingLink::new(std::io::sink());
        while feeder.has_room() {
            assert!(feeder.push(0));
        }
        assert!(!feeder.push(1));
        assert_eq!(feeder.stats().overflows, 1);
    }
}
