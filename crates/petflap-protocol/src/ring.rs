//! Fixed-capacity receive ring buffer.
//!
//! The write index is only advanced by the receive side and the read index
//! only by the consumer. One slot always stays free so that `read == write`
//! unambiguously means "empty": the ring holds at most
//! [`RX_BUFFER_SIZE`]` - 1` bytes.

/// Storage size of the ring in bytes.
pub const RX_BUFFER_SIZE: usize = 16;

/// Receive error counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    /// Bytes dropped because the ring was full.
    pub overflows: u32,
}

#[derive(Debug, Clone)]
pub struct RxRing {
    buffer: [u8; RX_BUFFER_SIZE],
    write: usize,
    read: usize,
    stats: RxStats,
}

impl Default for RxRing {
    fn default() -> Self {
        Self::new()
    }
}

fn advance(index: usize) -> usize {
    (index + 1) % RX_BUFFER_SIZE
}

impl RxRing {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; RX_BUFFER_SIZE],
            write: 0,
            read: 0,
            stats: RxStats { overflows: 0 },
        }
    }

    /// Append a received byte.
    ///
    /// On a full ring the byte is discarded, the overflow counter is
    /// incremented and `false` is returned. Unread data is never touched.
    pub fn push(&mut self, byte: u8) -> bool {
        let next = advance(self.write);
        if next == self.read {
            self.stats.overflows = self.stats.overflows.wrapping_add(1);
            return false;
        }
        self.buffer[self.write] = byte;
        self.write = next;
        true
    }

    /// Take the oldest unread byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buffer[self.read];
        self.read = advance(self.read);
        Some(byte)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        (self.write + RX_BUFFER_SIZE - self.read) % RX_BUFFER_SIZE
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        advance(self.write) == self.read
    }

    /// Bytes the ring can hold at once.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        RX_BUFFER_SIZE - 1
    }

    #[must_use]
    pub fn stats(&self) -> RxStats {
        self.stats
    }
}
