//! Diagnostic serial protocol of the pet door.
//!
//! The protocol is byte oriented and has no line framing on the receive
//! side. A command is a single leading byte, optionally followed by
//! fixed-width parameters:
//!
//! | Byte | Command       | Parameters                                     |
//! |------|---------------|------------------------------------------------|
//! | `S`  | status        | none                                           |
//! | `C`  | configuration | `S` (write) or any other byte (read), index, value LE if writing |
//! | `M`  | mode change   | mode byte (0-6)                                |
//! | `L`  | list tags     | none                                           |
//! | `A`  | add tag       | 6 identifier bytes, key LE                     |
//! | `D`  | delete tag    | 1-based slot                                   |
//! | `R`  | read tag      | 1-based slot                                   |
//!
//! Every parameter byte has its own short timeout. A timeout aborts the
//! command and nothing of it is kept; the next byte received is treated as
//! a new leading byte.
//!
//! Responses are human-readable lines, see [`Response`].
//!
//! # Receive path
//!
//! Bytes are received in interrupt context into an [`RxRing`] of 16 bytes
//! with one slot kept free. A byte arriving on a full ring is dropped and
//! counted, never overwriting unread data. [`RingLink`] exposes the
//! main-loop side of the ring as a [`SerialLink`](petflap_hardware::SerialLink).
//!
//! # Examples
//!
//! ```
//! use petflap_hardware::mock::{SimClock, SimSerial};
//! use petflap_protocol::{Command, CommandKind, CommandReader};
//!
//! let clock = SimClock::new();
//! let (mut link, handle) = SimSerial::new();
//! handle.push_bytes(&[b'D', 3]);
//!
//! let reader = CommandReader::default();
//! let lead = reader.poll_leading(&mut link).unwrap();
//! let kind = CommandKind::from_byte(lead).unwrap();
//! let command = reader.read_parameters(kind, &mut link, &clock).unwrap();
//! assert_eq!(command, Command::Delete(3));
//! ```

pub mod command;
pub mod error;
pub mod link;
pub mod response;
pub mod ring;

pub use command::{Command, CommandKind, CommandReader};
pub use error::{ProtocolError, Stage};
pub use link::{RingLink, RxFeeder};
pub use response::Response;
pub use ring::{RX_BUFFER_SIZE, RxRing, RxStats};
