//! Transport module - the byte-stream boundary under the packet buffer.
//!
//! The buffer needs exactly two things from a connection: blocking reads
//! and a per-read deadline. [`Transport`] captures that surface and
//! nothing else; connection lifecycle (connect, close, TLS) stays with
//! the caller.
//!
//! Provided implementations:
//! - `std::net::TcpStream`
//! - `std::os::unix::net::UnixStream` (Unix only)
//! - `&[u8]` - in-memory replay for tests and doctests

mod stream;

use std::io;
use std::time::Instant;

/// Blocking byte source with a per-read deadline.
///
/// Mirrors the reading half of a socket: `read` may return fewer bytes
/// than requested and returns `Ok(0)` at end of stream.
pub trait Transport {
    /// Read into `buf`, blocking until at least one byte arrives, the
    /// armed deadline expires, or the stream ends.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Arm the deadline applied to subsequent reads.
    ///
    /// `None` clears any previously armed deadline.
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;
}
