//! Transport implementations for standard library stream types.
//!
//! The absolute deadline from the buffer is converted to the relative
//! timeout the socket API wants at arming time. An already-expired
//! deadline is clamped to the smallest representable timeout so the next
//! read still fails fast instead of blocking forever.

use std::io::{self, Read};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use super::Transport;

/// Smallest timeout that does not mean "no timeout" to the OS.
const MIN_TIMEOUT: Duration = Duration::from_nanos(1);

fn deadline_to_timeout(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|d| {
        d.checked_duration_since(Instant::now())
            .filter(|t| !t.is_zero())
            .unwrap_or(MIN_TIMEOUT)
    })
}

/// Normalize the platform's receive-timeout error.
///
/// SO_RCVTIMEO expiry surfaces as `WouldBlock` on Unix and `TimedOut` on
/// Windows; callers should only ever see `TimedOut`.
fn normalize_timeout(result: io::Result<usize>) -> io::Result<usize> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
            Err(io::Error::new(io::ErrorKind::TimedOut, e))
        }
        other => other,
    }
}

impl Transport for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        normalize_timeout(Read::read(self, buf))
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        normalize_timeout(Read::read(self, buf))
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }
}

/// In-memory transport reading from a byte slice.
///
/// Each read consumes from the front of the slice; end of stream once it
/// is empty. Deadlines are accepted and ignored. Useful for tests and
/// for replaying captured traffic.
impl Transport for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn set_read_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }
}
