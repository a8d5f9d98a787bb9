//! # sqlwire-client
//!
//! Client-side packet I/O core for the sqlwire database protocol.
//!
//! This crate implements the buffering layer that sits between a raw
//! byte-stream connection and the protocol codec: a growable,
//! double-buffered byte arena that hands out zero-copy views of incoming
//! packet bytes and lends its backing storage out for building outgoing
//! packets.
//!
//! ## Architecture
//!
//! - **Read path**: [`PacketBuffer::fill`] and [`PacketBuffer::consume`]
//!   accumulate bytes from the transport and return borrowed views.
//! - **Write path**: [`PacketBuffer::take_exact`] and friends lend
//!   mutable storage; [`PacketBuffer::store`] hands it back.
//! - **Slot flipping**: [`PacketBuffer::flip`] switches which of the two
//!   cached arenas the next fill writes into, so storage backing the
//!   previous packet is never clobbered mid-decode.
//!
//! The protocol state machine (packet framing, handshake, authentication)
//! and connection lifecycle are deliberately out of scope; they drive
//! this layer through [`Transport`] and the buffer API. One buffer serves
//! one connection, from one thread, for the connection's whole life.
//!
//! ## Example
//!
//! ```no_run
//! use std::net::TcpStream;
//! use sqlwire_client::PacketBuffer;
//!
//! fn main() -> sqlwire_client::Result<()> {
//!     let conn = TcpStream::connect("127.0.0.1:4406")?;
//!     let mut buf = PacketBuffer::new(conn);
//!
//!     let header = buf.consume(4)?;
//!     println!("first packet header: {header:?}");
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod error;
pub mod transport;

pub use buffer::{
    BufferConfig, PacketBuffer, DEFAULT_ARENA_SIZE, MAX_CACHED_ARENA_SIZE, MAX_PACKET_SIZE,
};
pub use error::{Result, SqlwireError};
pub use transport::Transport;
