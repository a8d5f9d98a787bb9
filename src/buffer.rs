//! Packet buffer - double-buffered byte arenas between a connection and
//! the protocol codec.
//!
//! [`PacketBuffer`] owns a pair of growable byte arenas ("slots") and a
//! cursor into whichever arena is currently active. It exposes two
//! symmetric protocols to the codec driving it:
//!
//! - a **read protocol** ([`fill`]/[`consume`]) that accumulates bytes
//!   from the transport until a requested amount is available, then hands
//!   back a zero-copy view;
//! - a **lend-and-return protocol** ([`take_exact`]/[`take_small`]/
//!   [`take_whole`]/[`store`]) that lends the caller a mutable region of
//!   the backing storage to build an outgoing packet in.
//!
//! # Double buffering
//!
//! The caller alone decides when to switch slots, at logical packet
//! boundaries, via [`flip`]. The next [`fill`] then writes into the other
//! slot, so the storage backing the previous packet is left untouched.
//! The buffer never flips on its own.
//!
//! # Memory retention
//!
//! Arenas grow in multiples of [`DEFAULT_ARENA_SIZE`] (configurable). A
//! grown arena is kept as the slot's storage only while it stays within
//! the cache ceiling; anything larger is used for one packet and
//! discarded, so a connection that once carried a huge result set does
//! not hold that memory for the rest of its life.
//!
//! [`fill`]: PacketBuffer::fill
//! [`consume`]: PacketBuffer::consume
//! [`flip`]: PacketBuffer::flip
//! [`take_exact`]: PacketBuffer::take_exact
//! [`take_small`]: PacketBuffer::take_small
//! [`take_whole`]: PacketBuffer::take_whole
//! [`store`]: PacketBuffer::store
//!
//! # Example
//!
//! ```
//! use sqlwire_client::PacketBuffer;
//!
//! // A byte slice works as an in-memory transport.
//! let mut buf = PacketBuffer::new(&b"\x01\x02\x03\x04"[..]);
//! let bytes = buf.consume(4).unwrap();
//! assert_eq!(bytes, [1, 2, 3, 4]);
//! ```

use std::mem;
use std::time::{Duration, Instant};

use crate::error::{Result, SqlwireError};
use crate::transport::Transport;

/// Default arena size and growth unit (bytes).
pub const DEFAULT_ARENA_SIZE: usize = 4096;

/// Largest grown arena kept between packets (bytes).
pub const MAX_CACHED_ARENA_SIZE: usize = 256 * 1024;

/// Largest payload a single protocol packet may carry.
pub const MAX_PACKET_SIZE: usize = (1 << 24) - 1;

/// Configuration for a [`PacketBuffer`].
///
/// The defaults match the protocol-wide constants; tests and unusual
/// deployments can shrink them.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Growth unit; arenas are sized in multiples of this.
    pub base_arena_size: usize,
    /// Ceiling above which a grown arena is not kept between packets.
    pub max_cached_size: usize,
    /// Largest packet the protocol allows; bounds write-path retention.
    pub max_packet_size: usize,
    /// Deadline applied to each underlying read; `None` disables it.
    pub read_timeout: Option<Duration>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            base_arena_size: DEFAULT_ARENA_SIZE,
            max_cached_size: MAX_CACHED_ARENA_SIZE,
            max_packet_size: MAX_PACKET_SIZE,
            read_timeout: None,
        }
    }
}

/// Double-buffered packet arena bound to one transport connection.
///
/// Single-caller, synchronous. The buffer holds no internal
/// synchronization and must not be shared across concurrent callers;
/// it lives exactly as long as its connection.
pub struct PacketBuffer<T> {
    /// Underlying connection; the buffer only ever reads from it.
    transport: T,
    /// Working arena; length always equals capacity.
    arena: Vec<u8>,
    /// The two cached backing arenas, selected by flip parity. The slot
    /// currently backing `arena` holds an empty `Vec`.
    slots: [Vec<u8>; 2],
    /// Which slot owns the working arena; `None` marks a one-shot arena
    /// that must not outlive its packet.
    arena_slot: Option<usize>,
    /// Throwaway arena lent out for an oversized outgoing packet.
    lend_oneshot: Option<Vec<u8>>,
    /// Offset of the first unconsumed byte in `arena`.
    cursor: usize,
    /// Count of valid unconsumed bytes starting at `cursor`.
    pending: usize,
    /// Monotonic flip counter; parity selects the next fill's slot.
    flip_count: u64,
    config: BufferConfig,
}

impl<T: Transport> PacketBuffer<T> {
    /// Create a buffer with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, BufferConfig::default())
    }

    /// Create a buffer with custom configuration.
    pub fn with_config(transport: T, config: BufferConfig) -> Self {
        Self {
            transport,
            arena: vec![0u8; config.base_arena_size],
            slots: [Vec::new(), Vec::new()],
            arena_slot: Some(0),
            lend_oneshot: None,
            cursor: 0,
            pending: 0,
            flip_count: 0,
            config,
        }
    }

    /// Switch which slot the next [`fill`](Self::fill) writes into.
    ///
    /// This is what makes zero-copy reads safe across packet boundaries:
    /// flip once a packet has been decoded and before the next one is
    /// requested, and the next fill cannot touch the storage that backed
    /// the previous packet's bytes. Timing is the caller's contract; the
    /// buffer never flips automatically, and a flip has no observable
    /// effect until the next fill runs.
    #[inline]
    pub fn flip(&mut self) {
        self.flip_count += 1;
    }

    /// Read from the transport until at least `need` valid bytes are
    /// buffered, starting at offset 0 of the active arena.
    ///
    /// Grows the arena when `need` exceeds the active slot's capacity,
    /// rounding up to the next multiple of the configured growth unit.
    /// Unconsumed bytes are carried to the front of the new storage, so
    /// growth never loses buffered data. The grown arena replaces the
    /// slot's storage only while it stays within the cache ceiling;
    /// anything larger serves this packet and is then discarded.
    ///
    /// A configured read timeout is re-armed before every underlying
    /// read, so a peer trickling a large packet across many reads gets a
    /// fresh time budget per read, not one for the whole loop. A single
    /// read may deliver more than `need`; the surplus stays buffered for
    /// later `consume` calls.
    ///
    /// # Errors
    ///
    /// - [`SqlwireError::UnexpectedEof`] if the stream ends short of
    ///   `need` (EOF landing exactly on `need` is success).
    /// - [`SqlwireError::Io`] for any other transport error, verbatim.
    ///   The connection should be treated as unusable afterwards.
    pub fn fill(&mut self, need: usize) -> Result<()> {
        self.lend_oneshot = None;

        let carry = self.pending;
        let target = self.active_slot();
        let in_place = self.arena_slot == Some(target);

        // Destination arena for this fill: the target slot's storage,
        // which is either already the working arena or parked in `slots`.
        let mut dest = if in_place {
            mem::take(&mut self.arena)
        } else {
            mem::take(&mut self.slots[target])
        };
        let mut dest_slot = Some(target);

        // The destination must hold the requested bytes and any surplus
        // carried over from earlier over-delivering reads.
        let required = need.max(carry);
        if required > dest.len() {
            let size = required.div_ceil(self.config.base_arena_size) * self.config.base_arena_size;
            let cached = size <= self.config.max_cached_size;
            tracing::trace!("growing packet arena to {} bytes (cached: {})", size, cached);

            let mut grown = vec![0u8; size];
            if carry > 0 {
                let src = if in_place { &dest } else { &self.arena };
                grown[..carry].copy_from_slice(&src[self.cursor..self.cursor + carry]);
            }
            if !cached {
                // One-shot arena: the slot keeps its current storage.
                self.slots[target] = dest;
                dest_slot = None;
            }
            // For a cached grow the old allocation is released here.
            dest = grown;
        } else if carry > 0 {
            if in_place {
                dest.copy_within(self.cursor..self.cursor + carry, 0);
            } else {
                dest[..carry].copy_from_slice(&self.arena[self.cursor..self.cursor + carry]);
            }
        }

        // Swap the destination in; the previous arena goes back to the
        // slot it came from, or is dropped if it was a one-shot.
        let prev = mem::replace(&mut self.arena, dest);
        if !in_place {
            if let Some(home) = self.arena_slot {
                self.slots[home] = prev;
            }
        }
        self.arena_slot = dest_slot;
        self.cursor = 0;

        let mut valid = carry;
        while valid < need {
            if let Some(timeout) = self.config.read_timeout {
                self.transport
                    .set_read_deadline(Some(Instant::now() + timeout))?;
            }
            let n = self.transport.read(&mut self.arena[valid..])?;
            if n == 0 {
                // Clean EOF short of `need` means a truncated packet.
                return Err(SqlwireError::UnexpectedEof);
            }
            valid += n;
        }
        self.pending = valid;
        Ok(())
    }

    /// Return a zero-copy view of the next `need` buffered bytes,
    /// filling from the transport first if fewer are available.
    ///
    /// The view borrows the buffer: it is valid until the next call that
    /// takes `&mut self` (in particular the next `fill`). Callers that
    /// need the bytes longer must copy them out, or [`flip`](Self::flip)
    /// at the packet boundary so the next fill targets the other slot.
    ///
    /// # Errors
    ///
    /// Propagates [`fill`](Self::fill) errors unchanged.
    pub fn consume(&mut self, need: usize) -> Result<&[u8]> {
        if self.pending < need {
            self.fill(need)?;
        }
        let start = self.cursor;
        self.cursor += need;
        self.pending -= need;
        Ok(&self.arena[start..self.cursor])
    }

    /// Lend a mutable view of exactly `length` bytes for an outgoing
    /// packet.
    ///
    /// The cheap path reuses the working arena in place. A request beyond
    /// the current capacity but below the maximum packet size installs a
    /// fresh arena of exactly `length` as the slot's storage, kept for
    /// future packets. A request at or beyond the maximum packet size is
    /// served from a throwaway arena that is dropped at the next buffer
    /// operation, so one huge packet does not pin its allocation on the
    /// connection.
    ///
    /// # Errors
    ///
    /// [`SqlwireError::BusyBuffer`] while unread packet bytes remain.
    pub fn take_exact(&mut self, length: usize) -> Result<&mut [u8]> {
        if self.pending > 0 {
            return Err(SqlwireError::BusyBuffer);
        }
        self.reclaim_cached();

        if length <= self.arena.len() {
            return Ok(&mut self.arena[..length]);
        }

        if length < self.config.max_packet_size {
            tracing::trace!("installing {}-byte arena for outgoing packet", length);
            self.arena = vec![0u8; length];
            return Ok(&mut self.arena[..]);
        }

        tracing::trace!("lending one-shot {}-byte arena", length);
        let arena = self.lend_oneshot.insert(vec![0u8; length]);
        Ok(&mut arena[..])
    }

    /// Lend a view of the first `length` bytes of the working arena,
    /// never growing it.
    ///
    /// For small, fixed-shape packets whose size is known to fit.
    ///
    /// # Errors
    ///
    /// [`SqlwireError::BusyBuffer`] while unread packet bytes remain.
    ///
    /// # Panics
    ///
    /// Panics if `length` exceeds the current capacity; use
    /// [`take_exact`](Self::take_exact) when the fit is not guaranteed.
    pub fn take_small(&mut self, length: usize) -> Result<&mut [u8]> {
        if self.pending > 0 {
            return Err(SqlwireError::BusyBuffer);
        }
        self.reclaim_cached();
        Ok(&mut self.arena[..length])
    }

    /// Lend the entire working arena.
    ///
    /// For callers that fill as much as is available without a length up
    /// front.
    ///
    /// # Errors
    ///
    /// [`SqlwireError::BusyBuffer`] while unread packet bytes remain.
    pub fn take_whole(&mut self) -> Result<&mut [u8]> {
        if self.pending > 0 {
            return Err(SqlwireError::BusyBuffer);
        }
        self.reclaim_cached();
        Ok(&mut self.arena[..])
    }

    /// Hand an arena back to the buffer, adopting it when worthwhile.
    ///
    /// Callers that outgrew a lent view build the packet in their own
    /// allocation and return it here. It becomes the working arena iff
    /// its capacity beats the current one without exceeding the maximum
    /// packet size; otherwise it is dropped silently.
    ///
    /// # Errors
    ///
    /// [`SqlwireError::BusyBuffer`] while unread packet bytes remain.
    pub fn store(&mut self, mut arena: Vec<u8>) -> Result<()> {
        if self.pending > 0 {
            return Err(SqlwireError::BusyBuffer);
        }
        self.reclaim_cached();

        let cap = arena.capacity();
        if cap > self.arena.len() && cap <= self.config.max_packet_size {
            tracing::trace!("adopting {}-byte stored arena", cap);
            arena.resize(cap, 0);
            self.arena = arena;
        }
        Ok(())
    }

    /// Current capacity of the working arena in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Count of buffered bytes not yet consumed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Whether unread packet bytes remain (lend operations will fail).
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    /// Change the per-read deadline; `None` disables it.
    #[inline]
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.config.read_timeout = timeout;
    }

    /// Underlying transport.
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport (e.g. for writes).
    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the buffer, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    #[inline]
    fn active_slot(&self) -> usize {
        (self.flip_count & 1) as usize
    }

    /// Drop a one-shot arena left over from an oversized fill and put
    /// the cached slot storage back to work.
    ///
    /// Must only be called while no bytes are pending.
    fn reclaim_cached(&mut self) {
        self.lend_oneshot = None;
        if self.arena_slot.is_none() {
            let target = self.active_slot();
            self.arena = mem::take(&mut self.slots[target]);
            self.arena_slot = Some(target);
            self.cursor = 0;
        }
    }
}
