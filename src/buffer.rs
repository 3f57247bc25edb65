//! Bounded byte buffer shared between the ingest and playback workers
//!
//! A fixed-capacity circular byte buffer, the single hand-off point between
//! ingestion and playback. It performs no locking of its own: every access
//! must happen inside one externally-owned critical section shared by both
//! workers (see `SessionShared::buffer`). Keeping the structure lock-free
//! pushes all concurrency discipline into that single mutex and leaves no
//! two-lock ordering hazard.

/// Fixed-capacity circular byte buffer.
///
/// The producer writes only into free space and the consumer reads only
/// available bytes, so `len` never exceeds `capacity`. Capacity is set once
/// from the negotiated bitrate and is immutable for the session.
#[derive(Debug)]
pub struct ByteRingBuffer {
    data: Box<[u8]>,
    read_pos: usize,
    len: usize,
}

impl ByteRingBuffer {
    /// Create a buffer with the given capacity in bytes.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            read_pos: 0,
            len: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if no free space remains.
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Free space in bytes.
    pub fn free(&self) -> usize {
        self.data.len() - self.len
    }

    /// Append up to the available free space from `src`.
    ///
    /// Returns the number of bytes actually written, which may be less than
    /// `src.len()`; the caller retries the remainder once space frees up.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.free());
        if n == 0 {
            return 0;
        }
        let cap = self.data.len();
        let write_pos = (self.read_pos + self.len) % cap;
        let first = n.min(cap - write_pos);
        self.data[write_pos..write_pos + first].copy_from_slice(&src[..first]);
        if first < n {
            self.data[..n - first].copy_from_slice(&src[first..n]);
        }
        self.len += n;
        n
    }

    /// Remove up to `out.len()` available bytes into `out`.
    ///
    /// Returns the number of bytes read (0 if the buffer is empty). Bytes are
    /// delivered strictly in the order they were written.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        if n == 0 {
            return 0;
        }
        let cap = self.data.len();
        let first = n.min(cap - self.read_pos);
        out[..first].copy_from_slice(&self.data[self.read_pos..self.read_pos + first]);
        if first < n {
            out[first..n].copy_from_slice(&self.data[..n - first]);
        }
        self.read_pos = (self.read_pos + n) % cap;
        self.len -= n;
        n
    }
}
