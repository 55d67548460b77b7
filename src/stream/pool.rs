//! Fixed-capacity chunk buffers recycled between the reader and decoder.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

/// One read from the card.
#[derive(Debug)]
pub struct AudioChunk {
    data: Vec<u8>,
    len: usize,
    offset: u64,
    pooled: bool,
}

impl AudioChunk {
    /// The whole backing buffer, for the reader to fill.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Record that `len` bytes read from file position `offset` are valid.
    pub fn set_filled(&mut self, len: usize, offset: u64) {
        self.len = len.min(self.data.len());
        self.offset = offset;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// File position of the first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// File position just past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// Chunk slots allocated once per session.
///
/// When every slot is out, [`take`](Self::take) allocates a one-off chunk
/// instead of failing; those are dropped rather than returned.
#[derive(Debug)]
pub struct ChunkPool {
    free: Mutex<Vec<Vec<u8>>>,
    chunk_size: usize,
    ad_hoc: AtomicU64,
}

impl ChunkPool {
    pub fn new(slots: usize, chunk_size: usize) -> Self {
        let free = (0..slots).map(|_| vec![0u8; chunk_size]).collect();
        Self {
            free: Mutex::new(free),
            chunk_size,
            ad_hoc: AtomicU64::new(0),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn take(&self) -> AudioChunk {
        let slot = self.free.lock().unwrap_or_else(|e| e.into_inner()).pop();
        match slot {
            Some(data) => AudioChunk {
                data,
                len: 0,
                offset: 0,
                pooled: true,
            },
            None => {
                let n = self.ad_hoc.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(ad_hoc = n, "chunk pool exhausted, allocating outside the pool");
                AudioChunk {
                    data: vec![0u8; self.chunk_size],
                    len: 0,
                    offset: 0,
                    pooled: false,
                }
            }
        }
    }

    pub fn give_back(&self, chunk: AudioChunk) {
        if chunk.pooled {
            self.free
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(chunk.data);
        }
    }

    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Chunks allocated outside the pool so far.
    pub fn ad_hoc_allocations(&self) -> u64 {
        self.ad_hoc.load(Ordering::Relaxed)
    }
}
