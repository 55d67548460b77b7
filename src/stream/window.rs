//! The decoder's working window over the byte stream.

/// Bytes pulled from the buffer but not yet decoded, tagged with the file
/// position they end at.
#[derive(Debug)]
pub struct FrameWindow {
    data: Vec<u8>,
    end: u64,
}

impl FrameWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            end: 0,
        }
    }

    /// Append bytes that start at file position `offset`.
    pub fn append(&mut self, bytes: &[u8], offset: u64) {
        self.data.extend_from_slice(bytes);
        self.end = offset + bytes.len() as u64;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop `n` bytes from the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.data.len());
        self.data.drain(..n);
    }

    /// Keep only the last `n` bytes.
    pub fn keep_tail(&mut self, n: usize) {
        let len = self.data.len();
        if len > n {
            self.consume(len - n);
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// File position of the first undecoded byte.
    pub fn position(&self) -> u64 {
        self.end.saturating_sub(self.data.len() as u64)
    }
}
