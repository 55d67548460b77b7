/// Saved byte offsets are kept on this boundary.
pub const OFFSET_GRANULARITY: u64 = 1024;

pub fn round_down_offset(offset: u64) -> u64 {
    offset - offset % OFFSET_GRANULARITY
}

/// A saved playback position as read back from the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResumePoint {
    pub offset: u64,
    pub elapsed_ms: u64,
    /// Known or estimated track length.
    pub duration_ms: Option<u64>,
}

/// Where a session should start.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StartAt {
    pub offset: u64,
    pub elapsed_ms: u64,
}

impl ResumePoint {
    /// Choose a start position inside a file of `file_size` bytes.
    ///
    /// A saved offset inside the file wins. Without a usable one (missing, or
    /// past the end of a replaced file), the elapsed time is scaled against
    /// the duration to estimate an offset. Otherwise playback
    /// starts at byte 0. The result never exceeds the saved offset.
    pub fn plan(&self, file_size: u64) -> StartAt {
        if self.offset > 0 && self.offset < file_size {
            return StartAt {
                offset: round_down_offset(self.offset),
                elapsed_ms: self.elapsed_ms,
            };
        }
        if let Some(duration) = self.duration_ms.filter(|&d| d > 0) {
            if self.elapsed_ms > 0 && self.elapsed_ms < duration {
                let estimate =
                    u128::from(self.elapsed_ms) * u128::from(file_size) / u128::from(duration);
                return StartAt {
                    offset: round_down_offset(estimate as u64),
                    elapsed_ms: self.elapsed_ms,
                };
            }
        }
        StartAt::default()
    }
}
