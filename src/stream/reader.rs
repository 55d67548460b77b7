//! Reader thread: card → pool chunks → shared buffer.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;

use super::buffer::{Push, SharedBuffer};
use super::pool::ChunkPool;

pub(super) struct Reader {
    pub file: File,
    pub buffer: Arc<SharedBuffer>,
    pub pool: Arc<ChunkPool>,
    /// Saved position to resume near; 0 plays from the start.
    pub start_offset: u64,
    pub resume_backoff: u64,
    /// Rewind once at the first end of file.
    pub rewind_on_eof: bool,
}

impl Reader {
    pub fn run(mut self) {
        if let Err(e) = self.pump() {
            warn!("read failed, ending stream: {e}");
        }
        self.buffer.reader_done();
    }

    fn pump(&mut self) -> Result<()> {
        let resuming = self.start_offset > 0;
        let mut pos = self.start_offset.saturating_sub(self.resume_backoff);
        if pos > 0 {
            self.file.seek(SeekFrom::Start(pos))?;
            debug!(offset = pos, "reader positioned for resume");
        }
        let mut rewound = false;

        while self.buffer.wait_while_paused() {
            if let Some(target) = self.buffer.take_seek() {
                pos = self.file.seek(SeekFrom::Start(target))?;
                debug!(offset = pos, "reader repositioned");
            }

            let mut chunk = self.pool.take();
            let n = match self.file.read(chunk.spare_mut()) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    self.pool.give_back(chunk);
                    continue;
                }
                Err(e) => {
                    self.pool.give_back(chunk);
                    return Err(e.into());
                }
            };

            if n == 0 {
                self.pool.give_back(chunk);
                if self.rewind_on_eof && !resuming && !rewound {
                    rewound = true;
                    pos = self.file.seek(SeekFrom::Start(0))?;
                    debug!("end of file, rewinding once");
                    continue;
                }
                // Park until the decoder asks for a reposition or the session ends.
                match self.buffer.reader_idle() {
                    Some(target) => {
                        pos = self.file.seek(SeekFrom::Start(target))?;
                        debug!(offset = pos, "reader restarted");
                        continue;
                    }
                    None => return Ok(()),
                }
            }

            chunk.set_filled(n, pos);
            pos += n as u64;
            if let Push::Rejected(chunk) = self.buffer.push(chunk) {
                self.pool.give_back(chunk);
            }
        }
        Ok(())
    }
}
