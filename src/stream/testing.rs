//! Synthetic MPEG streams and a decoder that trusts them.

use crate::error::{Error, Result};

use super::decoder::{DecodedFrame, FrameDecoder};
use super::mpeg::FrameHeader;

/// MPEG-1 layer III, 128 kbit/s, 44.1 kHz, joint stereo: 417-byte frames.
pub(crate) const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
pub(crate) const FRAME_LEN: usize = 417;

/// Payload byte the fake decoder refuses.
pub(crate) const BAD_FRAME: u8 = 0xBA;

pub(crate) fn frame(marker: u8) -> Vec<u8> {
    let mut f = vec![0u8; FRAME_LEN];
    f[..4].copy_from_slice(&HEADER);
    f[4] = marker;
    f
}

pub(crate) fn frames(n: usize) -> Vec<u8> {
    (0..n).flat_map(|_| frame(0)).collect()
}

/// Produces a constant block of samples for every well-formed frame.
#[derive(Debug, Default)]
pub(crate) struct FakeDecoder {
    pub resets: usize,
}

impl FrameDecoder for FakeDecoder {
    fn decode(&mut self, frame: &[u8], header: &FrameHeader) -> Result<DecodedFrame> {
        if frame.len() != header.frame_len() || frame.get(4) == Some(&BAD_FRAME) {
            return Err(Error::Decode("bad frame".to_string()));
        }
        let n = header.samples_per_frame() as usize * usize::from(header.channels);
        Ok(DecodedFrame {
            samples: vec![1000; n],
            channels: header.channels,
            sample_rate: header.sample_rate,
        })
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}
