//! Frame-at-a-time MPEG audio decoding.

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{
    CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3, CodecParameters, Decoder, DecoderOptions,
};
use symphonia::core::formats::Packet;

use crate::error::{Error, Result};

use super::mpeg::FrameHeader;

/// Interleaved PCM from one frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Decodes one complete frame (header included) at a time. Implementations
/// may keep state between frames, such as the layer III bit reservoir.
pub trait FrameDecoder: Send {
    fn decode(&mut self, frame: &[u8], header: &FrameHeader) -> Result<DecodedFrame>;
    /// Forget inter-frame state after a discontinuity.
    fn reset(&mut self);
}

/// `symphonia`'s MPEG audio decoder fed with raw frames.
pub struct SymphoniaFrameDecoder {
    decoder: Option<Box<dyn Decoder>>,
    layer: u8,
    samples: Option<SampleBuffer<i16>>,
    ts: u64,
}

impl SymphoniaFrameDecoder {
    pub fn new() -> Self {
        Self {
            decoder: None,
            layer: 0,
            samples: None,
            ts: 0,
        }
    }

    fn ensure_decoder(&mut self, header: &FrameHeader) -> Result<()> {
        if self.layer != header.layer {
            self.decoder = None;
        }
        if self.decoder.is_none() {
            let codec = match header.layer {
                1 => CODEC_TYPE_MP1,
                2 => CODEC_TYPE_MP2,
                _ => CODEC_TYPE_MP3,
            };
            let mut params = CodecParameters::new();
            params.for_codec(codec).with_sample_rate(header.sample_rate);
            let decoder = symphonia::default::get_codecs()
                .make(&params, &DecoderOptions::default())
                .map_err(|e| Error::Decode(e.to_string()))?;
            self.decoder = Some(decoder);
            self.layer = header.layer;
        }
        Ok(())
    }
}

impl Default for SymphoniaFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn decode(&mut self, frame: &[u8], header: &FrameHeader) -> Result<DecodedFrame> {
        self.ensure_decoder(header)?;
        let ts = self.ts;
        let dur = u64::from(header.samples_per_frame());
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(Error::Decode("decoder unavailable".to_string()));
        };
        let packet = Packet::new_from_slice(0, ts, dur, frame);
        let decoded = decoder
            .decode(&packet)
            .map_err(|e| Error::Decode(e.to_string()))?;

        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        if self.samples.as_ref().is_none_or(|b| b.capacity() < needed) {
            self.samples = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = self.samples.as_mut() else {
            return Err(Error::Decode("sample buffer unavailable".to_string()));
        };
        buf.copy_interleaved_ref(decoded);

        self.ts += dur;
        Ok(DecodedFrame {
            samples: buf.samples().to_vec(),
            channels: spec.channels.count() as u16,
            sample_rate: spec.rate,
        })
    }

    fn reset(&mut self) {
        if let Some(d) = self.decoder.as_mut() {
            d.reset();
        }
        self.ts = 0;
    }
}
