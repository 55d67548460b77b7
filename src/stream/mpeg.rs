//! MPEG audio frame headers, sync search and ID3v2 tag detection.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    /// 1, 2 or 3.
    pub layer: u8,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channels: u16,
}

const BITRATE_V1_L1: [u32; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BITRATE_V1_L2: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BITRATE_V1_L3: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BITRATE_V2_L1: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BITRATE_V2_L23: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

const SAMPLE_RATE_V1: [u32; 3] = [44_100, 48_000, 32_000];

/// Smallest slice [`FrameHeader::parse`] looks at.
pub const HEADER_LEN: usize = 4;

impl FrameHeader {
    /// Parse and validate a 4-byte header. Free-format and reserved values
    /// are rejected.
    pub fn parse(b: &[u8]) -> Option<Self> {
        if b.len() < HEADER_LEN || b[0] != 0xFF || b[1] & 0xE0 != 0xE0 {
            return None;
        }
        let version = match (b[1] >> 3) & 0x03 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (b[1] >> 1) & 0x03 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };
        let bitrate_index = usize::from(b[2] >> 4);
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let rate_index = usize::from((b[2] >> 2) & 0x03);
        if rate_index == 3 {
            return None;
        }

        let table = match (version, layer) {
            (MpegVersion::V1, 1) => &BITRATE_V1_L1,
            (MpegVersion::V1, 2) => &BITRATE_V1_L2,
            (MpegVersion::V1, _) => &BITRATE_V1_L3,
            (_, 1) => &BITRATE_V2_L1,
            _ => &BITRATE_V2_L23,
        };
        let base_rate = SAMPLE_RATE_V1[rate_index];
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V25 => base_rate / 4,
        };

        Some(Self {
            version,
            layer,
            bitrate_kbps: table[bitrate_index],
            sample_rate,
            padding: (b[2] >> 1) & 0x01 == 1,
            channels: if b[3] >> 6 == 0x03 { 1 } else { 2 },
        })
    }

    /// Total frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let br = self.bitrate_kbps as usize * 1000;
        let sr = self.sample_rate as usize;
        let pad = usize::from(self.padding);
        match self.layer {
            1 => (12 * br / sr + pad) * 4,
            3 if self.version != MpegVersion::V1 => 72 * br / sr + pad,
            _ => 144 * br / sr + pad,
        }
    }

    /// PCM samples per channel carried by one frame.
    pub fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (2, _) | (3, MpegVersion::V1) => 1152,
            _ => 576,
        }
    }

    fn same_stream(&self, other: &Self) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }
}

/// Find the first offset in `buf` holding a plausible frame header.
///
/// A candidate whose following header is also inside `buf` must agree with
/// it on version, layer and sample rate. When no candidate is confirmed that
/// way, the first header that parses on its own is returned; a false positive
/// is then rejected by the decoder.
pub fn find_sync(buf: &[u8]) -> Option<usize> {
    if buf.len() < HEADER_LEN {
        return None;
    }
    let mut unconfirmed = None;
    for i in 0..=buf.len() - HEADER_LEN {
        let Some(h) = FrameHeader::parse(&buf[i..]) else {
            continue;
        };
        let next = i + h.frame_len();
        let confirmed = match buf.get(next..next + HEADER_LEN) {
            Some(nb) => FrameHeader::parse(nb).is_some_and(|n| n.same_stream(&h)),
            None => true,
        };
        if confirmed {
            return Some(i);
        }
        unconfirmed.get_or_insert(i);
    }
    unconfirmed
}

/// Length of an ID3v2 tag at the start of `buf`, header and footer included.
pub fn id3v2_tag_len(buf: &[u8]) -> Option<usize> {
    if buf.len() < 10 || &buf[..3] != b"ID3" {
        return None;
    }
    let size_bytes = &buf[6..10];
    if size_bytes.iter().any(|b| b & 0x80 != 0) {
        return None;
    }
    let size = size_bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | usize::from(b));
    let footer = if buf[5] & 0x10 != 0 { 10 } else { 0 };
    Some(10 + size + footer)
}
