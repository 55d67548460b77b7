//! PCM post-processing: channel downmix and fallback rate conversion.

/// Average interleaved channels into one, summing in `i32`.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    let ch = usize::from(channels.max(1));
    if ch == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(ch)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / ch as i32) as i16
        })
        .collect()
}

/// Convert mono PCM from `from` Hz to `to` Hz.
///
/// Downsampling picks the nearest earlier sample; upsampling interpolates
/// linearly. Used only when the sink refuses the track's own rate.
pub fn resample(samples: &[i16], from: u32, to: u32) -> Vec<i16> {
    if from == to || from == 0 || to == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let out_len = (samples.len() as u64 * u64::from(to) / u64::from(from)) as usize;
    let last = samples.len() - 1;

    if to < from {
        return (0..out_len)
            .map(|i| {
                let src = (i as u64 * u64::from(from) / u64::from(to)) as usize;
                samples[src.min(last)]
            })
            .collect();
    }

    let step = f64::from(from) / f64::from(to);
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos as usize;
            if idx >= last {
                return samples[last];
            }
            let frac = pos - idx as f64;
            let a = f64::from(samples[idx]);
            let b = f64::from(samples[idx + 1]);
            (a + (b - a) * frac).round() as i16
        })
        .collect()
}
