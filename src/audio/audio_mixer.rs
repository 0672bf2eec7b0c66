//! Sample-level mixing used by the mix destination.
//!
//! Pure functions, no state.

pub struct AudioMixer;

impl AudioMixer {
    /// Sum equal-rate sources into one mono block.
    ///
    /// Shorter inputs are zero-padded. The sum is averaged over the non-empty
    /// sources and scaled back into [-1.0, 1.0] if it still overshoots.
    pub fn mix(sources: &[Vec<f32>]) -> Vec<f32> {
        let non_empty: Vec<&Vec<f32>> = sources.iter().filter(|s| !s.is_empty()).collect();

        match non_empty.len() {
            0 => return Vec::new(),
            1 => return non_empty[0].clone(),
            _ => {}
        }

        let len = non_empty.iter().map(|s| s.len()).max().unwrap_or(0);
        let count = non_empty.len() as f32;
        let mut mixed = vec![0.0f32; len];

        for source in &non_empty {
            for (out, &sample) in mixed.iter_mut().zip(source.iter()) {
                *out += sample;
            }
        }

        for sample in &mut mixed {
            *sample /= count;
        }

        let peak = mixed.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > 1.0 {
            for sample in &mut mixed {
                *sample /= peak;
            }
        }

        mixed
    }

    /// Linear-interpolation resampler; adequate for speech.
    pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
            return samples.to_vec();
        }

        let step = from_rate as f64 / to_rate as f64;
        let out_len = (samples.len() as f64 / step).ceil() as usize;

        (0..out_len)
            .map(|i| {
                let pos = i as f64 * step;
                let idx = pos as usize;
                let frac = pos - idx as f64;
                match (samples.get(idx), samples.get(idx + 1)) {
                    (Some(&a), Some(&b)) => (a as f64 * (1.0 - frac) + b as f64 * frac) as f32,
                    (Some(&a), None) => a,
                    _ => 0.0,
                }
            })
            .collect()
    }

    /// Convert float samples to clamped 16-bit PCM.
    pub fn to_i16(samples: &[f32]) -> impl Iterator<Item = i16> + '_ {
        samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
    }
}
