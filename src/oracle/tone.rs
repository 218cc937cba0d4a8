use std::f32::consts::TAU;
use std::sync::{Arc, OnceLock};

use crate::foundation::core::{SAMPLE_RATE, secs_to_samples};
use crate::foundation::error::OracleError;
use crate::oracle::{MusicOracle, Waveform};

/// Deterministic [`MusicOracle`] that renders a three-note chord per prompt.
///
/// The chord root and quality are derived from the prompt text, so two calls with the same
/// arguments always produce identical samples. Temperature scales the vibrato depth.
#[derive(Clone, Debug)]
pub struct ToneOracle {
    sample_rate: u32,
}

impl ToneOracle {
    /// Oracle producing buffers at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for ToneOracle {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

/// Process-wide tone oracle, created on first use.
pub fn shared_tone_oracle() -> Arc<ToneOracle> {
    static SHARED: OnceLock<Arc<ToneOracle>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(ToneOracle::default())).clone()
}

fn chord_for(prompt: &str) -> [f32; 3] {
    let hash = prompt
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    // A2..A4 in semitone steps
    let semis = (hash % 24) as f32;
    let root = 110.0 * 2f32.powf(semis / 12.0);
    let minor = prompt.contains("melanchol")
        || prompt.contains("suspense")
        || prompt.contains("dissonant");
    let third = if minor { 3.0 } else { 4.0 };
    [
        root,
        root * 2f32.powf(third / 12.0),
        root * 2f32.powf(7.0 / 12.0),
    ]
}

impl MusicOracle for ToneOracle {
    fn synthesize(
        &self,
        prompt: &str,
        duration: f64,
        temperature: f32,
    ) -> Result<Waveform, OracleError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(OracleError::permanent(format!(
                "duration must be > 0 (got {duration})"
            )));
        }
        let len = secs_to_samples(duration, self.sample_rate);
        let chord = chord_for(prompt);
        let rate = self.sample_rate as f32;
        let vibrato = 0.002 * temperature.clamp(0.0, 2.0);

        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / rate;
                let wobble = 1.0 + vibrato * (TAU * 5.0 * t).sin();
                chord
                    .iter()
                    .map(|f| (TAU * f * wobble * t).sin())
                    .sum::<f32>()
                    * 0.25
            })
            .collect();

        Ok(Waveform {
            sample_rate: self.sample_rate,
            samples,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/oracle/tone.rs"]
mod tests;
