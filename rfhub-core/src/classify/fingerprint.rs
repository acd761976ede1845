//! Payload parsing and fingerprint extraction
//!
//! A fingerprint reduces a pulse-train payload to a comparable shape key:
//! repetitions, gap, timebase, pulse-pair count and the min/max pulse
//! length. Malformed or foreign payloads simply produce no fingerprint;
//! they are expected traffic, not errors.

use crate::constants::transport;
use crate::vendor::PulseTrain;

/// Value-typed lookup key summarizing a payload's pulse shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalFingerprint {
    pub repetitions: u32,
    /// Inter-frame gap in microseconds. The gateway always injects the
    /// same constant gap on transmit, so both the reference table and
    /// runtime classification use [`transport::FIXED_GAP_US`] here; a
    /// payload's own advertised gap is only checked for well-formedness.
    pub gap: u32,
    pub timebase: u32,
    /// Number of complete pulse pairs
    pub pulse_count: u32,
    pub min_pulse: u32,
    pub max_pulse: u32,
}

impl SignalFingerprint {
    /// Extract a fingerprint from a raw payload string.
    ///
    /// Strips an optional transport prefix up to the first `:`, splits on
    /// commas and reads the header fields at positions 2 through 5. Returns
    /// `None` for anything structurally off: too few tokens, non-integer
    /// header fields, unparsable pulse values or fewer than two pulses.
    pub fn from_payload(payload: &str) -> Option<SignalFingerprint> {
        let body = match payload.split_once(':') {
            Some((_, rest)) => rest,
            None => payload,
        };
        let tokens: Vec<&str> = body
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.len() < transport::MIN_HEADER_TOKENS {
            return None;
        }

        let repetitions: u32 = tokens[transport::TOKEN_REPETITIONS].parse().ok()?;
        // Parsed for structural validation only, never used in the key
        let _advertised_gap: u32 = tokens[transport::TOKEN_GAP].parse().ok()?;
        let timebase: u32 = tokens[transport::TOKEN_TIMEBASE].parse().ok()?;
        let pair_count: usize = tokens[transport::TOKEN_PAIR_COUNT].parse().ok()?;

        // The advertised pair count is untrusted input; never let it drive
        // an allocation larger than the tokens actually present
        let wanted = pair_count.saturating_mul(2);
        let mut pulses = Vec::with_capacity(wanted.min(tokens.len()));
        for token in tokens
            .iter()
            .skip(transport::MIN_HEADER_TOKENS)
            .take(wanted)
        {
            pulses.push(token.parse::<u32>().ok()?);
        }
        if pulses.len() < 2 {
            return None;
        }

        let min_pulse = *pulses.iter().min()?;
        let max_pulse = *pulses.iter().max()?;

        Some(SignalFingerprint {
            repetitions,
            gap: transport::FIXED_GAP_US,
            timebase,
            pulse_count: (pulses.len() / 2) as u32,
            min_pulse,
            max_pulse,
        })
    }

    /// Fingerprint of a generated pulse train, as used when building the
    /// reference table. Returns `None` for an empty train.
    pub fn from_pulse_train(train: &PulseTrain) -> Option<SignalFingerprint> {
        if train.pulses.is_empty() {
            return None;
        }

        let mut min_pulse = u32::MAX;
        let mut max_pulse = 0u32;
        for &(high, low) in &train.pulses {
            min_pulse = min_pulse.min(high as u32).min(low as u32);
            max_pulse = max_pulse.max(high as u32).max(low as u32);
        }

        Some(SignalFingerprint {
            repetitions: train.repetitions as u32,
            gap: transport::FIXED_GAP_US,
            timebase: train.timebase as u32,
            pulse_count: train.pulses.len() as u32,
            min_pulse,
            max_pulse,
        })
    }
}
