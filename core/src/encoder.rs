use crate::bits::repeat_bits;
use crate::crypto;
use crate::error::Result;
use crate::framing::{build_auth_frame, build_data_frame, build_encrypted_frame};
use crate::fsk::FskModulator;
use crate::GUARD_SAMPLES;

/// Send-side packet builder.
///
/// Stateless between packets: every build gets a fresh oscillator so the
/// phase always starts from zero. An optional bit repetition factor trades
/// airtime for noise resistance; the receiver must use the same factor.
pub struct Encoder {
    repeat: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self { repeat: 1 }
    }

    /// Encoder that repeats each transmitted bit `factor` times.
    pub fn with_repeat(factor: usize) -> Self {
        Self {
            repeat: factor.max(1),
        }
    }

    /// Build a DATA packet carrying up to 255 payload bytes.
    pub fn build_data(&self, payload: &[u8], unit_id: u8) -> Result<Vec<i16>> {
        let bits = build_data_frame(unit_id, payload)?;
        Ok(self.transmit(&bits))
    }

    /// Build an AUTH packet carrying the 4-byte SHA-256 token of `secret`.
    pub fn build_auth(&self, secret: &str, unit_id: u8) -> Result<Vec<i16>> {
        let token = crypto::auth_token(secret);
        let bits = build_auth_frame(unit_id, &token);
        Ok(self.transmit(&bits))
    }

    /// Build an ENCRYPTED packet: the payload is sealed with AES-256-GCM
    /// under a key derived from `password`, and the resulting cipher-blob
    /// (salt ‖ nonce ‖ ciphertext ‖ tag) becomes the frame body.
    pub fn build_encrypted(&self, payload: &[u8], password: &str, unit_id: u8) -> Result<Vec<i16>> {
        let blob = crypto::encrypt(password, payload)?;
        let bits = build_encrypted_frame(unit_id, &blob)?;
        Ok(self.transmit(&bits))
    }

    /// Modulate frame bits and wrap the tone burst in the silence guards.
    fn transmit(&self, bits: &[bool]) -> Vec<i16> {
        let bits = repeat_bits(bits, self.repeat);
        let mut modulator = FskModulator::new();
        let tone = modulator.modulate(&bits);

        let mut samples = Vec::with_capacity(tone.len() + 2 * GUARD_SAMPLES);
        samples.resize(GUARD_SAMPLES, 0);
        samples.extend_from_slice(&tone);
        samples.resize(samples.len() + GUARD_SAMPLES, 0);
        samples
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
