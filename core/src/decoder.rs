use crate::bits::majority_vote;
use crate::crypto;
use crate::error::Result;
use crate::framing::{scan_frames, ExpectedMode, Frame};
use crate::fsk::{normalize, FskDemodulator};

/// Decode-time parameters.
///
/// The wire cannot distinguish AUTH from DATA frames, so the expected mode
/// is negotiated out of band and supplied here rather than auto-detected.
/// The password unlocks ENCRYPTED packets; the expected secret verifies
/// AUTH tokens.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub expected_mode: ExpectedMode,
    pub password: Option<String>,
    pub expected_secret: Option<String>,
}

/// One decoded packet, or the verdict that none was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// Valid DATA frame.
    DataOk { unit_id: u8, payload: Vec<u8> },
    /// Valid AUTH frame. `granted` reports the constant-time token check
    /// against the expected secret; it is false when no secret was supplied.
    AuthOk { unit_id: u8, granted: bool },
    /// ENCRYPTED frame decrypted and verified.
    EncryptedOk { unit_id: u8, payload: Vec<u8> },
    /// ENCRYPTED frame received but no password was supplied.
    EncryptedLocked { unit_id: u8 },
    /// ENCRYPTED frame whose password or GCM tag failed verification.
    EncryptedFailed { unit_id: u8 },
    /// No valid frame in the input.
    Invalid,
}

/// Receive-side packet decoder.
///
/// Holds the FFT plan for the demodulator, so one decoder instance amortizes
/// plan setup across calls. Each decoded packet is independent; no session
/// state is retained between packets.
pub struct Decoder {
    fsk: FskDemodulator,
    repeat: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            fsk: FskDemodulator::new(),
            repeat: 1,
        }
    }

    /// Decoder for a sender that repeats each bit `factor` times.
    pub fn with_repeat(factor: usize) -> Self {
        Self {
            fsk: FskDemodulator::new(),
            repeat: factor.max(1),
        }
    }

    /// Decode every packet in the buffer, in the order their start flags
    /// appear in the bit stream.
    pub fn decode_all(&self, samples: &[i16], opts: &DecodeOptions) -> Result<Vec<DecodeResult>> {
        let bits = self.fsk.demodulate(&normalize(samples))?;
        let frames = if self.repeat > 1 {
            // The silence guards shift the demodulator's window grid by a
            // fraction of a bit, so the repeat groups may start at any of
            // `repeat` offsets; take the first alignment that yields frames.
            (0..self.repeat)
                .map(|offset| {
                    let stream = bits.get(offset..).unwrap_or(&[]);
                    scan_frames(&majority_vote(stream, self.repeat), opts.expected_mode)
                })
                .find(|frames| !frames.is_empty())
                .unwrap_or_default()
        } else {
            scan_frames(&bits, opts.expected_mode)
        };
        Ok(frames
            .into_iter()
            .map(|frame| resolve(frame, opts))
            .collect())
    }

    /// Decode the first packet in the buffer, or `Invalid` when none parses.
    pub fn decode(&self, samples: &[i16], opts: &DecodeOptions) -> Result<DecodeResult> {
        Ok(self
            .decode_all(samples, opts)?
            .into_iter()
            .next()
            .unwrap_or(DecodeResult::Invalid))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a validated frame to its decode verdict, applying the crypto layer.
fn resolve(frame: Frame, opts: &DecodeOptions) -> DecodeResult {
    match frame {
        Frame::Data { unit_id, payload } => DecodeResult::DataOk { unit_id, payload },
        Frame::Auth { unit_id, token } => {
            let granted = opts
                .expected_secret
                .as_deref()
                .map(|secret| crypto::auth_verify(&token, secret))
                .unwrap_or(false);
            DecodeResult::AuthOk { unit_id, granted }
        }
        Frame::Encrypted { unit_id, blob } => match opts.password.as_deref() {
            None => DecodeResult::EncryptedLocked { unit_id },
            Some(password) => match crypto::decrypt(password, &blob) {
                Ok(payload) => DecodeResult::EncryptedOk { unit_id, payload },
                Err(_) => DecodeResult::EncryptedFailed { unit_id },
            },
        },
    }
}
