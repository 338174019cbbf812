use crate::error::{ModemError, Result};

/// Expand bytes into bits, most-significant bit first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1 == 1);
        }
    }
    bits
}

/// Pack bits back into bytes, the exact inverse of [`bytes_to_bits`].
/// The input length must be a multiple of 8.
pub fn bits_to_bytes(bits: &[bool]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(ModemError::MalformedBits);
    }
    let mut bytes = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - i);
            }
        }
        bytes.push(byte);
    }
    Ok(bytes)
}

/// Repeat each bit `factor` times for noise resistance.
/// The receiver must collapse the stream with the same factor.
pub fn repeat_bits(bits: &[bool], factor: usize) -> Vec<bool> {
    if factor <= 1 {
        return bits.to_vec();
    }
    let mut out = Vec::with_capacity(bits.len() * factor);
    for &bit in bits {
        for _ in 0..factor {
            out.push(bit);
        }
    }
    out
}

/// Collapse each group of `factor` bits to its majority symbol.
/// Ties resolve to 0; trailing bits short of a full group are dropped.
pub fn majority_vote(bits: &[bool], factor: usize) -> Vec<bool> {
    if factor <= 1 {
        return bits.to_vec();
    }
    bits.chunks_exact(factor)
        .map(|group| {
            let ones = group.iter().filter(|&&b| b).count();
            ones * 2 > group.len()
        })
        .collect()
}
