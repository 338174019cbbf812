use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("bit stream length is not a multiple of 8")]
    MalformedBits,

    #[error("checksum mismatch in frame")]
    BadChecksum,

    #[error("end flag missing or corrupt")]
    BadEndFlag,

    #[error("input ended before the declared frame length was satisfied")]
    TruncatedFrame,

    #[error("payload exceeds the 255-byte frame limit")]
    PayloadTooLarge,

    #[error("decryption failed: wrong password or corrupted ciphertext")]
    AuthFailure,

    #[error("auth token does not match the expected secret")]
    AccessDenied,

    #[error("FFT error: {0}")]
    Fft(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
