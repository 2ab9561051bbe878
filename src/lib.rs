pub mod hotp;
pub mod secret;
pub mod totp;

use std::{fmt::Display, str::FromStr, time::SystemTimeError};

/// Number of digits produced when none is configured
pub const DEFAULT_DIGITS: u32 = 6;
/// Smallest accepted digit count
pub const MIN_DIGITS: u32 = 1;
/// Largest accepted digit count. The truncated value never exceeds 31 bits,
/// so more than 10 digits would only add zero padding.
pub const MAX_DIGITS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Secret decode error: {0}")]
    SecretDecode(#[source] data_encoding::DecodeError),
    #[error("The secret is empty after removing separators")]
    EmptySecret,
    #[error("The key must contain at least one byte")]
    EmptyKey,
    #[error("The key was rejected by the HMAC implementation")]
    InvalidKey,
    #[error("Invalid digest of {} bytes", .0.len())]
    InvalidDigest(Vec<u8>),
    #[error(
        "Invalid number of digits, found {}. Expected a value between {} and {}",
        .0,
        MIN_DIGITS,
        MAX_DIGITS
    )]
    InvalidDigits(u32),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("The time step must be at least one second")]
    InvalidPeriod,
    #[error("The counter cannot be advanced past {0}")]
    CounterOverflow(u64),
    #[error("The time {time} is before the start time {start_time}")]
    TimeBeforeStart { time: u64, start_time: u64 },
    #[error("Could not read the system clock: {0}")]
    Clock(#[source] SystemTimeError),
}

/// Broad class of an [`OtpError`], so callers can react without
/// inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpErrorKind {
    /// The secret text is not valid Base32
    Decode,
    /// The key, digit count, algorithm or counter cannot produce a token
    Generation,
    /// The time input is unusable
    Clock,
}

impl OtpError {
    pub fn kind(&self) -> OtpErrorKind {
        match self {
            Self::SecretDecode(_) | Self::EmptySecret => OtpErrorKind::Decode,
            Self::EmptyKey
            | Self::InvalidKey
            | Self::InvalidDigest(_)
            | Self::InvalidDigits(_)
            | Self::InvalidHashingAlgorithm(_)
            | Self::InvalidPeriod
            | Self::CounterOverflow(_) => OtpErrorKind::Generation,
            Self::TimeBeforeStart { .. } | Self::Clock(_) => OtpErrorKind::Clock,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl OtpHashAlgorithm {
    /// Length in bytes of the HMAC output for this algorithm
    pub fn digest_len(&self) -> usize {
        match self {
            Self::SHA1 => 20,
            Self::SHA256 => 32,
            Self::SHA512 => 64,
        }
    }
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "");

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

/// A generated token.
///
/// The `Display` implementation renders exactly [`OtpCode::digits`] ASCII
/// digits, keeping leading zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

/// Behaviour shared by the counter based and the time based generators.
pub trait Otp {
    /// The Base32 secret as entered by the user
    fn secret(&self) -> &str;

    fn algorithm(&self) -> OtpHashAlgorithm;

    fn digits(&self) -> u32;

    /// Decodes the configured secret into key bytes, see [`secret::decode`]
    fn decode_secret(&self) -> Result<Vec<u8>, OtpError> {
        secret::decode(self.secret())
    }

    /// Generates the token for an explicit moving factor
    fn generate_for_counter(&self, counter: u64) -> Result<OtpCode, OtpError> {
        let key = self.decode_secret()?;
        hotp::generate(&key, counter, self.algorithm(), self.digits())
    }
}
