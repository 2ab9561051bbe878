use hmac::{digest::KeyInit, Hmac, Mac};
use log::{debug, trace};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{Otp, OtpCode, OtpError, OtpHashAlgorithm, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};

/// Encodes the moving factor as the 8-byte big-endian message fed to the HMAC.
///
/// A `u64` always fits in 8 bytes, so the left padding of the minimal
/// big-endian representation is exactly `to_be_bytes`.
pub fn encode_counter(counter: u64) -> [u8; 8] {
    counter.to_be_bytes()
}

fn hmac_digest<M>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| OtpError::InvalidKey)?;
    mac.update(message);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Calculates the HMAC digest of the encoded counter.
pub fn calc_digest(
    key: &[u8],
    algorithm: OtpHashAlgorithm,
    counter: u64,
) -> Result<Vec<u8>, OtpError> {
    let message = encode_counter(counter);

    match algorithm {
        OtpHashAlgorithm::SHA1 => hmac_digest::<Hmac<Sha1>>(key, &message),
        OtpHashAlgorithm::SHA256 => hmac_digest::<Hmac<Sha256>>(key, &message),
        OtpHashAlgorithm::SHA512 => hmac_digest::<Hmac<Sha512>>(key, &message),
    }
}

/// Dynamic truncation of RFC 4226 section 5.3.
pub fn truncate(digest: &[u8]) -> Result<u32, OtpError> {
    // While sometimes this is a hardcoded 19
    // the last byte tells us the offset for any algorithm
    let offset = match digest.last() {
        Some(x) => *x & 0xf,
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    } as usize;
    debug!("truncation offset {offset}");

    // Gets the 4 bytes that will compose the code
    let code_bytes: [u8; 4] = match digest.get(offset..offset + 4).map(<[u8; 4]>::try_from) {
        Some(Ok(x)) => x,
        _ => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    Ok(u32::from_be_bytes(code_bytes) & 0x7fffffff)
}

/// Generates the HOTP value for `counter`, reduced to `digits` decimal digits.
///
/// This is the whole token derivation: HMAC over the 8-byte counter, dynamic
/// truncation, then `mod 10^digits`. Every failure is returned, nothing panics.
pub fn generate(
    key: &[u8],
    counter: u64,
    algorithm: OtpHashAlgorithm,
    digits: u32,
) -> Result<OtpCode, OtpError> {
    if key.is_empty() {
        return Err(OtpError::EmptyKey);
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(OtpError::InvalidDigits(digits));
    }

    debug!("generating {algorithm} code for counter {counter}");
    let digest = calc_digest(key, algorithm, counter)?;
    trace!("digest {}", data_encoding::HEXLOWER.encode(&digest));

    let truncated = truncate(&digest)?;
    trace!("truncated value {truncated}");

    // 10^10 does not fit in a u32, the modulus is taken in u64
    let code = (u64::from(truncated) % 10u64.pow(digits)) as u32;

    Ok(OtpCode { code, digits })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotp {
    secret: String,
    algorithm: OtpHashAlgorithm,
    // How many digits to generate
    digits: u32,
    // The next counter to generate a code for
    counter: u64,
}

impl Otp for Hotp {
    fn secret(&self) -> &str {
        &self.secret
    }

    fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    fn digits(&self) -> u32 {
        self.digits
    }
}

impl Hotp {
    /// Creates the config for the [HMAC-based One-time Password Algorithm](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
    /// (HOTP) given an RFC4648 base32 encoded secret
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a counter of 0
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            algorithm: OtpHashAlgorithm::SHA1,
            digits: DEFAULT_DIGITS,
            counter: 0,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    ///  Sets the internal counter
    pub fn with_counter(&mut self, counter: u64) -> &mut Self {
        self.counter = counter;

        self
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Generates a HOTP from the provided counter
    /// truncated to the specified number of digits
    pub fn generate(&self, counter: u64) -> Result<OtpCode, OtpError> {
        self.generate_for_counter(counter)
    }

    /// Generates a HOTP from the internal counter
    pub fn generate_current(&self) -> Result<OtpCode, OtpError> {
        self.generate(self.counter)
    }

    /// Generates a HOTP from the internal counter, then advances it.
    ///
    /// The counter is left untouched when generation fails or when it is
    /// already at `u64::MAX`.
    pub fn generate_and_increment(&mut self) -> Result<OtpCode, OtpError> {
        let next = self
            .counter
            .checked_add(1)
            .ok_or(OtpError::CounterOverflow(self.counter))?;

        let code = self.generate_current()?;
        self.counter = next;

        Ok(code)
    }
}
