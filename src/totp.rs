use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::{Otp, OtpCode, OtpError, OtpHashAlgorithm, DEFAULT_DIGITS};

/// Length of a time step in seconds when none is configured
pub const DEFAULT_PERIOD: u64 = 30;
/// Unix time at which counting of time steps starts (T0)
pub const DEFAULT_START_TIME: u64 = 0;

/// Number of whole time steps elapsed between `start_time` and `time`,
/// `floor((time - start_time) / period)`.
///
/// A `time` before `start_time` is rejected instead of being clamped.
pub fn current_counter(time: u64, start_time: u64, period: u64) -> Result<u64, OtpError> {
    if period == 0 {
        return Err(OtpError::InvalidPeriod);
    }

    let elapsed = time
        .checked_sub(start_time)
        .ok_or(OtpError::TimeBeforeStart { time, start_time })?;

    Ok(elapsed / period)
}

/// Seconds since the Unix epoch according to the system clock
pub fn unix_now() -> Result<u64, OtpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(OtpError::Clock)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    secret: String,
    algorithm: OtpHashAlgorithm,
    period: u64,
    digits: u32,
    start_time: u64,
}

impl Otp for Totp {
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

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given an RFC4648 base32 encoded secret.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code, a period of 30 seconds
    /// and a start time of 0
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            algorithm: OtpHashAlgorithm::SHA1,
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
            start_time: DEFAULT_START_TIME,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    ///  Sets the Unix time from which time steps are counted
    pub fn with_start_time(&mut self, start_time: u64) -> &mut Self {
        self.start_time = start_time;

        self
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// The moving factor for the given seconds since the UNIX epoch
    pub fn counter_at(&self, seconds_since_epoch: u64) -> Result<u64, OtpError> {
        current_counter(seconds_since_epoch, self.start_time, self.period)
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    /// truncated to the specified number of digits
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, OtpError> {
        let counter = self.counter_at(seconds_since_epoch)?;

        self.generate_for_counter(counter)
    }

    /// Generates a Totp for the current system time
    pub fn generate_current(&self) -> Result<OtpCode, OtpError> {
        let now = unix_now()?;
        debug!("system time {now}");

        self.generate(now)
    }

    /// Seconds left before the code generated at `seconds_since_epoch` expires
    pub fn remaining_seconds(&self, seconds_since_epoch: u64) -> Result<u64, OtpError> {
        self.counter_at(seconds_since_epoch)?;

        Ok(self.period - (seconds_since_epoch - self.start_time) % self.period)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::{current_counter, Totp};
    use crate::{OtpError, OtpErrorKind, OtpHashAlgorithm};

    #[fixture]
    pub fn sha1_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string()
    }

    #[fixture]
    pub fn sha256_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA".to_string()
    }

    #[fixture]
    pub fn sha512_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA".to_string()
    }

    #[rstest]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 59, "94287082")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 59, "46119246")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 59, "90693936")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 1111111109, "07081804")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 1111111109, "68084774")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 1111111109, "25091201")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 1111111111, "14050471")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 1111111111, "67062674")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 1111111111, "99943326")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 1234567890, "89005924")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 1234567890, "91819424")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 1234567890, "93441116")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 2000000000, "69279037")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 2000000000, "90698825")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 2000000000, "38618901")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 20000000000, "65353130")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 20000000000, "77737706")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 20000000000, "47863826")]
    #[case(sha1_secret(), OtpHashAlgorithm::SHA1, 20000000000, "353130")]
    #[case(sha256_secret(), OtpHashAlgorithm::SHA256, 20000000000, "737706")]
    #[case(sha512_secret(), OtpHashAlgorithm::SHA512, 20000000000, "863826")]
    fn totp_test(
        #[case] secret: String,
        #[case] hash: OtpHashAlgorithm,
        #[case] timestamp: u64,
        #[case] expected: &str,
    ) {
        let mut totp_base = Totp::new(secret);
        totp_base
            .with_algorithm(hash)
            .with_digits(expected.len() as u32);

        let generated_otp = totp_base.generate(timestamp).unwrap();
        assert_eq!(expected, generated_otp.to_string());
    }

    #[rstest]
    #[case(59, 0, 30, 1)]
    #[case(30, 0, 30, 1)]
    #[case(29, 0, 30, 0)]
    #[case(0, 0, 30, 0)]
    #[case(1111111109, 0, 30, 37037036)]
    #[case(100, 40, 30, 2)]
    #[case(69, 40, 30, 0)]
    #[case(7, 0, 1, 7)]
    fn counter_from_time(
        #[case] time: u64,
        #[case] start_time: u64,
        #[case] period: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(expected, current_counter(time, start_time, period).unwrap());
    }

    #[test]
    fn zero_period_is_rejected() {
        let error = current_counter(59, 0, 0).unwrap_err();

        assert!(matches!(error, OtpError::InvalidPeriod));
        assert_eq!(OtpErrorKind::Generation, error.kind());
    }

    #[test]
    fn time_before_start_is_rejected() {
        let error = current_counter(10, 20, 30).unwrap_err();

        assert!(matches!(
            error,
            OtpError::TimeBeforeStart {
                time: 10,
                start_time: 20
            }
        ));
        assert_eq!(OtpErrorKind::Clock, error.kind());
    }

    #[test]
    fn start_time_shifts_steps() {
        let mut shifted = Totp::new(sha1_secret());
        shifted.with_start_time(1000);
        let plain = Totp::new(sha1_secret());

        assert_eq!(plain.generate(59).unwrap(), shifted.generate(1059).unwrap());
        assert!(shifted.generate(999).is_err());
    }

    #[test]
    fn defaults() {
        let totp = Totp::new(sha1_secret());

        assert_eq!(30, totp.period());
        assert_eq!(0, totp.start_time());
        assert_eq!(6, totp.generate(59).unwrap().to_string().len());
    }

    #[rstest]
    #[case(0, 0, 30, 30)]
    #[case(29, 0, 30, 1)]
    #[case(30, 0, 30, 30)]
    #[case(59, 0, 30, 1)]
    #[case(1010, 1000, 60, 50)]
    fn remaining_seconds(
        #[case] time: u64,
        #[case] start_time: u64,
        #[case] period: u64,
        #[case] expected: u64,
    ) {
        let mut totp = Totp::new(sha1_secret());
        totp.with_start_time(start_time).with_period(period);

        assert_eq!(expected, totp.remaining_seconds(time).unwrap());
    }

    #[test]
    fn current_code_matches_explicit_time() {
        let totp = Totp::new(sha1_secret());

        let before = super::unix_now().unwrap();
        let current = totp.generate_current().unwrap();
        let after = super::unix_now().unwrap();

        // The clock may cross a step boundary between the reads
        let candidates = [totp.generate(before).unwrap(), totp.generate(after).unwrap()];
        assert!(candidates.contains(&current));
    }
}
