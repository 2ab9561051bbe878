use std::time::SystemTime;

use otp_token::{totp::Totp, OtpHashAlgorithm};

pub fn main() -> anyhow::Result<()> {
    let seconds = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_secs();

    // Secrets are accepted as users type them: grouped, dashed, lower case
    let mut totp = Totp::new("hxdm-vjec-jjws-rb3h wizr-4ifu-gftm-xboz".into());
    totp.with_digits(8);

    println!(
        "Time step {} ({}s left)",
        totp.counter_at(seconds)?,
        totp.remaining_seconds(seconds)?
    );

    for algorithm in [
        OtpHashAlgorithm::SHA1,
        OtpHashAlgorithm::SHA256,
        OtpHashAlgorithm::SHA512,
    ] {
        let code = totp.with_algorithm(algorithm).generate(seconds)?;
        println!("{algorithm}: {code}");
    }

    Ok(())
}
