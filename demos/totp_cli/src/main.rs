use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::debug;
use otp_token::{
    hotp::Hotp,
    totp::{self, Totp},
    OtpCode, OtpHashAlgorithm, DEFAULT_DIGITS,
};

/// Prints the one-time password for a Base32 secret.
///
/// Without `--counter` a TOTP is generated for the current time (or `--time`),
/// with it a HOTP for that counter.
#[derive(Debug, Parser)]
#[command(name = "totp", version)]
struct Cli {
    /// Number of digits of the code
    #[arg(short, long, default_value_t = DEFAULT_DIGITS)]
    digits: u32,
    /// Time step in seconds
    #[arg(short, long, default_value_t = totp::DEFAULT_PERIOD)]
    period: u64,
    /// Unix time from which time steps are counted
    #[arg(long, default_value_t = totp::DEFAULT_START_TIME)]
    start_time: u64,
    /// SHA1, SHA256 or SHA512
    #[arg(short, long, default_value_t = OtpHashAlgorithm::SHA1)]
    algorithm: OtpHashAlgorithm,
    /// Generate a HOTP for this counter instead of a TOTP
    #[arg(short, long, conflicts_with_all = ["time", "period", "start_time"])]
    counter: Option<u64>,
    /// Use this Unix time instead of the system clock
    #[arg(short, long)]
    time: Option<u64>,
    /// Log the intermediate values of the computation
    #[arg(short, long)]
    verbose: bool,
    /// The secret, spaces between groups are allowed
    #[arg(required = true, num_args = 1..)]
    secret: Vec<String>,
}

fn code(args: &Cli) -> Result<OtpCode> {
    let secret = args.secret.join(" ");

    if let Some(counter) = args.counter {
        debug!("hotp mode, counter {counter}");
        let mut hotp = Hotp::new(secret);
        hotp.with_algorithm(args.algorithm).with_digits(args.digits);
        return Ok(hotp.generate(counter)?);
    }

    debug!("totp mode, {}s steps from {}", args.period, args.start_time);
    let mut totp = Totp::new(secret);
    totp.with_algorithm(args.algorithm)
        .with_digits(args.digits)
        .with_period(args.period)
        .with_start_time(args.start_time);

    let code = match args.time {
        Some(time) => totp.generate(time)?,
        None => totp.generate_current()?,
    };

    Ok(code)
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    let _logger = flexi_logger::Logger::try_with_env_or_str(level)
        .and_then(|logger| logger.start())
        .map_err(|e| eprintln!("warning: logging disabled: {e}"))
        .ok();

    match code(&args) {
        Ok(code) => {
            println!("{code}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
