use anyhow::{bail, Context};
use chrono::FixedOffset;
use tracing_subscriber::EnvFilter;

pub const USERNAME_VAR: &str = "ROLL_CALL_USERNAME";
pub const PASSWORD_VAR: &str = "ROLL_CALL_PASSWORD";

/// Parses `+HH:MM` / `-HH:MM` into a fixed offset.
pub fn parse_utc_offset(value: &str) -> anyhow::Result<FixedOffset> {
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => bail!("utc offset '{value}' must start with + or -"),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .with_context(|| format!("utc offset '{value}' must look like +HH:MM"))?;
    let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !is_number(hours) || !is_number(minutes) {
        bail!("utc offset '{value}' must look like +HH:MM");
    }
    let hours: i32 = hours
        .parse()
        .with_context(|| format!("invalid hours in utc offset '{value}'"))?;
    let minutes: i32 = minutes
        .parse()
        .with_context(|| format!("invalid minutes in utc offset '{value}'"))?;
    if !(0..60).contains(&minutes) {
        bail!("invalid minutes in utc offset '{value}'");
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("utc offset '{value}' is out of range"))
}

/// Flag value first, then the environment.
pub fn resolve_credential(flag: Option<String>, var: &str) -> anyhow::Result<String> {
    match flag {
        Some(value) => Ok(value),
        None => std::env::var(var).with_context(|| format!("pass the credential or set {var}")),
    }
}

pub fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{level}")))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
