use std::io::{BufRead, Write};

use x402::{redact_address, UnlockConfig, NATIVE_ASSET_CODE};

/// Human-readable description of the payment a signature would authorize.
pub fn payment_summary(config: &UnlockConfig) -> String {
    format!(
        "Sign payment of {} {} to {} on {}?",
        config.amount,
        NATIVE_ASSET_CODE,
        redact_address(&config.destination),
        config.network_name
    )
}

/// Ask a yes/no question. Anything other than `y`/`yes` declines, including
/// EOF and read errors.
pub fn confirm<R: BufRead, Wr: Write>(mut input: R, mut out: Wr, question: &str) -> bool {
    if write!(out, "{question} [y/N] ").and_then(|_| out.flush()).is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}
