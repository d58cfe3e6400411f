use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::TimeRange;

/// Length of the CSRF nonce sent as the OAuth `state` parameter.
pub const CSRF_STATE_LENGTH: usize = 128;

const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Generates a fresh, unguessable `state` value for an authorization request.
///
/// Characters are drawn from the unreserved URL alphabet using the thread
/// local CSPRNG, so the value can be echoed through a redirect unencoded.
pub fn generate_csrf_state() -> String {
    let mut rng = rand::rng();
    (0..CSRF_STATE_LENGTH)
        .map(|_| URL_SAFE_ALPHABET[rng.random_range(0..URL_SAFE_ALPHABET.len())] as char)
        .collect()
}

/// Whether `c` may appear in a CSRF state value.
pub fn is_url_safe(c: char) -> bool {
    c.is_ascii() && URL_SAFE_ALPHABET.contains(&(c as u8))
}

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" | "short_term" => Ok(TimeRange::ShortTerm),
            "medium" | "medium_term" => Ok(TimeRange::MediumTerm),
            "long" | "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "Invalid time range: {}. Use short, medium or long.",
                other
            )),
        }
    }
}

/// clap value parser for `--time-range`.
pub fn parse_time_range(s: &str) -> Result<TimeRange, String> {
    s.parse()
}
