use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::InputType;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    )
    .expect("ipv4 regex")
});
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain regex")
});
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("username regex"));

const MIN_INPUT_LEN: usize = 3;

/// Classify raw input. Precedence is email, IPv4, domain, then username;
/// `None` means the input is not scannable.
pub fn classify(text: &str) -> Option<InputType> {
    let input = text.trim();
    if input.chars().count() < MIN_INPUT_LEN {
        return None;
    }
    if EMAIL_RE.is_match(input) {
        return Some(InputType::Email);
    }
    if IPV4_RE.is_match(input) {
        return Some(InputType::Ip);
    }
    if DOMAIN_RE.is_match(input) {
        return Some(InputType::Domain);
    }
    if USERNAME_RE.is_match(input) {
        return Some(InputType::Username);
    }
    None
}

/// True when `text` classifies as exactly `expected`.
pub fn validate(text: &str, expected: InputType) -> bool {
    classify(text) == Some(expected)
}
