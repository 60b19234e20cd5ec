//! Secret scrubbing for anything that leaves the process

use regex::Regex;
use std::sync::OnceLock;

/// Replacement for every scrubbed value
pub const REDACTED: &str = "***";

fn auth_token_pattern() -> &'static Regex {
    static AUTH_TOKEN: OnceLock<Regex> = OnceLock::new();
    AUTH_TOKEN.get_or_init(|| Regex::new(r#"--auth-token(?:=|\s+)([^\s'"`]+)"#).unwrap())
}

/// Replace every value passed via `--auth-token`, and every `known` secret,
/// wherever it appears in `input`
pub fn scrub_secrets(input: &str, known: &[&str]) -> String {
    let mut secrets: Vec<&str> = auth_token_pattern()
        .captures_iter(input)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .chain(known.iter().copied())
        .filter(|s| !s.is_empty() && *s != REDACTED)
        .collect();

    // Longest first so a secret that contains another is replaced whole
    secrets.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    secrets.dedup();

    let mut output = input.to_string();
    for secret in secrets {
        output = output.replace(secret, REDACTED);
    }
    output
}
