//! Domain name normalization and syntax checks.

use regex::Regex;
use std::sync::LazyLock;

/// One DNS label: 1-63 alphanumerics or hyphens, not starting or ending with a hyphen.
static LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").unwrap());

/// Top-level domain: alphabetic, or an IDNA `xn--` label.
static TLD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-z]{2,63}|xn--[a-z0-9-]{1,59})$").unwrap());

const MAX_DOMAIN_LENGTH: usize = 253;

/// Trims surrounding whitespace, a single trailing root dot, and lower-cases the name.
pub fn normalize_domain_name(name: &str) -> String {
    let name = name.trim();
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

/// Returns true if `name` (already normalized) looks like a registrable host name.
///
/// Requires at least two labels and a plausible TLD, so `"invalid"` and
/// `"localhost"` are rejected.
pub fn is_valid_domain_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_DOMAIN_LENGTH {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };

    TLD_REGEX.is_match(tld) && rest.iter().all(|label| LABEL_REGEX.is_match(label))
}
