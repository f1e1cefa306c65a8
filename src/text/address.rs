use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// Four groups of 1-3 digits. Octet values are checked by the strict parser.
const DOTTED_QUAD_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DOTTED_QUAD_PATTERN).expect("dotted quad pattern is valid")
});

/// Punctuation OCR tends to glue onto the end of an address
const TRAILING_NOISE: &[char] = &['.', ',', ';', ':', ')', ']', '}', '>'];

/// Raw dotted-quad matches in a line, left to right
pub fn ip_candidates(line: &str) -> impl Iterator<Item = &str> {
    DOTTED_QUAD.find_iter(line).map(|m| m.as_str())
}

/// Strip trailing punctuation and surrounding whitespace from a candidate
pub fn clean_candidate(candidate: &str) -> &str {
    candidate.trim().trim_end_matches(TRAILING_NOISE)
}

/// First candidate across all lines that parses as an IPv4 or IPv6 address
pub fn extract_address<S: AsRef<str>>(lines: &[S]) -> Option<IpAddr> {
    for line in lines {
        for candidate in ip_candidates(line.as_ref()) {
            let cleaned = clean_candidate(candidate);
            match cleaned.parse::<IpAddr>() {
                Ok(addr) => return Some(addr),
                Err(_) => tracing::debug!("Rejected address candidate {:?}", candidate),
            }
        }
    }
    None
}
