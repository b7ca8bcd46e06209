use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::imei::Imei;
use crate::luhn::IMEI_LEN;

// Maximal ASCII digit runs. `\d` would also match Unicode digits.
fn re_digit_run() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[0-9]+").expect("invalid regex"))
}

/// Every maximal run of ASCII digits that is exactly 15 long, in the order it
/// appears. Longer or shorter runs are skipped whole, never windowed.
pub fn candidates(text: &str) -> Vec<&str> {
    re_digit_run()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() == IMEI_LEN)
        .collect()
}

/// Candidates that pass Luhn, deduplicated, in first-occurrence order.
pub fn valid_imeis(text: &str) -> Vec<Imei> {
    let mut seen = HashSet::new();
    candidates(text)
        .into_iter()
        .filter(|c| seen.insert(*c))
        .filter_map(|c| Imei::parse(c).ok())
        .collect()
}
