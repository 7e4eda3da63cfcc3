use once_cell::sync::Lazy;
use regex::Regex;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapses a feed title into its canonical display form: markup stripped,
/// character entities decoded, whitespace runs collapsed to single spaces,
/// ends trimmed.
///
/// Entities are decoded twice because some feeds double-encode them
/// (`&amp;amp;` where `&amp;` was meant); a single pass would leave those
/// half-decoded. Decoding is idempotent on well-formed titles, so the second
/// pass is harmless there.
pub fn normalize_title(raw: &str) -> String {
    let stripped = RE_TAGS.replace_all(raw, "");
    let decoded_once = html_escape::decode_html_entities(stripped.as_ref());
    let decoded = html_escape::decode_html_entities(decoded_once.as_ref());
    RE_WS.replace_all(decoded.as_ref(), " ").trim().to_string()
}
