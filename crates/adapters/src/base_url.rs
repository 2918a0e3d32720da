use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/v\d+/?$").expect("valid regex for version suffix"));

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Normalises an OpenAI-style base URL so it ends in a version segment.
/// A trailing `#` opts out of normalisation.
pub fn check_base_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if trimmed.ends_with('#') {
        return trimmed.trim_end_matches('#').to_string();
    }

    if VERSION_SUFFIX_RE.is_match(trimmed) || trimmed.contains("/v1/") {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("{}/v1", trimmed.trim_end_matches('/'))
    }
}

/// Joins an operation path such as `chat/completions` onto a normalised base URL,
/// falling back to the public OpenAI endpoint when the base is blank.
pub fn openai_operation_url(base_url: &str, operation: &str) -> String {
    let base = if base_url.trim().is_empty() {
        OPENAI_DEFAULT_BASE_URL.to_string()
    } else {
        check_base_url(base_url)
    };
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        operation.trim_start_matches('/')
    )
}
