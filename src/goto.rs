//! Rollcall goto extraction from scanned QR payloads

use reqwest::Url;

/// Query parameter carrying the rollcall session token.
pub const GOTO_PARAM: &str = "goto";

/// Extract `param` from `input`.
///
/// An absolute URL is read through its query string (percent-decoded). If the
/// input does not parse as one, the raw text is searched for `param=` and the
/// value runs to the next `&` or the end. Empty values count as absent.
pub fn extract_param(input: &str, param: &str) -> Option<String> {
    let input = input.trim();

    let value = match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == param)
            .map(|(_, v)| v.into_owned()),
        Err(_) => raw_match(input, param).map(str::to_string),
    };

    value.filter(|v| !v.is_empty())
}

pub fn extract_goto(input: &str) -> Option<String> {
    extract_param(input, GOTO_PARAM)
}

// First non-empty `param=value`, value running to the next `&`
fn raw_match<'a>(input: &'a str, param: &str) -> Option<&'a str> {
    let needle = format!("{}=", param);
    input.match_indices(&needle).find_map(|(start, _)| {
        let rest = &input[start + needle.len()..];
        let end = rest.find('&').unwrap_or(rest.len());
        Some(&rest[..end]).filter(|v| !v.is_empty())
    })
}
