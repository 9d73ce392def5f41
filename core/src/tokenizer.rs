/// Tokenize text into lower-cased, whitespace-delimited terms.
///
/// Punctuation is not stripped, so `"hello,"` and `"hello"` are different
/// terms. Every occurrence is returned, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Normalize a raw query for substring matching.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}
