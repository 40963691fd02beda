// Token generation unit tests
// Extracted from src/store/token.rs for improved readability

use std::collections::HashSet;
use utakata::store::token::{generate_blob_filename, generate_token, token_log_prefix};

fn is_url_safe(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[test]
fn test_tokens_are_url_safe_and_unpadded() {
    for _ in 0..50 {
        let token = generate_token();
        assert!(is_url_safe(&token), "token {token:?} contains unsafe chars");
        assert!(!token.contains('='));
    }
}

#[test]
fn test_tokens_have_stable_length() {
    // 16 random bytes encode to 22 base64 characters without padding
    assert_eq!(generate_token().len(), 22);
}

#[test]
fn test_tokens_do_not_repeat() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(generate_token()), "duplicate token generated");
    }
}

#[test]
fn test_blob_filenames_are_jpg() {
    let name = generate_blob_filename();
    assert!(name.ends_with(".jpg"));
    // 12 random bytes encode to 16 characters
    assert_eq!(name.len(), 16 + ".jpg".len());
    assert!(is_url_safe(name.trim_end_matches(".jpg")));
}

#[test]
fn test_blob_filenames_do_not_repeat() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(generate_blob_filename()));
    }
}

#[test]
fn test_log_prefix_truncates_long_tokens() {
    assert_eq!(token_log_prefix("abcdefghijklmnop"), "abcdefgh");
    assert_eq!(token_log_prefix("short"), "short");
    assert_eq!(token_log_prefix(""), "");
}

#[test]
fn test_log_prefix_never_exposes_a_full_token() {
    let token = generate_token();
    let prefix = token_log_prefix(&token);
    assert!(prefix.len() < token.len());
    assert!(token.starts_with(prefix));
}
