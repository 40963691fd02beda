// Text wrapping unit tests
// Extracted from src/render/wrap.rs for improved readability

use utakata::render::wrap_text;

// Ten pixels per character keeps the arithmetic readable
fn measure(s: &str) -> u32 {
    s.chars().count() as u32 * 10
}

#[test]
fn test_empty_text_yields_one_empty_line() {
    assert_eq!(wrap_text("", 100, measure), vec![String::new()]);
    assert_eq!(wrap_text("   ", 100, measure), vec![String::new()]);
}

#[test]
fn test_short_text_stays_on_one_line() {
    assert_eq!(wrap_text("hello", 100, measure), vec!["hello"]);
}

#[test]
fn test_lines_fill_greedily() {
    // "aa bb" measures 50, "aa bb cc" measures 80
    let lines = wrap_text("aa bb cc", 50, measure);
    assert_eq!(lines, vec!["aa bb", "cc"]);
}

#[test]
fn test_words_are_never_split_or_reordered() {
    let text = "the quick brown fox jumps over the lazy dog";
    let lines = wrap_text(text, 120, measure);

    let rejoined = lines.join(" ");
    assert_eq!(rejoined, text);
}

#[test]
fn test_overlong_word_gets_its_own_line_unbroken() {
    let lines = wrap_text("hi incomprehensibilities yo", 100, measure);
    assert!(lines.contains(&"incomprehensibilities".to_string()));
}

#[test]
fn test_every_line_fits_unless_it_is_a_single_word() {
    let text = "a few words and one absurdlyoverlongtoken more text here";
    let lines = wrap_text(text, 90, measure);

    for line in &lines {
        let fits = measure(line) <= 90;
        let single_word = !line.contains(' ');
        assert!(fits || single_word, "line {line:?} breaks the invariant");
    }
}

#[test]
fn test_wrapping_is_idempotent_per_line() {
    let lines = wrap_text("one two three four five six seven", 70, measure);
    for line in &lines {
        assert_eq!(wrap_text(line, 70, measure), vec![line.clone()]);
    }
}

#[test]
fn test_whitespace_runs_collapse() {
    let lines = wrap_text("spaced \t out   words", 1000, measure);
    assert_eq!(lines, vec!["spaced out words"]);
}
