//! Greedy line wrapping against a measured pixel width.
//!
//! The wrapper is pure: it takes a measuring closure so callers can wrap
//! against any font at any size, and tests can wrap against a fake ruler.

/// Wrap `text` into lines no wider than `max_width` pixels.
///
/// Words are taken in order and packed greedily: a word joins the current
/// line when the measured candidate still fits, otherwise it starts a new
/// line. A single word wider than `max_width` still gets its own line
/// unsplit. Empty input produces exactly one empty line so callers always
/// have something to lay out.
///
/// # Arguments
///
/// * `text` - Input text, split on whitespace
/// * `max_width` - Maximum line width in pixels
/// * `measure` - Returns the rendered width of a candidate line in pixels
pub fn wrap_text<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut words = text.split_whitespace();

    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();

    for word in words {
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    lines.push(current);
    lines
}
