/*!
 * Markup protection and text normalization.
 *
 * Inline markup (`<i>`, `<font color="...">`, ...) is swapped for indexed
 * placeholders before text goes to a provider, and swapped back afterwards.
 * Translated text is then normalized so it renders cleanly as a cue.
 */

use regex::Regex;
use once_cell::sync::Lazy;

/// Any `<...>` markup span
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Bidirectional control characters (LRM, RLM, LRE..RLO)
static BIDI_CONTROL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200e}\u{200f}\u{202a}-\u{202e}]").unwrap());

/// Runs of two or more whitespace characters inside a line
static MULTI_SPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// A placeholder and the markup span it stands for
pub type Placeholder = (String, String);

/// Build the placeholder token for the n-th markup span
fn placeholder_token(idx: usize) -> String {
    format!("[[T{}]]", idx)
}

/// Replace every markup span, left to right, with an indexed placeholder.
///
/// Returns the cleaned text and the `(placeholder, original)` pairs in the
/// order they were recorded.
pub fn protect(text: &str) -> (String, Vec<Placeholder>) {
    let mut cleaned = String::with_capacity(text.len());
    let mut placeholders = Vec::new();
    let mut last = 0;

    for (idx, m) in MARKUP_REGEX.find_iter(text).enumerate() {
        let token = placeholder_token(idx);
        cleaned.push_str(&text[last..m.start()]);
        cleaned.push_str(&token);
        placeholders.push((token, m.as_str().to_string()));
        last = m.end();
    }
    cleaned.push_str(&text[last..]);

    (cleaned, placeholders)
}

/// Put the original markup back in place of each placeholder
pub fn restore(text: &str, placeholders: &[Placeholder]) -> String {
    placeholders
        .iter()
        .fold(text.to_string(), |acc, (token, original)| acc.replace(token, original))
}

/// Normalize a block of cue text.
///
/// Converts line endings, strips bidi controls, drops blank lines anywhere,
/// collapses whitespace runs and trims each line's trailing whitespace.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = BIDI_CONTROL_REGEX.replace_all(&unified, "");

    stripped
        .split('\n')
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| MULTI_SPACE_REGEX.replace_all(line, " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
