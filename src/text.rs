//! Approximate text measurement and greedy word wrapping.
//!
//! All backends wrap with the same estimator so lines break identically
//! everywhere.

/// Average glyph width as a fraction of the font size.
pub const AVG_GLYPH_RATIO: f32 = 0.5;

/// Strategy for measuring a run of text at a given size, in points.
pub trait WidthEstimator {
    fn width(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed per-character heuristic: every glyph is half the font size wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxWidth;

impl WidthEstimator for ApproxWidth {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        estimate_width(text, font_size)
    }
}

pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_GLYPH_RATIO
}

/// Wrap `text` into lines no wider than `max_width` using the default
/// estimator.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    wrap_with(&ApproxWidth, text, max_width, font_size)
}

/// Greedy wrap: words are packed until the next one would overflow. A word
/// wider than `max_width` gets a line of its own and is never split.
pub fn wrap_with<E: WidthEstimator + ?Sized>(
    estimator: &E,
    text: &str,
    max_width: f32,
    font_size: f32,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let tentative = format!("{} {}", current, word);
        if estimator.width(&tentative, font_size) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = tentative;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn width_is_half_the_font_size_per_char() {
        assert_eq!(estimate_width("abcd", 10.0), 20.0);
        assert_eq!(estimate_width("", 12.0), 0.0);
        // counted in chars, not bytes
        assert_eq!(estimate_width("héllo", 10.0), 25.0);
    }

    #[test]
    fn empty_input_has_no_lines() {
        for (w, s) in [(0.0, 10.0), (100.0, 12.0), (1e6, 1.0)] {
            assert!(wrap_text("", w, s).is_empty());
            assert!(wrap_text("   \n\t ", w, s).is_empty());
        }
    }

    #[test]
    fn lines_rejoin_to_normalized_text_and_respect_width() {
        let samples = [
            "The quick brown fox jumps over the lazy dog",
            "  leading and   irregular\nwhitespace\tis   normalized  ",
            "a bb ccc dddd eeeee ffffff ggggggg hhhhhhhh",
            "Supercalifragilisticexpialidocious is long",
        ];
        for text in samples {
            for max_width in [20.0, 50.0, 80.0, 150.0, 400.0] {
                let lines = wrap_text(text, max_width, 10.0);
                assert_eq!(lines.join(" "), normalized(text));
                for line in &lines {
                    let single_word = !line.contains(' ');
                    assert!(estimate_width(line, 10.0) <= max_width || single_word, "{:?}", line);
                }
            }
        }
    }

    #[test]
    fn long_word_stands_alone() {
        let lines = wrap_text("to antidisestablishmentarianism we go", 60.0, 10.0);
        assert_eq!(lines, vec!["to", "antidisestablishmentarianism", "we go"]);
    }

    #[test]
    fn custom_estimator_changes_breaks() {
        struct Wide;
        impl WidthEstimator for Wide {
            fn width(&self, text: &str, font_size: f32) -> f32 {
                text.chars().count() as f32 * font_size
            }
        }
        let text = "aa bb cc";
        assert_eq!(wrap_text(text, 50.0, 10.0), vec!["aa bb cc"]);
        assert_eq!(wrap_with(&Wide, text, 50.0, 10.0), vec!["aa bb", "cc"]);
    }
}
