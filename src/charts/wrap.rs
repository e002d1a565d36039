//! Title wrapping for narrow chart containers.

/// Approximate width of one title character, in pixels.
pub const TITLE_CHAR_PX: f64 = 8.0;
/// Approximate width of one subtitle character, in pixels.
pub const SUBTITLE_CHAR_PX: f64 = 6.5;
/// Horizontal space kept free for the vertical toolbox.
pub const TOOLBOX_RESERVE_PX: u32 = 60;
/// Lines never get shorter than this.
pub const MIN_LINE_CHARS: usize = 20;

/// Characters per line for a container `width_px` wide.
pub fn char_budget(width_px: u32, char_px: f64) -> usize {
    let usable = width_px.saturating_sub(TOOLBOX_RESERVE_PX) as f64;
    ((usable / char_px).floor() as usize).max(MIN_LINE_CHARS)
}

/// Break `text` into lines of at most `budget` characters.
///
/// Lines break between words; a word longer than a whole line is cut hard.
/// Text that already fits is returned unchanged.
pub fn wrap_text(text: &str, budget: usize) -> String {
    let budget = budget.max(1);
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > budget {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(budget).peekable();
            while let Some(chunk) = chunks.next() {
                let piece: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(piece);
                } else {
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(wrap_text("Total Documents", 40), "Total Documents");
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("Breakdown by Document Language per Year", 20),
            "Breakdown by\nDocument Language\nper Year"
        );
    }

    #[test]
    fn test_long_word_hard_break() {
        assert_eq!(wrap_text("ab abcdefghij cd", 4), "ab\nabcd\nefgh\nij\ncd");
    }

    #[test]
    fn test_every_line_within_budget() {
        let text = "% Sources With ≥1 Cited Document Share (%) per Year by Collection";
        for line in wrap_text(text, 20).lines() {
            assert!(line.chars().count() <= 20, "{line}");
        }
    }

    #[test]
    fn test_char_budget() {
        assert_eq!(char_budget(860, TITLE_CHAR_PX), 100);
        assert_eq!(char_budget(100, TITLE_CHAR_PX), MIN_LINE_CHARS);
        assert_eq!(char_budget(0, SUBTITLE_CHAR_PX), MIN_LINE_CHARS);
    }
}
