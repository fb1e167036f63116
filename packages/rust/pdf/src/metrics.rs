//! Helvetica glyph metrics and line wrapping.
//!
//! Widths are the standard Adobe AFM advance widths in 1/1000 em for the
//! printable ASCII range (space through tilde). Builtin PDF fonts only cover
//! that range reliably, so text is folded to ASCII before measuring.

/// Helvetica widths for U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica-Bold widths for U+0020..=U+007E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const FALLBACK_WIDTH: u16 = 556;

/// Advance width of `c` in 1/1000 em.
pub fn char_width(c: char, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match c as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, bold))).sum();
    units as f32 * size / 1000.0
}

/// Fold `text` to the ASCII subset the builtin fonts can show.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\t' | '\u{a0}' => out.push(' '),
            '\n' => out.push('\n'),
            '€' => out.push_str("EUR "),
            '£' => out.push_str("GBP "),
            '•' | '–' | '—' | '‐' => out.push('-'),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            '…' => out.push_str("..."),
            '\r' => {}
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap of one line of text into lines no wider than `max_width`.
///
/// Words wider than a whole line are broken between characters. An empty
/// input yields no lines.
pub fn wrap(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let space = text_width(" ", size, bold);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let width = text_width(word, size, bold);

        if width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            for piece in break_word(word, size, bold, max_width) {
                lines.push(piece);
            }
            if let Some(last) = lines.pop() {
                current_width = text_width(&last, size, bold);
                current = last;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = width;
        } else if current_width + space + width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + width;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let w = f32::from(char_width(c, bold)) * size / 1000.0;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(char_width('a', false), 556);
        assert_eq!(char_width('i', false), 222);
        assert_eq!(char_width('m', false), 833);
        assert_eq!(char_width('b', true), 611);
        assert_eq!(char_width('W', true), 944);
        assert_eq!(char_width('é', false), FALLBACK_WIDTH);
    }

    #[test]
    fn width_scales_with_size() {
        let w10 = text_width("Agreement", 10.0, false);
        let w20 = text_width("Agreement", 20.0, false);
        assert!((w20 - 2.0 * w10).abs() < 1e-3);
        assert!(text_width("Agreement", 10.0, true) > w10);
    }

    #[test]
    fn fold_replaces_symbols() {
        assert_eq!(fold("€1,000.00"), "EUR 1,000.00");
        assert_eq!(fold("• item – “quoted”"), "- item - \"quoted\"");
        assert_eq!(fold("Zürich"), "Z?rich");
    }

    #[test]
    fn wrap_respects_width() {
        let text = "The Service Provider agrees to provide the following professional \
                    services to the Client under the terms of this Agreement.";
        let lines = wrap(text, 10.0, false, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0, false) <= 200.0, "too wide: {line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_breaks_long_words() {
        let word = "x".repeat(200);
        let lines = wrap(&word, 10.0, false, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn wrap_empty_is_empty() {
        assert!(wrap("   ", 10.0, false, 100.0).is_empty());
    }
}
