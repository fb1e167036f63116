//! Arabic shaping for the bilingual title line.
//!
//! PDF text operators draw glyphs left to right with no shaping, so Arabic
//! text is converted to its contextual presentation forms (Unicode block
//! U+FE70..U+FEFF) and reordered into visual order before emission.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Connects on both sides; forms are isolated, final, initial, medial.
    Dual,
    /// Connects only to the preceding letter; forms are isolated, final.
    Right,
    /// Never connects.
    None,
}

/// Presentation-form base (isolated form) and joining class.
fn letter(c: char) -> Option<(u32, Joining)> {
    use Joining::{Dual, None, Right};
    let entry = match c {
        '\u{0621}' => (0xFE80, None),
        '\u{0622}' => (0xFE81, Right),
        '\u{0623}' => (0xFE83, Right),
        '\u{0624}' => (0xFE85, Right),
        '\u{0625}' => (0xFE87, Right),
        '\u{0626}' => (0xFE89, Dual),
        '\u{0627}' => (0xFE8D, Right),
        '\u{0628}' => (0xFE8F, Dual),
        '\u{0629}' => (0xFE93, Right),
        '\u{062A}' => (0xFE95, Dual),
        '\u{062B}' => (0xFE99, Dual),
        '\u{062C}' => (0xFE9D, Dual),
        '\u{062D}' => (0xFEA1, Dual),
        '\u{062E}' => (0xFEA5, Dual),
        '\u{062F}' => (0xFEA9, Right),
        '\u{0630}' => (0xFEAB, Right),
        '\u{0631}' => (0xFEAD, Right),
        '\u{0632}' => (0xFEAF, Right),
        '\u{0633}' => (0xFEB1, Dual),
        '\u{0634}' => (0xFEB5, Dual),
        '\u{0635}' => (0xFEB9, Dual),
        '\u{0636}' => (0xFEBD, Dual),
        '\u{0637}' => (0xFEC1, Dual),
        '\u{0638}' => (0xFEC5, Dual),
        '\u{0639}' => (0xFEC9, Dual),
        '\u{063A}' => (0xFECD, Dual),
        '\u{0641}' => (0xFED1, Dual),
        '\u{0642}' => (0xFED5, Dual),
        '\u{0643}' => (0xFED9, Dual),
        '\u{0644}' => (0xFEDD, Dual),
        '\u{0645}' => (0xFEE1, Dual),
        '\u{0646}' => (0xFEE5, Dual),
        '\u{0647}' => (0xFEE9, Dual),
        '\u{0648}' => (0xFEED, Right),
        '\u{0649}' => (0xFEEF, Right),
        '\u{064A}' => (0xFEF1, Dual),
        _ => return Option::None,
    };
    Some(entry)
}

const LAM: char = '\u{0644}';

/// Lam-alef ligature (isolated, final) for the alef variant following lam.
fn lam_alef(alef: char) -> Option<(u32, u32)> {
    match alef {
        '\u{0622}' => Some((0xFEF5, 0xFEF6)),
        '\u{0623}' => Some((0xFEF7, 0xFEF8)),
        '\u{0625}' => Some((0xFEF9, 0xFEFA)),
        '\u{0627}' => Some((0xFEFB, 0xFEFC)),
        _ => None,
    }
}

/// Harakat and superscript alef do not affect joining.
fn is_transparent(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}')
}

fn is_rtl(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{08FF}' | '\u{FB1D}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}')
}

fn to_char(code: u32, fallback: char) -> char {
    char::from_u32(code).unwrap_or(fallback)
}

/// Replace Arabic letters with their contextual presentation forms.
///
/// Characters outside the Arabic letter table pass through unchanged and
/// break joining.
pub fn shape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    // Index of the next non-transparent character after `i`.
    let next_solid = |i: usize| (i + 1..chars.len()).find(|&j| !is_transparent(chars[j]));

    // Whether the previous shaped letter connects forward into this one.
    let mut prev_connects = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if is_transparent(c) {
            out.push(c);
            i += 1;
            continue;
        }

        let Some((base, joining)) = letter(c) else {
            out.push(c);
            prev_connects = false;
            i += 1;
            continue;
        };

        if c == LAM {
            if let Some(j) = next_solid(i) {
                if let Some((isolated, final_form)) = lam_alef(chars[j]) {
                    let code = if prev_connects { final_form } else { isolated };
                    out.push(to_char(code, c));
                    // Harakat between lam and alef stay attached.
                    out.extend(chars[i + 1..j].iter());
                    prev_connects = false;
                    i = j + 1;
                    continue;
                }
            }
        }

        let joins_prev = prev_connects && joining != Joining::None;
        let joins_next = joining == Joining::Dual
            && next_solid(i)
                .and_then(|j| letter(chars[j]))
                .is_some_and(|(_, next)| next != Joining::None);

        let offset = match (joins_prev, joins_next) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        };
        out.push(to_char(base + offset, c));
        prev_connects = joins_next;
        i += 1;
    }

    out
}

/// Reorder a logical-order right-to-left line into visual (left to right)
/// order, keeping embedded left-to-right runs such as digits readable.
pub fn visual_order(text: &str) -> String {
    let mut runs: Vec<(bool, Vec<char>)> = Vec::new();
    for c in text.chars() {
        let ltr = c.is_ascii_alphanumeric();
        match runs.last_mut() {
            Some((kind, run)) if *kind == ltr => run.push(c),
            _ => runs.push((ltr, vec![c])),
        }
    }

    runs.into_iter()
        .rev()
        .flat_map(|(ltr, mut run)| {
            if !ltr {
                run.reverse();
            }
            run
        })
        .collect()
}

/// Shape and reorder `text` for display, if it contains right-to-left text.
pub fn prepare(text: &str) -> String {
    if text.chars().any(is_rtl) {
        visual_order(&shape(text))
    } else {
        text.to_string()
    }
}
