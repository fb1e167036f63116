//! English cardinal numbers and currency amounts in words.
//!
//! Output follows the common British/US cheque style: "and" joins a hundreds
//! or scale group to a trailing remainder below one hundred, commas separate
//! larger groups, and compound tens are hyphenated
//! (`one thousand, two hundred and thirty-four`).

use contractgen_shared::UnitNames;

/// Largest value (exclusive) [`cardinal`] can spell.
pub const WORDS_LIMIT: u64 = 1_000_000_000_000_000;

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 5] = ["", "thousand", "million", "billion", "trillion"];

fn below_hundred(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{}-{}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

fn below_thousand(n: u64) -> String {
    let (hundreds, rest) = (n / 100, n % 100);
    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} hundred", ONES[h as usize]),
        (h, r) => format!("{} hundred and {}", ONES[h as usize], below_hundred(r)),
    }
}

/// Spell `n` in lowercase English words. Returns `None` at or above
/// [`WORDS_LIMIT`].
pub fn cardinal(n: u64) -> Option<String> {
    if n >= WORDS_LIMIT {
        return None;
    }
    if n == 0 {
        return Some(ONES[0].to_string());
    }

    // Three-digit groups, most significant first, with their scale index.
    let mut groups = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        groups.push((rest % 1000, scale));
        rest /= 1000;
        scale += 1;
    }
    groups.reverse();

    let mut out = String::new();
    for (value, scale) in groups.into_iter().filter(|(v, _)| *v > 0) {
        let mut part = below_thousand(value);
        if scale > 0 {
            part.push(' ');
            part.push_str(SCALES[scale]);
        }
        if !out.is_empty() {
            out.push_str(if scale == 0 && value < 100 { " and " } else { ", " });
        }
        out.push_str(&part);
    }
    Some(out)
}

/// Spell a currency amount given as whole major units plus minor units
/// (0..=99): `two thousand dollars, zero cents`.
pub fn currency(major: u64, minor: u8, units: &UnitNames) -> Option<String> {
    let major_name = if major == 1 {
        units.major_singular
    } else {
        units.major_plural
    };
    let minor_name = if minor == 1 {
        units.minor_singular
    } else {
        units.minor_plural
    };
    Some(format!(
        "{} {major_name}, {} {minor_name}",
        cardinal(major)?,
        cardinal(u64::from(minor))?
    ))
}

/// Capitalize the first letter of every alphabetic run and lowercase the
/// rest (`thirty-four` → `Thirty-Four`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dollars() -> UnitNames {
        UnitNames {
            major_singular: "dollar",
            major_plural: "dollars",
            minor_singular: "cent",
            minor_plural: "cents",
        }
    }

    #[test]
    fn small_numbers() {
        assert_eq!(cardinal(0).unwrap(), "zero");
        assert_eq!(cardinal(7).unwrap(), "seven");
        assert_eq!(cardinal(15).unwrap(), "fifteen");
        assert_eq!(cardinal(40).unwrap(), "forty");
        assert_eq!(cardinal(34).unwrap(), "thirty-four");
    }

    #[test]
    fn hundreds_use_and() {
        assert_eq!(cardinal(100).unwrap(), "one hundred");
        assert_eq!(cardinal(105).unwrap(), "one hundred and five");
        assert_eq!(cardinal(999).unwrap(), "nine hundred and ninety-nine");
    }

    #[test]
    fn scale_groups() {
        assert_eq!(cardinal(2000).unwrap(), "two thousand");
        assert_eq!(cardinal(1005).unwrap(), "one thousand and five");
        assert_eq!(
            cardinal(1234).unwrap(),
            "one thousand, two hundred and thirty-four"
        );
        assert_eq!(
            cardinal(1_200_000).unwrap(),
            "one million, two hundred thousand"
        );
        assert_eq!(cardinal(2_000_034).unwrap(), "two million and thirty-four");
    }

    #[test]
    fn limit_is_enforced() {
        assert!(cardinal(WORDS_LIMIT - 1).is_some());
        assert!(cardinal(WORDS_LIMIT).is_none());
    }

    #[test]
    fn currency_amounts() {
        assert_eq!(
            currency(2000, 0, &dollars()).unwrap(),
            "two thousand dollars, zero cents"
        );
        assert_eq!(currency(1, 1, &dollars()).unwrap(), "one dollar, one cent");
        assert_eq!(
            currency(12, 50, &dollars()).unwrap(),
            "twelve dollars, fifty cents"
        );
    }

    #[test]
    fn title_case_handles_hyphens_and_commas() {
        assert_eq!(
            title_case("one thousand, two hundred and thirty-four dollars, zero cents"),
            "One Thousand, Two Hundred And Thirty-Four Dollars, Zero Cents"
        );
    }
}
