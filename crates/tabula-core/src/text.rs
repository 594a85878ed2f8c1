#![forbid(unsafe_code)]

//! Text normalization shared by the filter and sort engines.
//!
//! Everything here works on already-rendered cell text. Comparisons are
//! case-insensitive; numbers may carry thousands separators.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use heck::ToKebabCase;

/// Key used when a header slugs down to nothing.
pub const FALLBACK_KEY: &str = "column";

/// Slug-format a declared key attribute or header label into a column key.
///
/// ```
/// use tabula_core::text::column_key;
/// assert_eq!(column_key("E-mail Address"), "e-mail-address");
/// assert_eq!(column_key("  Role "), "role");
/// assert_eq!(column_key("$$"), "column");
/// ```
#[must_use]
pub fn column_key(raw: &str) -> String {
    let slug = raw.trim().to_kebab_case();
    if slug.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        slug
    }
}

/// Make `base` unique against `taken` by appending `-2`, `-3`, ...
#[must_use]
pub fn unique_key(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Lower-case for case-insensitive comparison.
#[must_use]
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Lower-cased whitespace-separated tokens of a free-text query.
#[must_use]
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(fold).collect()
}

/// Remove thousands separators.
#[must_use]
pub fn strip_thousands(text: &str) -> String {
    text.chars().filter(|c| *c != ',').collect()
}

/// Lenient numeric parse used by comparison rules.
///
/// Commas are stripped and surrounding whitespace ignored. Non-finite
/// results (`NaN`, `inf`) count as "not a number".
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let stripped = strip_thousands(text);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Strict numeric parse used for sort keys.
///
/// Only plain integer or decimal literals qualify (`12`, `-3.5`, `.25`,
/// `1,200.50`); exponents and words do not.
#[must_use]
pub fn decimal_literal(text: &str) -> Option<f64> {
    let stripped = strip_thousands(text);
    let trimmed = stripped.trim();
    let body = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body, None),
    };
    let int_ok = int_part.chars().all(|c| c.is_ascii_digit());
    let frac_ok = frac_part.is_none_or(|f| f.chars().all(|c| c.is_ascii_digit()));
    let has_digits = !int_part.is_empty() || frac_part.is_some_and(|f| !f.is_empty());
    if !(int_ok && frac_ok && has_digits) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Case-insensitive natural collation: digit runs compare by value, so
/// `item2` sorts before `item10`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) if ac.is_ascii_digit() && bc.is_ascii_digit() => {
                let a_run = take_digits(&mut a_chars);
                let b_run = take_digits(&mut b_chars);
                match cmp_digit_runs(&a_run, &b_run) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            (Some(ac), Some(bc)) => {
                match ac.to_lowercase().cmp(bc.to_lowercase()) {
                    Ordering::Equal => {
                        a_chars.next();
                        b_chars.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

// Compared as decimal strings so arbitrarily long runs never overflow.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
