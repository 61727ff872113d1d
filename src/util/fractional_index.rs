//! Fractional order keys for sibling rows.
//!
//! A key is a base-62 fraction in `(0, 1)` written with the digits
//! `0-9A-Za-z`. Those digits are in ASCII order, so comparing two keys as
//! plain strings compares the fractions they encode. Between any two distinct
//! keys another key can always be generated, which lets a row be inserted
//! without rewriting its siblings.

/// Digits in ascending ASCII order.
const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u128 = 62;
const SMALLEST_DIGIT: u8 = 0;
const LARGEST_DIGIT: u8 = 61;
/// `V`
const MID_DIGIT: u8 = 31;

/// Key length above which a sibling set should be rekeyed.
pub const DEFAULT_REBALANCE_THRESHOLD: usize = 50;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate a key that sorts strictly between `before` and `after`.
///
/// `None` for `before` means the start of the sibling list and `None` for
/// `after` means its end. With no neighbors at all the midpoint `"V"` is
/// returned.
pub fn between(before: Option<&str>, after: Option<&str>) -> String {
    let before = before.map(to_digits).unwrap_or_default();
    let after = after.map(to_digits).unwrap_or_default();

    let digits = match (before.is_empty(), after.is_empty()) {
        (true, true) => vec![MID_DIGIT],
        (true, false) => generate_before(&after),
        (false, true) => generate_after(&before),
        (false, false) => generate_between(&before, &after),
    };
    to_key(&digits)
}

/// Evenly spaced ascending keys for `count` siblings.
///
/// Uses the fewest digits that leave at least one free slot between
/// neighbors, so repeated inserts after a rebalance stay short.
pub fn initial(count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let slots_needed = 2 * (count as u128 + 1);
    let mut width = 1;
    let mut total = BASE;
    while total < slots_needed {
        width += 1;
        total *= BASE;
    }

    (1..=count as u128)
        .map(|i| {
            let mut slot = i * total / (count as u128 + 1);
            if slot % BASE == SMALLEST_DIGIT as u128 {
                slot += 1;
            }
            encode_fixed(slot, width)
        })
        .collect()
}

/// True when `key` has grown past `threshold` characters.
pub fn needs_rebalancing(key: &str, threshold: usize) -> bool {
    key.chars().count() > threshold
}

/// Fresh keys for a sibling set of `count` rows, replacing whatever keys they
/// had before.
pub fn rebalance(count: usize) -> Vec<String> {
    initial(count)
}

/// True when every byte of `key` is a key digit and it does not end in `0`.
pub fn is_valid(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| DIGITS.contains(&b))
        && !key.ends_with('0')
}

// ---------------------------------------------------------------------------
// Digit helpers
// ---------------------------------------------------------------------------

fn digit_index(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'a'..=b'z' => Some(byte - b'a' + 36),
        _ => None,
    }
}

fn to_digits(key: &str) -> Vec<u8> {
    key.bytes().filter_map(digit_index).collect()
}

fn to_key(digits: &[u8]) -> String {
    digits.iter().map(|&d| DIGITS[d as usize] as char).collect()
}

fn encode_fixed(mut value: u128, width: usize) -> String {
    let mut digits = vec![SMALLEST_DIGIT; width];
    for slot in digits.iter_mut().rev() {
        *slot = (value % BASE) as u8;
        value /= BASE;
    }
    to_key(&digits)
}

/// A key below `after`: leading zeros are copied, the first non-zero digit is
/// halved. A leading `1` cannot be halved, so `0` plus the midpoint is used.
fn generate_before(after: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(after.len() + 1);
    for &digit in after {
        if digit == SMALLEST_DIGIT {
            result.push(SMALLEST_DIGIT);
            continue;
        }
        if digit == 1 {
            result.push(SMALLEST_DIGIT);
            break;
        }
        result.push(digit / 2);
        return result;
    }
    result.push(MID_DIGIT);
    result
}

/// A key above `before`: the rightmost digit that is not the ceiling moves
/// halfway up and everything after it is dropped.
fn generate_after(before: &[u8]) -> Vec<u8> {
    if let Some(pos) = before.iter().rposition(|&d| d < LARGEST_DIGIT) {
        let mut result = before[..=pos].to_vec();
        let digit = result[pos];
        result[pos] = digit + (LARGEST_DIGIT - digit).div_ceil(2);
        return result;
    }
    let mut result = before.to_vec();
    result.push(MID_DIGIT);
    result
}

fn generate_between(before: &[u8], after: &[u8]) -> Vec<u8> {
    let mut result = Vec::new();
    let max_len = before.len().max(after.len());

    for pos in 0..max_len {
        let b = before.get(pos).copied().unwrap_or(SMALLEST_DIGIT);
        let a = after.get(pos).copied().unwrap_or(LARGEST_DIGIT);

        if b == a {
            result.push(b);
            continue;
        }

        if b > a {
            break;
        }

        if a - b > 1 {
            result.push((a + b) / 2);
        } else {
            result.push(b);
            let rest = before.get(pos + 1..).unwrap_or(&[]);
            if rest.is_empty() {
                result.push(MID_DIGIT);
            } else {
                result.extend(generate_after(rest));
            }
        }
        return result;
    }

    // Equal or inverted bounds. Order degrades to "after `before`", which
    // keeps the row and lets a later rebalance sort out the tie.
    debug_assert!(false, "fractional index bounds are not ascending");
    tracing::warn!("fractional index bounds are not ascending, keying after lower bound");
    generate_after(before)
}
