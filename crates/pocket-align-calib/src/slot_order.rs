//! Slot numbers parsed from feeder names, used to order a batch.

use crate::feeder::Feeder;

/// Sort key for feeders whose name carries no slot number.
pub const UNORDERED_SLOT: u64 = 999_999;

type SlotRule = fn(&str) -> Option<u64>;

/// Tried in order; the first rule that yields a number wins.
const SLOT_RULES: [SlotRule; 3] = [labelled_slot, bare_number, parenthesized_number];

/// Slot number encoded in a feeder name, or [`UNORDERED_SLOT`].
///
/// Recognizes `Slot: 12` anywhere in the name (any case, optional
/// whitespace after the colon), a name made only of digits, and `(12)`.
pub fn slot_number(name: &str) -> u64 {
    SLOT_RULES
        .iter()
        .find_map(|rule| rule(name))
        .unwrap_or(UNORDERED_SLOT)
}

/// Stable sort by [`slot_number`]; unnumbered feeders keep their relative
/// order at the end.
pub fn sort_by_slot(feeders: &mut [Feeder]) {
    feeders.sort_by_key(|f| slot_number(&f.name));
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

fn labelled_slot(name: &str) -> Option<u64> {
    let lower = name.to_ascii_lowercase();
    lower.match_indices("slot:").find_map(|(i, label)| {
        let rest = lower[i + label.len()..].trim_start();
        leading_digits(rest).parse().ok()
    })
}

fn bare_number(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

fn parenthesized_number(name: &str) -> Option<u64> {
    name.match_indices('(').find_map(|(i, _)| {
        let rest = &name[i + 1..];
        let digits = leading_digits(rest);
        if digits.is_empty() || !rest[digits.len()..].starts_with(')') {
            return None;
        }
        digits.parse().ok()
    })
}
