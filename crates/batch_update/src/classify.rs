//! Splits a descriptor into index-targeted and bulk entries.

use crate::value::{Descriptor, Value};

/// Largest magnitude whose shortest decimal rendering is plain digits.
const PLAIN_DECIMAL_LIMIT: f64 = 1e21;

/// Parse `key` as an index target.
///
/// A key is an index only if it is the canonical decimal rendering of an
/// integer-valued double: `"0"`, `"-1"`, `"42"` qualify; `"01"`, `"1.5"`,
/// `"+1"`, `"-0"`, `"1e3"` and `"abc"` do not. Magnitudes beyond `i64`
/// saturate, which keeps them out of bounds for any real collection.
pub fn parse_index_key(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: f64 = key.parse().ok()?;
    if !n.is_finite() || n.fract() != 0.0 || n.abs() >= PLAIN_DECIMAL_LIMIT {
        return None;
    }
    // Round-tripping rejects "-0", leading zeros and digits lost to rounding.
    let canonical = if n == 0.0 { "0".to_string() } else { n.to_string() };
    if canonical != key {
        return None;
    }
    Some(n as i64)
}

pub fn is_index_key(key: &str) -> bool {
    parse_index_key(key).is_some()
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexedEntry {
    pub key: String,
    pub index: i64,
    pub value: Value,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classified {
    pub indexed: Vec<IndexedEntry>,
    pub bulk: Descriptor,
}

impl Classified {
    pub fn has_indexed(&self) -> bool {
        !self.indexed.is_empty()
    }

    pub fn has_bulk(&self) -> bool {
        !self.bulk.is_empty()
    }
}

pub fn classify(descriptor: &Descriptor) -> Classified {
    let mut out = Classified::default();
    for (key, value) in descriptor.iter() {
        match parse_index_key(key) {
            Some(index) => out.indexed.push(IndexedEntry {
                key: key.to_string(),
                index,
                value: value.clone(),
            }),
            None => out.bulk.set(key, value.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_integers_are_indices() {
        for (key, expected) in [("0", 0), ("-1", -1), ("42", 42), ("-5", -5)] {
            assert_eq!(parse_index_key(key), Some(expected), "key {key:?}");
        }
    }

    #[test]
    fn non_canonical_forms_are_rejected() {
        for key in [
            "01", "1.5", "abc", "", "-", "+1", "-0", "00", "1e3", " 1", "1 ", "0x10", "-01",
            "1.0", "Infinity", "NaN",
        ] {
            assert!(!is_index_key(key), "key {key:?} must not be an index");
        }
    }

    #[test]
    fn precision_loss_rejects_key() {
        assert!(is_index_key("9007199254740992"));
        assert!(!is_index_key("9007199254740993"));
    }

    #[test]
    fn huge_plain_decimals_stop_at_exponent_threshold() {
        assert!(is_index_key("100000000000000000000"));
        assert!(!is_index_key("1000000000000000000000"));
        assert_eq!(parse_index_key("100000000000000000000"), Some(i64::MAX));
    }

    #[test]
    fn classify_splits_keys() {
        let d = Descriptor::new()
            .with("0", Descriptor::new().with("textContent", "First"))
            .with("color", "red")
            .with("-1", Descriptor::new().with("textContent", "Last"))
            .with("01", "literal");
        let c = classify(&d);
        assert!(c.has_indexed());
        assert!(c.has_bulk());
        let indices: Vec<_> = c.indexed.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, -1]);
        let bulk: Vec<_> = c.bulk.keys().collect();
        assert_eq!(bulk, ["color", "01"]);
    }

    #[test]
    fn classify_empty() {
        let c = classify(&Descriptor::new());
        assert!(!c.has_indexed());
        assert!(!c.has_bulk());
    }
}
