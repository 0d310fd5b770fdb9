//! Negative-aware index resolution against a snapshot length.

/// Negative indices count from the end: `-1` is the last position.
///
/// The result may still be out of range; check it with [`is_valid`].
pub fn resolve(index: i64, length: usize) -> i64 {
    if index < 0 {
        (length as i64).saturating_add(index)
    } else {
        index
    }
}

pub fn is_valid(resolved: i64, length: usize) -> bool {
    resolved >= 0 && (resolved as u64) < length as u64
}

/// [`resolve`] followed by [`is_valid`]; out-of-range indices are never clamped.
pub fn resolve_checked(index: i64, length: usize) -> Option<usize> {
    let resolved = resolve(index, length);
    is_valid(resolved, length).then_some(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_end() {
        assert_eq!(resolve(-1, 5), 4);
        assert_eq!(resolve(-5, 5), 0);
        assert_eq!(resolve(-6, 5), -1);
        assert!(!is_valid(resolve(-6, 5), 5));
    }

    #[test]
    fn non_negative_pass_through() {
        assert_eq!(resolve(0, 3), 0);
        assert_eq!(resolve(7, 3), 7);
        assert!(!is_valid(7, 3));
        assert!(!is_valid(3, 3));
        assert!(is_valid(2, 3));
    }

    #[test]
    fn checked_resolution() {
        assert_eq!(resolve_checked(-1, 3), Some(2));
        assert_eq!(resolve_checked(5, 3), None);
        assert_eq!(resolve_checked(0, 0), None);
        assert_eq!(resolve_checked(i64::MIN, 3), None);
        assert_eq!(resolve_checked(i64::MAX, 3), None);
    }
}
