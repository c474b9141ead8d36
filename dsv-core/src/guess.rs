/// The separators considered when guessing, in tie-breaking order.
pub const CANDIDATES: [u8; 5] = [b',', b';', b'\t', b'|', b':'];

/// Guess the field separator used by `data`.
///
/// Every occurrence of each byte in `CANDIDATES` is counted and the most
/// frequent one wins. `None` is returned when no candidate occurs at all or
/// when the highest count is shared by more than one candidate. In both cases
/// callers should keep whatever separator they were configured with.
///
/// ```
/// assert_eq!(dsv_core::guess_separator(b"a,b;c\td:e|f;g"), Some(b';'));
/// assert_eq!(dsv_core::guess_separator(b"a,b;c"), None);
/// assert_eq!(dsv_core::guess_separator(b"abc"), None);
/// ```
pub fn guess_separator(data: &[u8]) -> Option<u8> {
    let mut counts = [0u64; 5];
    for &b in data {
        if let Some(i) = candidate_index(b) {
            counts[i] += 1;
        }
    }
    let max = counts.iter().cloned().max().unwrap_or(0);
    if max == 0 {
        return None;
    }
    let mut winners = counts.iter().enumerate().filter(|&(_, &c)| c == max);
    match (winners.next(), winners.next()) {
        (Some((i, _)), None) => Some(CANDIDATES[i]),
        _ => None,
    }
}

#[inline]
fn candidate_index(b: u8) -> Option<usize> {
    match b {
        b',' => Some(0),
        b';' => Some(1),
        b'\t' => Some(2),
        b'|' => Some(3),
        b':' => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{guess_separator, CANDIDATES};

    #[test]
    fn majority_wins() {
        assert_eq!(guess_separator(b"a,b;c\td:e|f;g"), Some(b';'));
        assert_eq!(guess_separator(b"a\tb\tc\nd\te\tf"), Some(b'\t'));
        assert_eq!(guess_separator(b"12:30|x|y"), Some(b'|'));
    }

    #[test]
    fn each_candidate_alone() {
        for &sep in CANDIDATES.iter() {
            let data = [b'a', sep, b'b'];
            assert_eq!(guess_separator(&data), Some(sep));
        }
    }

    #[test]
    fn tie_is_undecided() {
        assert_eq!(guess_separator(b"a,b;c"), None);
        assert_eq!(guess_separator(b"a|b|c:d:e"), None);
    }

    #[test]
    fn nothing_to_count() {
        assert_eq!(guess_separator(b""), None);
        assert_eq!(guess_separator(b"plain text\nmore text"), None);
    }
}
