use core::ops::Range;

use bstr::ByteSlice;

/// Returns the range of `field` left after stripping leading and trailing
/// whitespace.
///
/// Whitespace is Unicode whitespace when `field` is UTF-8 encoded. Invalid
/// UTF-8 sequences are never treated as whitespace. A field made only of
/// whitespace trims to an empty range located at its end.
pub fn trim_range(field: &[u8]) -> Range<usize> {
    let start = field.len() - field.trim_start().len();
    let end = start + field[start..].trim_end().len();
    start..end
}

/// Strip leading and trailing whitespace from `field`.
///
/// ```
/// assert_eq!(dsv_core::trim(b"  a b \t"), b"a b");
/// assert_eq!(dsv_core::trim(b"   "), b"");
/// ```
pub fn trim(field: &[u8]) -> &[u8] {
    &field[trim_range(field)]
}
