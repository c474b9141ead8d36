use std::fmt;
use std::iter::FromIterator;
use std::ops::{self, Range};
use std::result;
use std::str;

use bstr::ByteSlice;

use crate::error::Utf8Error;

/// A single record stored as raw bytes.
///
/// A byte record owns a copy of every field, so unlike the field views
/// handed out by a `Tokenizer`, it stays valid while the tokenizer advances.
/// Reusing one record across reads avoids an allocation per record.
///
/// All fields are stored contiguously in one buffer, along with the end
/// offset of each field.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct ByteRecord {
    /// All fields in this record, stored contiguously.
    fields: Vec<u8>,
    /// The ending offset of each field.
    ends: Vec<usize>,
}

impl ByteRecord {
    /// Create a new empty `ByteRecord`.
    pub fn new() -> ByteRecord {
        ByteRecord::default()
    }

    /// Create a new empty `ByteRecord` with room for `buffer` bytes of field
    /// data spread over `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> ByteRecord {
        ByteRecord {
            fields: Vec::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.range(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Clear this record so that it has zero fields.
    ///
    /// The allocation is kept for reuse.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
    }

    /// Shorten this record to at most `n` fields.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len() {
            return;
        }
        self.ends.truncate(n);
        let end = self.ends.last().cloned().unwrap_or(0);
        self.fields.truncate(end);
    }

    /// Add a new field to the end of this record.
    pub fn push_field(&mut self, field: &[u8]) {
        self.fields.extend_from_slice(field);
        self.ends.push(self.fields.len());
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> ByteRecordIter {
        ByteRecordIter { rec: self, i: 0, start: 0 }
    }

    /// Return all of the field data in this record, without any indication
    /// of where one field ends and the next begins.
    pub fn as_slice(&self) -> &[u8] {
        &self.fields
    }

    fn range(&self, i: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends[prev],
        };
        Some(start..end)
    }

    /// Validate every field of this record as UTF-8.
    ///
    /// This never modifies the contents of this record.
    pub(crate) fn validate(&self) -> result::Result<(), Utf8Error> {
        // If the entire buffer is ASCII, then we have nothing to fear.
        if self.fields.is_ascii() {
            return Ok(());
        }
        // Otherwise, each field must be checked on its own since the
        // concatenation of fields may be valid when a single field is not.
        for (i, field) in self.iter().enumerate() {
            if let Err(err) = str::from_utf8(field) {
                return Err(Utf8Error::new(i, err.valid_up_to()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ByteRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<_> = self.iter().map(ByteSlice::as_bstr).collect();
        write!(f, "ByteRecord({:?})", fields)
    }
}

impl ops::Index<usize> for ByteRecord {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "field index {} out of bounds for record with {} fields",
                i,
                self.len()
            ),
        }
    }
}

impl<T: AsRef<[u8]>> From<Vec<T>> for ByteRecord {
    fn from(xs: Vec<T>) -> ByteRecord {
        ByteRecord::from_iter(xs.iter())
    }
}

impl<'a, T: AsRef<[u8]>> From<&'a [T]> for ByteRecord {
    fn from(xs: &'a [T]) -> ByteRecord {
        ByteRecord::from_iter(xs)
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for ByteRecord {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> ByteRecord {
        let mut record = ByteRecord::new();
        record.extend(iter);
        record
    }
}

impl<T: AsRef<[u8]>> Extend<T> for ByteRecord {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push_field(x.as_ref());
        }
    }
}

impl<'a> IntoIterator for &'a ByteRecord {
    type IntoIter = ByteRecordIter<'a>;
    type Item = &'a [u8];

    fn into_iter(self) -> ByteRecordIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a byte record.
pub struct ByteRecordIter<'a> {
    rec: &'a ByteRecord,
    i: usize,
    start: usize,
}

impl<'a> Iterator for ByteRecordIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let end = *self.rec.ends.get(self.i)?;
        let field = &self.rec.fields[self.start..end];
        self.start = end;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rec.len() - self.i;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for ByteRecordIter<'a> {}
