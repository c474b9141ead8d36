/*!
`dsv-core` provides a streaming field scanner and writer for delimited text
(CSV, TSV and friends) that performs no I/O and no allocation.

Most users should use the `dsv` crate instead, which wraps these types with
buffered readers and writers over `std::io`. This crate is useful when you
need full control over buffering.

# Overview

The [`Scanner`](struct.Scanner.html) finds one field at a time in a byte
slice provided by the caller. It handles quoted fields, escaped quotes,
line comments, whitespace trimming and separator guessing. When it needs
more input to decide where a field ends, it says so and the caller retries
with a longer slice.

The [`Writer`](struct.Writer.html) is the inverse: it writes fields into a
caller provided output slice, adding quotes only when they are needed.

# Example

This shows how to count the fields in some data, feeding the scanner all of
the input at once.

```
use dsv_core::{Scanner, ScanResult};

let mut data = b"a,\"b,c\"\nd,e,f\n".to_vec();
let mut scanner = Scanner::new();
let (mut pos, mut fields, mut records) = (0, 0, 0);
loop {
    match scanner.scan(&mut data[pos..], true).unwrap() {
        ScanResult::Field { consumed, record_end, .. } => {
            pos += consumed;
            fields += 1;
            if record_end {
                records += 1;
            }
        }
        ScanResult::Comment { consumed } => pos += consumed,
        ScanResult::End => break,
        ScanResult::InputEmpty => unreachable!(),
    }
}
assert_eq!((fields, records), (5, 2));
```
*/

#![deny(missing_docs)]

pub use crate::guess::{guess_separator, CANDIDATES};
pub use crate::scanner::{ScanError, ScanResult, Scanner, ScannerBuilder};
pub use crate::trim::{trim, trim_range};
pub use crate::writer::{
    QuoteStyle, Terminator, WriteResult, Writer, WriterBuilder,
};

mod guess;
mod scanner;
mod trim;
mod writer;
