/*!
The `dsv` crate provides a fast, streaming tokenizer and writer for
delimited text: CSV, TSV and anything else that separates fields with a
single byte.

# Brief overview

The [`Tokenizer`](struct.Tokenizer.html) reads from any `std::io::Read`
and produces one field per call to
[`advance`](struct.Tokenizer.html#method.advance). Fields are borrowed from
an internal buffer, which grows only as far as the longest field requires
(up to a configurable maximum). It understands quoted fields with doubled
quotes, `\n` and `\r\n` line endings, line comments, lazy quotes, whitespace
trimming and can guess the separator from the data.

On top of `advance`, the tokenizer can read whole records into a
[`ByteRecord`](struct.ByteRecord.html) or
[`StringRecord`](struct.StringRecord.html), decode fields into typed
values through the [`Decode`](trait.Decode.html) trait, and, with the
`serde` feature, decode whole records into anything implementing
`serde::Deserialize`.

The [`Writer`](struct.Writer.html) writes fields to any `std::io::Write`,
quoting them only when needed. The first I/O error it sees is latched and
reported by every later call.

Configuration lives in [`TokenizerBuilder`](struct.TokenizerBuilder.html)
and [`WriterBuilder`](struct.WriterBuilder.html). The quoting logic itself
is provided by the I/O free `dsv-core` crate.

This crate reports what it does through `tracing` events (buffer growth,
the guessed separator and fatal errors, at `debug` level). No subscriber is
installed.

# Example

This copies tab separated data from stdin to stdout, rewriting it as
comma separated data:

```no_run
use std::error::Error;
use std::io;
use std::process;

use dsv::{Token, TokenizerBuilder, Writer};

fn run() -> Result<(), Box<dyn Error>> {
    let mut tok = TokenizerBuilder::new()
        .separator(b'\t')
        .from_reader(io::stdin());
    let mut wtr = Writer::from_writer(io::stdout());
    loop {
        match tok.advance()? {
            Token::Field { record_end } => {
                wtr.write_field(tok.field())?;
                if record_end {
                    wtr.end_of_record()?;
                }
            }
            Token::Comment => {}
            Token::End => break,
        }
    }
    wtr.flush()?;
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        println!("{}", err);
        process::exit(1);
    }
}
```
*/

#![deny(missing_docs)]

pub use dsv_core::{QuoteStyle, Terminator};

pub use crate::buffer::{Buffer, DEFAULT_CAPACITY, DEFAULT_MAX_SIZE};
pub use crate::byte_record::{ByteRecord, ByteRecordIter};
pub use crate::decode::{Decode, DecodeError, DecodeErrorKind, DecodeLine};
pub use crate::encode::Encode;
pub use crate::error::{
    Error, FromUtf8Error, IntoInnerError, Result, Utf8Error,
};
pub use crate::source::Source;
pub use crate::string_record::{StringRecord, StringRecordIter};
pub use crate::tokenizer::{
    ByteRecordsIter, StringRecordsIter, Token, Tokenizer, TokenizerBuilder,
};
pub use crate::writer::{Writer, WriterBuilder};

mod buffer;
mod byte_record;
mod decode;
#[cfg(feature = "serde")]
mod deserializer;
mod encode;
mod error;
mod source;
mod string_record;
mod tokenizer;
mod writer;
