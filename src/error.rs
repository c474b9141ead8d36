use std::error;
use std::fmt;
use std::io;
use std::result;

use dsv_core::ScanError;

use crate::byte_record::ByteRecord;
use crate::decode::DecodeError;

/// A type alias for `Result<T, dsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing delimited data.
///
/// This error can happen when writing or reading data. Every error raised
/// while tokenizing is fatal: once a tokenizer reports one, it produces no
/// more fields.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing data.
    Io(io::Error),
    /// A field (or a comment line) did not fit in a buffer of the maximum
    /// size allowed.
    BufferOverflow {
        /// The maximum buffer size, in bytes.
        max: usize,
    },
    /// A quote was found where it is not allowed, and lazy quotes are
    /// disabled.
    UnescapedQuote {
        /// The line on which the quote appears.
        line: u64,
        /// The 1-based byte column of the quote on its line.
        column: u64,
    },
    /// The data ended inside a quoted field.
    NonTerminatedQuote {
        /// The line on which the quoted field started.
        line: u64,
    },
    /// A UTF-8 decoding error that occurred while reading data into Rust
    /// `String`s.
    Utf8 {
        /// The line on which the offending field ended.
        line: u64,
        /// The corresponding UTF-8 error.
        err: Utf8Error,
    },
    /// A field could not be decoded into the requested type.
    Decode(DecodeError),
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Returns the line associated with this error, if any.
    pub fn line(&self) -> Option<u64> {
        match *self {
            Error::UnescapedQuote { line, .. } => Some(line),
            Error::NonTerminatedQuote { line } => Some(line),
            Error::Utf8 { line, .. } => Some(line),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Error {
        match err {
            ScanError::UnescapedQuote { line, column } => {
                Error::UnescapedQuote { line, column }
            }
            ScanError::NonTerminatedQuote { line } => {
                Error::NonTerminatedQuote { line }
            }
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Error {
        Error::Decode(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8 { ref err, .. } => Some(err),
            Error::Decode(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::BufferOverflow { max } => write!(
                f,
                "parse error: field too long, buffer full at its \
                 maximum size of {} bytes",
                max
            ),
            Error::UnescapedQuote { line, column } => write!(
                f,
                "parse error: unescaped \" character at line {}, column {}",
                line, column
            ),
            Error::NonTerminatedQuote { line } => write!(
                f,
                "parse error: non-terminated quoted field at line {}",
                line
            ),
            Error::Utf8 { line, ref err } => {
                write!(f, "parse error: line {}: {}", line, err)
            }
            Error::Decode(ref err) => write!(f, "decode error: {}", err),
        }
    }
}

/// A UTF-8 validation error that occurs when attempting to convert a
/// `ByteRecord` into a `StringRecord`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FromUtf8Error {
    record: ByteRecord,
    err: Utf8Error,
}

impl FromUtf8Error {
    pub(crate) fn new(record: ByteRecord, err: Utf8Error) -> FromUtf8Error {
        FromUtf8Error { record, err }
    }

    /// Access the underlying `ByteRecord` that failed UTF-8 validation.
    pub fn into_byte_record(self) -> ByteRecord {
        self.record
    }

    /// Access the underlying UTF-8 validation error.
    pub fn utf8_error(&self) -> &Utf8Error {
        &self.err
    }
}

impl fmt::Display for FromUtf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl error::Error for FromUtf8Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}

/// A UTF-8 validation error.
///
/// The error includes the index of the field that failed validation, and the
/// last byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The field index of a byte record in which UTF-8 validation failed.
    field: usize,
    /// The index into the given field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

impl Utf8Error {
    pub(crate) fn new(field: usize, valid_up_to: usize) -> Utf8Error {
        Utf8Error { field, valid_up_to }
    }

    /// The field index of a byte record in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the given field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8: invalid UTF-8 in field {} near byte index {}",
            self.field, self.valid_up_to
        )
    }
}

impl error::Error for Utf8Error {}

/// `IntoInnerError` occurs when consuming a `Writer` fails.
///
/// Consuming the `Writer` causes a flush to happen. If the flush fails, then
/// this error is returned, which contains both the original `Writer` and
/// the error that occurred.
///
/// The type parameter `W` is the unconsumed writer.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

impl<W> IntoInnerError<W> {
    pub(crate) fn new(wtr: W, err: io::Error) -> IntoInnerError<W> {
        IntoInnerError { wtr, err }
    }

    /// Returns the error which caused the call to `into_inner` to fail.
    ///
    /// This error was returned when attempting to flush the internal buffer.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Returns the underlying writer which generated the error.
    ///
    /// The returned value can be used for error recovery, such as
    /// re-inspecting the buffer.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> error::Error for IntoInnerError<W> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}
