use std::error;
use std::fmt;
use std::num;
use std::result;
use std::str;

/// A type that can be decoded from the raw bytes of a single field.
///
/// This is implemented for strings, byte vectors, `char`, `bool`, all
/// integer and floating point types, `Option<T>` where `T: Decode` (an
/// empty field decodes to `None`), and `()`, which accepts any field and
/// is handy for skipping a column in `Tokenizer::scan_line`.
///
/// Implement it for your own types to use them with
/// `Tokenizer::decode` and `Tokenizer::scan_value`.
///
/// # Example
///
/// ```
/// use dsv::{Decode, DecodeError};
///
/// struct Celsius(f64);
///
/// impl Decode for Celsius {
///     fn decode(field: &[u8]) -> Result<Celsius, DecodeError> {
///         let field = field.strip_suffix(b"C").unwrap_or(field);
///         f64::decode(field).map(Celsius)
///     }
/// }
///
/// assert_eq!(Celsius::decode(b"21.5C").unwrap().0, 21.5);
/// ```
pub trait Decode: Sized {
    /// Decode a value from the contents of a field.
    fn decode(field: &[u8]) -> result::Result<Self, DecodeError>;
}

/// An error that occurs when decoding a field, or a record of fields, into
/// a typed value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeError {
    field: Option<u64>,
    kind: DecodeErrorKind,
}

/// The kind of a decoding error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeErrorKind {
    /// A general error message.
    Message(String),
    /// The destination type cannot be decoded from delimited data, such as
    /// a map or an enum variant carrying data.
    UnsupportedType(String),
    /// The record ended before all values were decoded.
    UnexpectedEndOfRecord,
    /// The record does not have the number of fields the destination
    /// expects.
    FieldCount {
        /// The number of fields expected.
        expected: u64,
        /// The number of fields found.
        got: u64,
    },
    /// The field is not one of the recognized boolean spellings. The
    /// offending text is included.
    ParseBool(String),
    /// The field is not a valid integer.
    ParseInt(num::ParseIntError),
    /// The field is not a valid floating point number.
    ParseFloat(num::ParseFloatError),
    /// The field is not valid UTF-8.
    Utf8(str::Utf8Error),
}

impl DecodeError {
    /// Create an error of the given kind, not yet attached to a field.
    pub fn new(kind: DecodeErrorKind) -> DecodeError {
        DecodeError { field: None, kind }
    }

    /// Return the field index (starting at 0) of this error, if available.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// Return the underlying error kind.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Attach a field index to this error, unless it already has one.
    pub(crate) fn at_field(mut self, field: u64) -> DecodeError {
        if self.field.is_none() {
            self.field = Some(field);
        }
        self
    }
}

impl error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind {
            DecodeErrorKind::ParseInt(ref err) => Some(err),
            DecodeErrorKind::ParseFloat(ref err) => Some(err),
            DecodeErrorKind::Utf8(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(field) = self.field {
            write!(f, "field {}: {}", field, self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::DecodeErrorKind::*;

        match *self {
            Message(ref msg) => write!(f, "{}", msg),
            UnsupportedType(ref which) => {
                write!(f, "unsupported type: {}", which)
            }
            UnexpectedEndOfRecord => {
                write!(f, "expected field, but got end of record")
            }
            FieldCount { expected, got } => write!(
                f,
                "unexpected number of fields: want {}, got {}",
                expected, got
            ),
            ParseBool(ref s) => write!(f, "invalid boolean: {:?}", s),
            ParseInt(ref err) => err.fmt(f),
            ParseFloat(ref err) => err.fmt(f),
            Utf8(ref err) => err.fmt(f),
        }
    }
}

/// Parse a boolean the way common delimited data spells it.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn as_str(field: &[u8]) -> result::Result<&str, DecodeError> {
    str::from_utf8(field)
        .map_err(|err| DecodeError::new(DecodeErrorKind::Utf8(err)))
}

impl Decode for String {
    fn decode(field: &[u8]) -> result::Result<String, DecodeError> {
        as_str(field).map(|s| s.to_string())
    }
}

impl Decode for Vec<u8> {
    fn decode(field: &[u8]) -> result::Result<Vec<u8>, DecodeError> {
        Ok(field.to_vec())
    }
}

impl Decode for char {
    fn decode(field: &[u8]) -> result::Result<char, DecodeError> {
        let s = as_str(field)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DecodeError::new(DecodeErrorKind::Message(format!(
                "expected single character but got {} characters in '{}'",
                s.chars().count(),
                s
            )))),
        }
    }
}

impl Decode for bool {
    fn decode(field: &[u8]) -> result::Result<bool, DecodeError> {
        let s = as_str(field)?;
        parse_bool(s).ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::ParseBool(s.to_string()))
        })
    }
}

/// Accepts any field and discards it, to skip a column.
impl Decode for () {
    fn decode(_: &[u8]) -> result::Result<(), DecodeError> {
        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(field: &[u8]) -> result::Result<Option<T>, DecodeError> {
        if field.is_empty() {
            Ok(None)
        } else {
            T::decode(field).map(Some)
        }
    }
}

macro_rules! decode_int {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn decode(field: &[u8]) -> result::Result<$ty, DecodeError> {
                    as_str(field)?.parse().map_err(|err| {
                        DecodeError::new(DecodeErrorKind::ParseInt(err))
                    })
                }
            }
        )*
    }
}

macro_rules! decode_float {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn decode(field: &[u8]) -> result::Result<$ty, DecodeError> {
                    as_str(field)?.parse().map_err(|err| {
                        DecodeError::new(DecodeErrorKind::ParseFloat(err))
                    })
                }
            }
        )*
    }
}

decode_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
decode_float!(f32, f64);

/// A type that can be decoded from all of the fields of one record.
///
/// This is implemented for tuples of up to eight `Decode` types. Each
/// element takes one field, and the record must have exactly as many fields
/// as the tuple has elements. See `Tokenizer::scan_line`.
pub trait DecodeLine: Sized {
    /// The number of fields a record must have.
    const FIELDS: u64;

    /// Decode one value per field from `fields`, which yields exactly
    /// `FIELDS` items.
    #[doc(hidden)]
    fn decode_fields<'a, I>(fields: I) -> result::Result<Self, DecodeError>
    where
        I: Iterator<Item = &'a [u8]>;
}

macro_rules! count {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! decode_line_tuple {
    ($($name:ident)+) => {
        impl<$($name: Decode),+> DecodeLine for ($($name,)+) {
            const FIELDS: u64 = count!($($name)+);

            #[allow(unused_assignments)]
            fn decode_fields<'a, I>(
                mut fields: I,
            ) -> result::Result<Self, DecodeError>
            where
                I: Iterator<Item = &'a [u8]>,
            {
                let mut index = 0u64;
                Ok(($({
                    let field = fields.next().ok_or_else(|| {
                        DecodeError::new(
                            DecodeErrorKind::UnexpectedEndOfRecord,
                        )
                    })?;
                    let value =
                        $name::decode(field).map_err(|e| e.at_field(index))?;
                    index += 1;
                    value
                },)+))
            }
        }
    }
}

decode_line_tuple!(A);
decode_line_tuple!(A B);
decode_line_tuple!(A B C);
decode_line_tuple!(A B C D);
decode_line_tuple!(A B C D E);
decode_line_tuple!(A B C D E F);
decode_line_tuple!(A B C D E F G);
decode_line_tuple!(A B C D E F G H);
