use std::io;
use std::ops::Range;
use std::path::Path;
use std::str;

use dsv_core::{ScanResult, Scanner, ScannerBuilder};
use tracing::debug;

use crate::buffer::{Buffer, DEFAULT_CAPACITY, DEFAULT_MAX_SIZE};
use crate::byte_record::ByteRecord;
use crate::decode::{Decode, DecodeError, DecodeErrorKind, DecodeLine};
use crate::error::{Error, Result, Utf8Error};
use crate::source::Source;
use crate::string_record::StringRecord;

/// Builds a tokenizer with various configuration knobs.
///
/// This builder can be used to tweak the field separator, quoting rules,
/// comment marker, separator guessing and buffer sizes. Once a `Tokenizer`
/// is built, its configuration cannot be changed.
#[derive(Debug)]
pub struct TokenizerBuilder {
    builder: ScannerBuilder,
    capacity: usize,
    max: usize,
}

impl Default for TokenizerBuilder {
    fn default() -> TokenizerBuilder {
        TokenizerBuilder {
            builder: ScannerBuilder::new(),
            capacity: DEFAULT_CAPACITY,
            max: DEFAULT_MAX_SIZE,
        }
    }
}

impl TokenizerBuilder {
    /// Create a new builder for configuring tokenizers.
    ///
    /// To convert a builder into a tokenizer, call one of the methods
    /// starting with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use dsv::{Token, TokenizerBuilder};
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let data = "a;b\n# skipped\nc;d\n";
    ///     let mut tok = TokenizerBuilder::new()
    ///         .separator(b';')
    ///         .comment(Some(b'#'))
    ///         .from_reader(data.as_bytes());
    ///
    ///     let mut fields = vec![];
    ///     loop {
    ///         match tok.advance()? {
    ///             Token::Field { .. } => fields.push(tok.field_str()?.to_string()),
    ///             Token::Comment => {}
    ///             Token::End => break,
    ///         }
    ///     }
    ///     assert_eq!(fields, vec!["a", "b", "c", "d"]);
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// Build a tokenizer from this configuration that reads data from `rdr`.
    ///
    /// Note that the tokenizer is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Tokenizer<R> {
        Tokenizer {
            scanner: self.builder.build(),
            buf: Buffer::with_capacity(rdr, self.capacity, self.max),
            field: 0..0,
            field_index: 0,
            next_index: 0,
            failed: false,
        }
    }

    /// Build a tokenizer from this configuration that reads data from the
    /// given file path.
    ///
    /// Paths ending in `.gz` or `.bz2` are decompressed transparently when
    /// the `gzip` or `bzip2` feature, respectively, is enabled.
    ///
    /// If there was a problem opening the file, then this returns an error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Tokenizer<Source>> {
        Ok(self.from_reader(Source::open(path)?))
    }

    /// The field separator to use when parsing.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, sep: u8) -> &mut TokenizerBuilder {
        self.builder.separator(sep);
        self
    }

    /// Enable or disable quoting.
    ///
    /// This is enabled by default, but it may be disabled. When disabled,
    /// quotes are not treated specially.
    pub fn quoting(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.builder.quoting(yes);
        self
    }

    /// The quote character to use when parsing.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut TokenizerBuilder {
        self.builder.quote(quote);
        self
    }

    /// Keep stray quotes as literal content instead of failing.
    ///
    /// By default, a quote inside an unquoted field, or a lone quote inside
    /// a quoted field that is not followed by a separator or a line break,
    /// is reported as `Error::UnescapedQuote`.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.builder.lazy_quotes(yes);
        self
    }

    /// Strip leading and trailing whitespace from unquoted fields.
    pub fn trim(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.builder.trim(yes);
        self
    }

    /// The comment character to use when parsing.
    ///
    /// If the start of a record begins with the byte given here, then that
    /// line is ignored by the tokenizer and reported as `Token::Comment`.
    ///
    /// This is disabled by default.
    pub fn comment(&mut self, comment: Option<u8>) -> &mut TokenizerBuilder {
        self.builder.comment(comment);
        self
    }

    /// Guess the separator from the first chunk of input.
    ///
    /// The most frequent of `,` `;` `\t` `|` `:` wins. When none of them
    /// occurs, or on a tie, the configured separator is kept.
    pub fn guess(&mut self, yes: bool) -> &mut TokenizerBuilder {
        self.builder.guess(yes);
        self
    }

    /// The initial capacity of the lookahead buffer, in bytes.
    ///
    /// The default is 4 KiB.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut TokenizerBuilder {
        self.capacity = capacity;
        self
    }

    /// The size the lookahead buffer may grow to, in bytes.
    ///
    /// A field (including its quotes and terminator) or a comment line that
    /// does not fit in a buffer of this size fails with
    /// `Error::BufferOverflow`. The default is 64 KiB.
    pub fn max_buffer_size(&mut self, max: usize) -> &mut TokenizerBuilder {
        self.max = max;
        self
    }
}

/// What a call to `Tokenizer::advance` found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token {
    /// A field was scanned. It can be accessed with `Tokenizer::field` and
    /// friends until the next call to `advance`.
    Field {
        /// Whether this field is the last one of its record.
        record_end: bool,
    },
    /// A comment line was skipped.
    Comment,
    /// There is no more data.
    End,
}

/// A streaming tokenizer for delimited text.
///
/// The tokenizer reads from any `io::Read` and produces one field per call
/// to `advance`. The current field is borrowed from an internal buffer and
/// is only valid until the next call to `advance`; the borrow checker
/// enforces this. Use `field_to_vec` or read whole records into a
/// `ByteRecord` to keep data around.
///
/// Errors are fatal. Once `advance` has returned an error, every later call
/// returns `Token::End`.
///
/// # Example
///
/// ```
/// use dsv::{Token, Tokenizer};
///
/// let data = "c1,\"c\"\"2\",\"c\n3\",\"c,4\"";
/// let mut tok = Tokenizer::new(data.as_bytes());
///
/// let mut fields = vec![];
/// while let Token::Field { record_end } = tok.advance().unwrap() {
///     fields.push((tok.field_str().unwrap().to_string(), record_end));
/// }
/// assert_eq!(fields, vec![
///     ("c1".to_string(), false),
///     ("c\"2".to_string(), false),
///     ("c\n3".to_string(), false),
///     ("c,4".to_string(), true),
/// ]);
/// ```
#[derive(Debug)]
pub struct Tokenizer<R> {
    scanner: Scanner,
    buf: Buffer<R>,
    /// The location of the current field within the buffer.
    field: Range<usize>,
    /// The index of the current field within its record.
    field_index: u64,
    /// The index the next field will have.
    next_index: u64,
    failed: bool,
}

impl Tokenizer<Source> {
    /// Create a tokenizer with a default configuration for the file at the
    /// given path.
    ///
    /// See `TokenizerBuilder::from_path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Tokenizer<Source>> {
        TokenizerBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Tokenizer<R> {
    /// Create a tokenizer with a default configuration that reads from
    /// `rdr`.
    pub fn new(rdr: R) -> Tokenizer<R> {
        TokenizerBuilder::new().from_reader(rdr)
    }

    /// Scan the next field.
    ///
    /// Reads from the underlying reader only as much as is needed to find
    /// the end of the field.
    ///
    /// # Errors
    ///
    /// `Error::Io` if reading fails, `Error::BufferOverflow` if the field
    /// does not fit in the maximum buffer size, and
    /// `Error::UnescapedQuote` or `Error::NonTerminatedQuote` for malformed
    /// quoting. None of these can be recovered from.
    pub fn advance(&mut self) -> Result<Token> {
        if self.failed {
            return Ok(Token::End);
        }
        match self.scan() {
            Ok(token) => Ok(token),
            Err(err) => {
                debug!("tokenizer stopped: {}", err);
                self.failed = true;
                self.field = 0..0;
                Err(err)
            }
        }
    }

    fn scan(&mut self) -> Result<Token> {
        self.field = 0..0;
        loop {
            let guessing = self.scanner.is_guessing();
            let start = self.buf.position();
            let at_eof = self.buf.is_eof();
            let res = self.scanner.scan(self.buf.unread_mut(), at_eof)?;
            if guessing && !self.scanner.is_guessing() {
                debug!(
                    "using separator {:?}",
                    char::from(self.scanner.separator())
                );
            }
            match res {
                ScanResult::InputEmpty => {
                    let want = self.buf.len() + 1;
                    self.buf.ensure(want)?;
                }
                ScanResult::Field { range, consumed, record_end } => {
                    self.field = start + range.start..start + range.end;
                    self.buf.consume(consumed);
                    self.field_index = self.next_index;
                    self.next_index =
                        if record_end { 0 } else { self.next_index + 1 };
                    return Ok(Token::Field { record_end });
                }
                ScanResult::Comment { consumed } => {
                    self.buf.consume(consumed);
                    return Ok(Token::Comment);
                }
                ScanResult::End => return Ok(Token::End),
            }
        }
    }

    /// The current field, without copying.
    ///
    /// This is empty when no field has been scanned, or after `advance`
    /// returned anything other than a field.
    pub fn field(&self) -> &[u8] {
        &self.buf.as_slice()[self.field.clone()]
    }

    /// An owned copy of the current field.
    pub fn field_to_vec(&self) -> Vec<u8> {
        self.field().to_vec()
    }

    /// The current field as a string.
    ///
    /// # Errors
    ///
    /// `Error::Utf8` if the field is not valid UTF-8.
    pub fn field_str(&self) -> Result<&str> {
        str::from_utf8(self.field()).map_err(|err| Error::Utf8 {
            line: self.line(),
            err: Utf8Error::new(self.field_index as usize, err.valid_up_to()),
        })
    }

    /// Returns true when the current field is the last one of its record.
    pub fn end_of_record(&self) -> bool {
        self.scanner.end_of_record()
    }

    /// Returns true when the current field is the whole content of an
    /// otherwise empty line, or when a comment line was just skipped.
    pub fn empty_line(&self) -> bool {
        self.scanner.empty_line()
    }

    /// The current line number, starting at 1.
    ///
    /// Every `\n` consumed so far counts, including those inside quoted
    /// fields.
    pub fn line(&self) -> u64 {
        self.scanner.line()
    }

    /// The separator in use, which may have been guessed.
    pub fn separator(&self) -> u8 {
        self.scanner.separator()
    }

    /// Decode the current field into a value of type `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use dsv::Tokenizer;
    ///
    /// let mut tok = Tokenizer::new("42,true".as_bytes());
    /// tok.advance().unwrap();
    /// assert_eq!(tok.decode::<u16>().unwrap(), 42);
    /// tok.advance().unwrap();
    /// assert_eq!(tok.decode::<bool>().unwrap(), true);
    /// ```
    pub fn decode<T: Decode>(&self) -> Result<T> {
        T::decode(self.field())
            .map_err(|err| Error::Decode(err.at_field(self.field_index)))
    }

    /// Scan the next field and decode it into a value of type `T`.
    ///
    /// Comment lines are skipped. `None` is returned at the end of the
    /// data.
    pub fn scan_value<T: Decode>(&mut self) -> Result<Option<T>> {
        loop {
            match self.advance()? {
                Token::Field { .. } => return self.decode().map(Some),
                Token::Comment => continue,
                Token::End => return Ok(None),
            }
        }
    }

    /// Scan the next record and decode each of its fields into the
    /// corresponding element of the tuple `T`.
    ///
    /// Comment lines and empty lines are skipped. `None` is returned at the
    /// end of the data.
    ///
    /// # Errors
    ///
    /// Besides tokenizing errors, this fails with a `DecodeError` of kind
    /// `FieldCount` when the record does not have exactly as many fields as
    /// `T` has elements, or when one of the fields cannot be decoded.
    ///
    /// # Example
    ///
    /// ```
    /// use dsv::Tokenizer;
    ///
    /// let mut tok = Tokenizer::new("x,1\n\ny,2\n".as_bytes());
    /// let mut got = vec![];
    /// while let Some((name, n)) = tok.scan_line::<(String, u8)>().unwrap() {
    ///     got.push((name, n));
    /// }
    /// assert_eq!(got, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
    /// ```
    pub fn scan_line<T: DecodeLine>(&mut self) -> Result<Option<T>> {
        let mut record = ByteRecord::new();
        if !self.read_byte_record(&mut record)? {
            return Ok(None);
        }
        let got = record.len() as u64;
        if got != T::FIELDS {
            let kind = DecodeErrorKind::FieldCount { expected: T::FIELDS, got };
            return Err(Error::Decode(DecodeError::new(kind)));
        }
        T::decode_fields(record.iter()).map(Some).map_err(Error::Decode)
    }

    /// Read a single record into the given byte record.
    ///
    /// Comment lines and empty lines are skipped. Returns false when there
    /// are no more records, in which case the record is left empty.
    ///
    /// Reusing the same record for every call avoids an allocation per
    /// record.
    pub fn read_byte_record(&mut self, record: &mut ByteRecord) -> Result<bool> {
        record.clear();
        loop {
            match self.advance()? {
                Token::Field { record_end } => {
                    if record_end && record.is_empty() && self.empty_line() {
                        continue;
                    }
                    record.push_field(self.field());
                    if record_end {
                        return Ok(true);
                    }
                }
                Token::Comment => continue,
                Token::End => return Ok(!record.is_empty()),
            }
        }
    }

    /// Read a single record into the given string record.
    ///
    /// This behaves like `read_byte_record`, but fails with `Error::Utf8`
    /// if the record is not valid UTF-8. The record is left empty in that
    /// case.
    pub fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        let more = match self.read_byte_record(record.as_byte_record_mut()) {
            Ok(more) => more,
            Err(err) => {
                record.clear();
                return Err(err);
            }
        };
        if let Err(err) = record.as_byte_record().validate() {
            record.clear();
            return Err(Error::Utf8 { line: self.line(), err });
        }
        Ok(more)
    }

    /// Returns a borrowed iterator over all records as byte records.
    ///
    /// Each item yielded by this iterator is a `Result<ByteRecord, Error>`.
    pub fn byte_records(&mut self) -> ByteRecordsIter<R> {
        ByteRecordsIter { tok: self }
    }

    /// Returns a borrowed iterator over all records as string records.
    ///
    /// Each item yielded by this iterator is a `Result<StringRecord, Error>`.
    ///
    /// # Example
    ///
    /// ```
    /// use dsv::Tokenizer;
    ///
    /// let data = "city\tpop\nBoston\t4628910\n";
    /// let mut tok = Tokenizer::new(data.as_bytes());
    /// let cities: Vec<String> = tok
    ///     .records()
    ///     .map(|rec| rec.unwrap()[0].to_string())
    ///     .collect();
    /// assert_eq!(cities, vec!["city\tpop", "Boston\t4628910"]);
    /// ```
    pub fn records(&mut self) -> StringRecordsIter<R> {
        StringRecordsIter { tok: self }
    }

    /// Read the next record and decode it into `D` with serde.
    ///
    /// Fields are matched to `D` by position. Comment lines and empty lines
    /// are skipped. `None` is returned at the end of the data.
    ///
    /// # Example
    ///
    /// ```
    /// # #[cfg(feature = "serde")] {
    /// use dsv::Tokenizer;
    ///
    /// let mut tok = Tokenizer::new("Boston,MA,4628910\n".as_bytes());
    /// let row: (String, String, Option<u64>) = tok.deserialize().unwrap().unwrap();
    /// assert_eq!(row.2, Some(4628910));
    /// assert!(tok.deserialize::<(String, String, u64)>().unwrap().is_none());
    /// # }
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<D>(&mut self) -> Result<Option<D>>
    where
        D: serde::de::DeserializeOwned,
    {
        let mut record = StringRecord::new();
        if !self.read_record(&mut record)? {
            return Ok(None);
        }
        crate::deserializer::deserialize_string_record(&record)
            .map(Some)
            .map_err(Error::Decode)
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.buf.get_ref()
    }

    /// Returns a mutable reference to the underlying reader.
    ///
    /// Reading from it directly skips over data the tokenizer has buffered.
    pub fn get_mut(&mut self) -> &mut R {
        self.buf.get_mut()
    }

    /// Unwraps this tokenizer, returning the underlying reader.
    ///
    /// Note that any leftover data inside this tokenizer's internal buffer
    /// is lost.
    pub fn into_inner(self) -> R {
        self.buf.into_inner()
    }
}

/// A borrowed iterator over byte records.
///
/// The lifetime parameter `'t` refers to the lifetime of the underlying
/// tokenizer.
pub struct ByteRecordsIter<'t, R: 't> {
    tok: &'t mut Tokenizer<R>,
}

impl<'t, R: io::Read> Iterator for ByteRecordsIter<'t, R> {
    type Item = Result<ByteRecord>;

    fn next(&mut self) -> Option<Result<ByteRecord>> {
        let mut record = ByteRecord::new();
        match self.tok.read_byte_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// A borrowed iterator over string records.
///
/// The lifetime parameter `'t` refers to the lifetime of the underlying
/// tokenizer.
pub struct StringRecordsIter<'t, R: 't> {
    tok: &'t mut Tokenizer<R>,
}

impl<'t, R: io::Read> Iterator for StringRecordsIter<'t, R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        let mut record = StringRecord::new();
        match self.tok.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::byte_record::ByteRecord;
    use crate::decode::DecodeErrorKind;
    use crate::error::Error;

    use super::{Token, Tokenizer, TokenizerBuilder};

    /// Collect every field of `tok`, as strings, grouped by record.
    fn records<R: io::Read>(tok: &mut Tokenizer<R>) -> Vec<Vec<String>> {
        let mut rec = ByteRecord::new();
        let mut out = vec![];
        while tok.read_byte_record(&mut rec).unwrap() {
            out.push(
                rec.iter()
                    .map(|f| String::from_utf8(f.to_vec()).unwrap())
                    .collect(),
            );
        }
        out
    }

    /// A reader that returns one byte at a time, to exercise buffer refills
    /// in the middle of every field.
    struct OneByte<'a>(&'a [u8]);

    impl<'a> io::Read for OneByte<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    macro_rules! tokenizes_to {
        ($name:ident, $data:expr, $expected:expr) => {
            tokenizes_to!($name, $data, $expected, |_: &mut TokenizerBuilder| {});
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let expected: Vec<Vec<String>> = $expected
                    .iter()
                    .map(|r: &Vec<&str>| {
                        r.iter().map(|f| f.to_string()).collect()
                    })
                    .collect();

                let mut builder = TokenizerBuilder::new();
                $config(&mut builder);

                let mut tok = builder.from_reader($data.as_bytes());
                assert_eq!(records(&mut tok), expected, "whole reader");

                let mut tok = builder
                    .buffer_capacity(1)
                    .from_reader(OneByte($data.as_bytes()));
                assert_eq!(records(&mut tok), expected, "one byte reader");
            }
        };
    }

    tokenizes_to!(one_record, "a,b,c", vec![vec!["a", "b", "c"]]);
    tokenizes_to!(last_empty, "a,b,", vec![vec!["a", "b", ""]]);
    tokenizes_to!(
        two_records,
        "a,b\nc,d\n",
        vec![vec!["a", "b"], vec!["c", "d"]]
    );
    tokenizes_to!(
        empty_lines_skipped,
        "\na,b\n\n\nc\n\n",
        vec![vec!["a", "b"], vec!["c"]]
    );
    tokenizes_to!(
        crlf,
        "a,b\r\nc,d\r\n",
        vec![vec!["a", "b"], vec!["c", "d"]]
    );
    tokenizes_to!(
        quoted,
        "c1,\"c\"\"2\",\"c\n3\",\"c,4\"",
        vec![vec!["c1", "c\"2", "c\n3", "c,4"]]
    );
    tokenizes_to!(
        quoted_empty_field_is_a_record,
        "\"\"\na\n",
        vec![vec![""], vec!["a"]]
    );
    tokenizes_to!(
        comments,
        "#a,b\nc,d\n#e",
        vec![vec!["c", "d"]],
        |b: &mut TokenizerBuilder| {
            b.comment(Some(b'#'));
        }
    );
    tokenizes_to!(
        tabs,
        "a\tb\nc\td",
        vec![vec!["a", "b"], vec!["c", "d"]],
        |b: &mut TokenizerBuilder| {
            b.separator(b'\t');
        }
    );
    tokenizes_to!(
        trimmed,
        " a , b \n",
        vec![vec!["a", "b"]],
        |b: &mut TokenizerBuilder| {
            b.trim(true);
        }
    );
    tokenizes_to!(
        lazy,
        "a \"word\",\"b\"\n",
        vec![vec!["a \"word\"", "b"]],
        |b: &mut TokenizerBuilder| {
            b.lazy_quotes(true);
        }
    );

    #[test]
    fn guessed_separator() {
        let mut tok = TokenizerBuilder::new()
            .guess(true)
            .from_reader("a,b;c\td:e|f;g".as_bytes());
        assert_eq!(
            records(&mut tok),
            vec![vec!["a,b".to_string(), "c\td:e|f".into(), "g".into()]]
        );
        assert_eq!(tok.separator(), b';');
    }

    #[test]
    fn advance_reports_tokens() {
        let mut tok = TokenizerBuilder::new()
            .comment(Some(b'#'))
            .from_reader("a,b\n#x\n\n".as_bytes());

        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: false });
        assert_eq!(tok.field(), b"a");
        assert!(!tok.end_of_record());
        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: true });
        assert_eq!(tok.field_to_vec(), b"b".to_vec());
        assert!(tok.end_of_record());
        assert!(!tok.empty_line());
        assert_eq!(tok.line(), 2);

        assert_eq!(tok.advance().unwrap(), Token::Comment);
        assert_eq!(tok.field(), b"");
        assert!(tok.empty_line());

        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: true });
        assert!(tok.empty_line());
        assert_eq!(tok.line(), 4);

        assert_eq!(tok.advance().unwrap(), Token::End);
        assert_eq!(tok.advance().unwrap(), Token::End);
    }

    #[test]
    fn end_after_error() {
        let mut tok = Tokenizer::new("a,\"b\n".as_bytes());
        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: false });
        match tok.advance() {
            Err(Error::NonTerminatedQuote { line: 1 }) => {}
            res => panic!("expected non-terminated quote, got {:?}", res),
        }
        assert_eq!(tok.advance().unwrap(), Token::End);
        assert_eq!(tok.field(), b"");
    }

    #[test]
    fn strict_quote_in_unquoted_field() {
        let mut tok = Tokenizer::new("a \"word\",\"b\"\n".as_bytes());
        match tok.advance() {
            Err(Error::UnescapedQuote { line: 1, column: 3 }) => {}
            res => panic!("expected unescaped quote, got {:?}", res),
        }
    }

    #[test]
    fn overflow() {
        let data = "x".repeat(100);
        let mut tok = TokenizerBuilder::new()
            .buffer_capacity(8)
            .max_buffer_size(32)
            .from_reader(data.as_bytes());
        match tok.advance() {
            Err(Error::BufferOverflow { max: 32 }) => {}
            res => panic!("expected overflow, got {:?}", res),
        }
        assert_eq!(tok.advance().unwrap(), Token::End);
    }

    #[test]
    fn field_of_max_size_at_eof() {
        let data = "x".repeat(32);
        let mut tok = TokenizerBuilder::new()
            .buffer_capacity(8)
            .max_buffer_size(32)
            .from_reader(data.as_bytes());
        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: true });
        assert_eq!(tok.field(), data.as_bytes());
        assert_eq!(tok.advance().unwrap(), Token::End);

        let data = format!("{}\n", "x".repeat(31));
        let mut tok = TokenizerBuilder::new()
            .buffer_capacity(8)
            .max_buffer_size(32)
            .from_reader(data.as_bytes());
        assert_eq!(tok.advance().unwrap(), Token::Field { record_end: true });
        assert_eq!(tok.field().len(), 31);
    }

    #[test]
    fn long_fields_within_max() {
        let field = "y".repeat(2000);
        let data = format!("{},{}\n", field, field);
        let mut tok = TokenizerBuilder::new()
            .buffer_capacity(16)
            .from_reader(data.as_bytes());
        assert_eq!(records(&mut tok), vec![vec![field.clone(), field]]);
    }

    #[test]
    fn field_str_utf8_error() {
        let mut tok = Tokenizer::new(&b"ok,b\xFFd"[..]);
        tok.advance().unwrap();
        assert_eq!(tok.field_str().unwrap(), "ok");
        tok.advance().unwrap();
        match tok.field_str() {
            Err(Error::Utf8 { line: 1, ref err }) => {
                assert_eq!(err.field(), 1);
                assert_eq!(err.valid_up_to(), 1);
            }
            res => panic!("expected UTF-8 error, got {:?}", res),
        }
    }

    #[test]
    fn decode_errors_name_the_field() {
        let mut tok = Tokenizer::new("1,x\n".as_bytes());
        assert_eq!(tok.scan_value::<i32>().unwrap(), Some(1));
        match tok.scan_value::<i32>() {
            Err(Error::Decode(ref err)) => assert_eq!(err.field(), Some(1)),
            res => panic!("expected decode error, got {:?}", res),
        }
        assert_eq!(tok.scan_value::<i32>().unwrap(), None);
    }

    #[test]
    fn scan_values_across_records() {
        let mut tok = TokenizerBuilder::new()
            .comment(Some(b'#'))
            .from_reader("1,2\n#3\n4".as_bytes());
        let mut got = vec![];
        while let Some(n) = tok.scan_value::<u8>().unwrap() {
            got.push(n);
        }
        assert_eq!(got, vec![1, 2, 4]);
    }

    #[test]
    fn scan_line_field_count() {
        let mut tok = Tokenizer::new("a,1\nb,2,3\n".as_bytes());
        assert_eq!(
            tok.scan_line::<(String, u8)>().unwrap(),
            Some(("a".to_string(), 1))
        );
        match tok.scan_line::<(String, u8)>() {
            Err(Error::Decode(ref err)) => assert_eq!(
                *err.kind(),
                DecodeErrorKind::FieldCount { expected: 2, got: 3 }
            ),
            res => panic!("expected field count error, got {:?}", res),
        }
        assert_eq!(tok.scan_line::<(String, u8)>().unwrap(), None);
    }

    #[test]
    fn scan_line_skips_unit_fields() {
        let mut tok = Tokenizer::new("x,ignored,1\ny,,2\n".as_bytes());
        let mut got = vec![];
        while let Some((name, (), n)) =
            tok.scan_line::<(String, (), u8)>().unwrap()
        {
            got.push((name, n));
        }
        assert_eq!(got, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
    }

    #[test]
    fn record_iterators() {
        let mut tok = Tokenizer::new("a,b\nc\n".as_bytes());
        let recs: Vec<ByteRecord> =
            tok.byte_records().collect::<Result<_, _>>().unwrap();
        assert_eq!(recs, vec![
            ByteRecord::from(vec!["a", "b"]),
            ByteRecord::from(vec!["c"]),
        ]);

        let mut tok = Tokenizer::new(&b"a\n\xFF\nb\n"[..]);
        let mut it = tok.records();
        assert_eq!(&it.next().unwrap().unwrap()[0], "a");
        match it.next() {
            Some(Err(Error::Utf8 { line: 3, .. })) => {}
            res => panic!("expected UTF-8 error, got {:?}", res),
        }
        assert_eq!(&it.next().unwrap().unwrap()[0], "b");
        assert!(it.next().is_none());
    }

    #[test]
    fn into_inner_returns_reader() {
        let data = b"a,b";
        let tok = Tokenizer::new(&data[..]);
        assert_eq!(tok.get_ref().len(), 3);
        assert_eq!(tok.into_inner(), &data[..]);
    }
}
