use core::cmp;
use core::fmt;
use core::ops::Range;

use memchr::{memchr, memchr2, memchr3};

use crate::guess::guess_separator;
use crate::trim::trim_range;

/// Builds a field scanner with various configuration knobs.
///
/// This builder can be used to tweak the separator, quoting rules, comment
/// marker and more. Once a `Scanner` is built, its configuration cannot be
/// changed.
#[derive(Clone, Debug, Default)]
pub struct ScannerBuilder {
    scanner: Scanner,
}

impl ScannerBuilder {
    /// Create a new builder.
    pub fn new() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Build a scanner from this configuration.
    pub fn build(&self) -> Scanner {
        let mut scanner = self.scanner.clone();
        scanner.reset();
        scanner
    }

    /// The field separator to use when scanning.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, sep: u8) -> &mut ScannerBuilder {
        self.scanner.sep = sep;
        self
    }

    /// Whether fields may be enclosed in quotes.
    ///
    /// When enabled (the default), a field starting with the quote byte may
    /// contain separators, newlines and doubled quotes. When disabled, quote
    /// bytes have no special meaning at all.
    pub fn quoting(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.quoting = yes;
        self
    }

    /// The quote byte.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ScannerBuilder {
        self.scanner.quote = quote;
        self
    }

    /// Tolerate quote bytes that are not properly escaped.
    ///
    /// When disabled (the default), a quote inside an unquoted field, or a
    /// quote inside a quoted field that is neither doubled nor followed by a
    /// separator or line break, is reported as `ScanError::UnescapedQuote`.
    /// When enabled, such quotes are kept as literal field content.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.lazy = yes;
        self
    }

    /// Strip leading and trailing whitespace from unquoted fields.
    ///
    /// Quoted fields are never trimmed. This is disabled by default.
    pub fn trim(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.trim = yes;
        self
    }

    /// The byte marking the start of a line comment.
    ///
    /// A line whose first byte equals the marker is skipped entirely and
    /// reported as `ScanResult::Comment`. Disabled (`None`) by default.
    pub fn comment(&mut self, comment: Option<u8>) -> &mut ScannerBuilder {
        self.scanner.comment = comment;
        self
    }

    /// Guess the separator from the first chunk of input.
    ///
    /// See `guess_separator` for how the guess is made. When no separator
    /// wins, the configured one is kept. This is disabled by default.
    pub fn guess(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.guess_init = yes;
        self
    }
}

/// The result of scanning at most one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScanResult {
    /// The input was exhausted before a field boundary could be found.
    ///
    /// The caller should retry with the same unconsumed bytes followed by
    /// more input, or with `at_eof` set if there is no more input.
    InputEmpty,
    /// A field was found.
    Field {
        /// The location of the field's content within the input.
        ///
        /// For quoted fields, the surrounding quotes are excluded and doubled
        /// quotes have already been collapsed in place.
        range: Range<usize>,
        /// The number of input bytes the caller must consume, including the
        /// terminating separator or line break.
        consumed: usize,
        /// Whether this field is the last one in its record.
        record_end: bool,
    },
    /// A comment line was skipped. No field was produced.
    Comment {
        /// The number of input bytes the caller must consume.
        consumed: usize,
    },
    /// All data has been scanned.
    ///
    /// This is only returned when the input is empty and `at_eof` is set.
    End,
}

/// An error that occurs while scanning malformed quoted data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanError {
    /// A quote byte was found where it is not allowed.
    UnescapedQuote {
        /// The line on which the quote appears.
        line: u64,
        /// The 1-based byte column of the quote on its line.
        column: u64,
    },
    /// The input ended inside a quoted field.
    NonTerminatedQuote {
        /// The line on which the quoted field started.
        line: u64,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScanError::UnescapedQuote { line, column } => write!(
                f,
                "unescaped quote at line {}, column {}",
                line, column
            ),
            ScanError::NonTerminatedQuote { line } => {
                write!(f, "non-terminated quoted field at line {}", line)
            }
        }
    }
}

/// A pull based field scanner for delimited text.
///
/// The scanner finds one field at a time in a caller provided buffer of
/// input. It never allocates and never reads on its own: when a field
/// boundary cannot be decided with the bytes given, it asks for more with
/// `ScanResult::InputEmpty` and the caller retries with a longer buffer.
/// The caller must keep the unconsumed bytes around for the retry. The
/// scanner remembers how far it got, so bytes already examined are not
/// examined again.
///
/// The format understood is RFC 4180 generalized to any single byte
/// separator:
///
/// * Records end with `\n` or `\r\n`.
/// * A field starting with a quote may contain separators, line breaks and
///   doubled quotes (`""`), which stand for a single quote.
/// * A final record need not end with a line break.
///
/// And, optionally, line comments, lazy quotes, whitespace trimming of
/// unquoted fields and separator guessing. See `ScannerBuilder`.
#[derive(Clone, Debug)]
pub struct Scanner {
    /// The byte separating fields.
    sep: u8,
    /// The quotation byte.
    quote: u8,
    /// Whether quoted fields are recognized.
    quoting: bool,
    /// Whether stray quotes are tolerated.
    lazy: bool,
    /// Whether unquoted fields are trimmed.
    trim: bool,
    /// The line comment marker, if any.
    comment: Option<u8>,
    /// Whether to guess the separator, as configured.
    guess_init: bool,
    /// Whether the separator is still to be guessed.
    guess: bool,
    /// Whether the last field ended its record. Initially true, which marks
    /// the start of the first record.
    eor: bool,
    /// Whether the current line is empty or a comment.
    empty: bool,
    /// The current line number.
    line: u64,
    /// The number of bytes consumed on the current line.
    column: u64,
    /// How many bytes of the pending field were examined before the last
    /// `InputEmpty`. Zero when no field is pending.
    resume: usize,
    /// The state of a pending quoted field.
    pending: QuotedField,
}

impl Default for Scanner {
    fn default() -> Scanner {
        Scanner {
            sep: b',',
            quote: b'"',
            quoting: true,
            lazy: false,
            trim: false,
            comment: None,
            guess_init: false,
            guess: false,
            eor: true,
            empty: false,
            line: 1,
            column: 0,
            resume: 0,
            pending: QuotedField::new(),
        }
    }
}

impl Scanner {
    /// Create a new scanner with a default configuration.
    pub fn new() -> Scanner {
        ScannerBuilder::new().build()
    }

    /// Reset the scanner such that it behaves as if it had never been used.
    ///
    /// A guessed separator is kept, but guessing is armed again if it was
    /// configured.
    pub fn reset(&mut self) {
        self.guess = self.guess_init;
        self.eor = true;
        self.empty = false;
        self.line = 1;
        self.column = 0;
        self.resume = 0;
        self.pending = QuotedField::new();
    }

    /// Return the current line number as measured by the number of `\n`
    /// bytes consumed so far, plus one.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Return the separator in use, which may have been guessed.
    pub fn separator(&self) -> u8 {
        self.sep
    }

    /// Returns true if the separator has yet to be guessed.
    pub fn is_guessing(&self) -> bool {
        self.guess
    }

    /// Returns true when the most recent field was terminated by a line
    /// break or by the end of input, rather than by a separator.
    pub fn end_of_record(&self) -> bool {
        self.eor
    }

    /// Returns true when the most recent field was the only content of its
    /// line and empty, or when a comment line was just skipped.
    pub fn empty_line(&self) -> bool {
        self.empty && self.eor
    }

    /// Scan at most one field from `input`.
    ///
    /// `input` must start at the first byte not yet consumed. After
    /// `InputEmpty`, the next call must be given those same bytes again,
    /// possibly followed by more. `at_eof` tells the scanner that no input
    /// will ever follow `input`. On success, the
    /// caller must consume the number of bytes reported by the result before
    /// the next call.
    ///
    /// `input` is mutable because escaped quotes are collapsed in place. Only
    /// bytes of the returned field are ever modified.
    ///
    /// # Errors
    ///
    /// Malformed quoting is reported as a `ScanError`. The scanner does not
    /// attempt to recover, and callers should stop scanning.
    pub fn scan(
        &mut self,
        input: &mut [u8],
        at_eof: bool,
    ) -> Result<ScanResult, ScanError> {
        if input.is_empty() {
            if !at_eof {
                return Ok(ScanResult::InputEmpty);
            }
            if self.eor {
                return Ok(ScanResult::End);
            }
            // The previous field ended with a separator, so there is one
            // more (empty) field before the end.
            self.eor = true;
            self.empty = false;
            return Ok(ScanResult::Field {
                range: 0..0,
                consumed: 0,
                record_end: true,
            });
        }
        if self.guess {
            self.guess = false;
            if let Some(sep) = guess_separator(input) {
                self.sep = sep;
            }
        }
        let res = if self.quoting && input[0] == self.quote {
            self.scan_quoted(input, at_eof)
        } else if self.eor && self.comment == Some(input[0]) {
            Ok(self.scan_comment(input, at_eof))
        } else {
            self.scan_unquoted(input, at_eof)
        };
        match res {
            Ok(ScanResult::InputEmpty) => {}
            _ => self.resume = 0,
        }
        res
    }

    /// Where to continue searching a field that was cut short by the end of
    /// the input on the previous call.
    fn resume_at(&self, input: &[u8]) -> usize {
        cmp::min(self.resume, input.len())
    }

    fn scan_comment(&mut self, input: &[u8], at_eof: bool) -> ScanResult {
        let from = self.resume_at(input);
        let consumed = match memchr(b'\n', &input[from..]) {
            Some(i) => {
                let i = from + i;
                self.line += 1;
                self.column = 0;
                i + 1
            }
            None if at_eof => {
                self.column += input.len() as u64;
                input.len()
            }
            None => {
                self.resume = input.len();
                return ScanResult::InputEmpty;
            }
        };
        self.empty = true;
        self.eor = true;
        ScanResult::Comment { consumed }
    }

    fn scan_unquoted(
        &mut self,
        input: &[u8],
        at_eof: bool,
    ) -> Result<ScanResult, ScanError> {
        let start_of_record = self.eor;
        let from = self.resume_at(input);
        let rest = &input[from..];
        let found = if self.quoting && !self.lazy {
            memchr3(self.sep, b'\n', self.quote, rest)
        } else {
            memchr2(self.sep, b'\n', rest)
        };
        let found = found.map(|i| from + i);
        match found {
            Some(i) if input[i] == self.sep => {
                self.column += i as u64 + 1;
                self.eor = false;
                self.empty = false;
                Ok(self.unquoted_field(input, 0..i, i + 1, false))
            }
            Some(i) if input[i] == b'\n' => {
                let end = if i > 0 && input[i - 1] == b'\r' { i - 1 } else { i };
                self.line += 1;
                self.column = 0;
                self.empty = start_of_record && end == 0;
                self.eor = true;
                Ok(self.unquoted_field(input, 0..end, i + 1, true))
            }
            Some(i) => Err(ScanError::UnescapedQuote {
                line: self.line,
                column: self.column + i as u64 + 1,
            }),
            None if at_eof => {
                self.column += input.len() as u64;
                self.eor = true;
                self.empty = false;
                Ok(self.unquoted_field(input, 0..input.len(), input.len(), true))
            }
            None => {
                self.resume = input.len();
                Ok(ScanResult::InputEmpty)
            }
        }
    }

    fn unquoted_field(
        &self,
        input: &[u8],
        range: Range<usize>,
        consumed: usize,
        record_end: bool,
    ) -> ScanResult {
        let range = if self.trim {
            let t = trim_range(&input[range.clone()]);
            (range.start + t.start)..(range.start + t.end)
        } else {
            range
        };
        ScanResult::Field { range, consumed, record_end }
    }

    fn scan_quoted(
        &mut self,
        input: &mut [u8],
        at_eof: bool,
    ) -> Result<ScanResult, ScanError> {
        let quote = self.quote;
        let (mut i, mut quoted) = if self.resume > 0 {
            (self.resume_at(input), self.pending)
        } else {
            (1, QuotedField::new())
        };
        while i < input.len() {
            let b = input[i];
            if b == b'\n' {
                quoted.newline(i);
                i += 1;
                continue;
            }
            if b != quote {
                i += 1;
                continue;
            }
            // Whatever follows a quote decides what the quote means.
            let next = match input.get(i + 1) {
                Some(&next) => next,
                None if at_eof => {
                    return Ok(self.close_quoted(input, i, i + 1, quoted, true));
                }
                None => return Ok(self.suspend_quoted(i, quoted)),
            };
            if next == quote {
                quoted.escapes += 1;
                i += 2;
                continue;
            }
            if next == self.sep {
                return Ok(self.close_quoted(input, i, i + 2, quoted, false));
            }
            if next == b'\n' {
                quoted.newline(i + 1);
                return Ok(self.close_quoted(input, i, i + 2, quoted, true));
            }
            if next == b'\r' {
                match input.get(i + 2) {
                    Some(&b'\n') => {
                        quoted.newline(i + 2);
                        return Ok(self.close_quoted(
                            input, i, i + 3, quoted, true,
                        ));
                    }
                    None if !at_eof => {
                        return Ok(self.suspend_quoted(i, quoted));
                    }
                    _ => {}
                }
            }
            if !self.lazy {
                let column = match quoted.line_start {
                    Some(start) => (i - start) as u64 + 1,
                    None => self.column + i as u64 + 1,
                };
                return Err(ScanError::UnescapedQuote {
                    line: self.line + quoted.newlines,
                    column,
                });
            }
            i += 1;
        }
        if at_eof {
            Err(ScanError::NonTerminatedQuote { line: self.line })
        } else {
            Ok(self.suspend_quoted(i, quoted))
        }
    }

    /// Remember that the quoted field was examined up to (but excluding)
    /// `at`, then ask for more input.
    fn suspend_quoted(&mut self, at: usize, quoted: QuotedField) -> ScanResult {
        self.resume = at;
        self.pending = quoted;
        ScanResult::InputEmpty
    }

    /// Finish a quoted field whose closing quote is at `close`.
    fn close_quoted(
        &mut self,
        input: &mut [u8],
        close: usize,
        consumed: usize,
        quoted: QuotedField,
        record_end: bool,
    ) -> ScanResult {
        let end = if quoted.escapes > 0 {
            1 + collapse_quotes(&mut input[1..close], self.quote)
        } else {
            close
        };
        self.line += quoted.newlines;
        self.column = match quoted.line_start {
            Some(start) => (consumed - start) as u64,
            None => self.column + consumed as u64,
        };
        self.eor = record_end;
        self.empty = false;
        ScanResult::Field { range: 1..end, consumed, record_end }
    }
}

/// Bookkeeping for a quoted field being scanned.
#[derive(Clone, Copy, Debug)]
struct QuotedField {
    /// The number of doubled quotes seen.
    escapes: usize,
    /// The number of `\n` bytes seen.
    newlines: u64,
    /// The offset just past the last `\n` seen.
    line_start: Option<usize>,
}

impl QuotedField {
    fn new() -> QuotedField {
        QuotedField { escapes: 0, newlines: 0, line_start: None }
    }

    fn newline(&mut self, at: usize) {
        self.newlines += 1;
        self.line_start = Some(at + 1);
    }
}

/// Collapse every doubled quote in `field` into a single quote, returning
/// the new length of the field.
///
/// Pairs are matched greedily from the left, exactly as the scanner counted
/// them. A lone quote, which only survives scanning with lazy quotes, is
/// kept as is.
fn collapse_quotes(field: &mut [u8], quote: u8) -> usize {
    let (mut r, mut w) = (0, 0);
    while r < field.len() {
        let b = field[r];
        field[w] = b;
        w += 1;
        if b == quote && field.get(r + 1) == Some(&quote) {
            r += 2;
        } else {
            r += 1;
        }
    }
    w
}
