use memchr::memchr;

/// The quoting style to use when writing delimited data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, the separator, a
    /// `\n` or, when `quote_cr` is enabled, a `\r`.
    ///
    /// This is the default.
    Necessary,
    /// This *never* writes quotes. Fields are emitted verbatim.
    ///
    /// Data containing separators or line breaks written in this style
    /// cannot be read back faithfully.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// A record terminator for written data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Terminate records with `\n`. This is the default.
    LF,
    /// Terminate records with `\r\n`.
    CRLF,
}

impl Terminator {
    fn as_bytes(&self) -> &'static [u8] {
        match *self {
            Terminator::LF => b"\n",
            Terminator::CRLF => b"\r\n",
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::LF
    }
}

/// A builder for configuring a writer.
///
/// This builder permits specifying the separator, terminator, quoting style
/// and more.
#[derive(Debug)]
pub struct WriterBuilder {
    wtr: Writer,
}

impl WriterBuilder {
    /// Create a new builder for configuring a writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder { wtr: Writer::default() }
    }

    /// Build a writer from this configuration.
    pub fn build(&self) -> Writer {
        let mut wtr = self.wtr.clone();
        wtr.requires_quotes = [false; 256];
        wtr.requires_quotes[wtr.sep as usize] = true;
        wtr.requires_quotes[wtr.quote as usize] = true;
        wtr.requires_quotes[b'\n' as usize] = true;
        if wtr.quote_cr {
            wtr.requires_quotes[b'\r' as usize] = true;
        }
        wtr
    }

    /// The field separator to use when writing.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, sep: u8) -> &mut WriterBuilder {
        self.wtr.sep = sep;
        self
    }

    /// The record terminator to use when writing.
    ///
    /// The default is `Terminator::LF`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.wtr.term = term;
        self
    }

    /// The quoting style to use when writing.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.wtr.style = style;
        self
    }

    /// The quote character to use when writing.
    ///
    /// The default value is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.wtr.quote = quote;
        self
    }

    /// Whether a field containing a carriage return requires quotes.
    ///
    /// This is enabled by default, so that a `\r` at the end of a field is
    /// not mistaken for half of a `\r\n` terminator when read back.
    pub fn quote_cr(&mut self, yes: bool) -> &mut WriterBuilder {
        self.wtr.quote_cr = yes;
        self
    }
}

/// The result of writing to an output buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteResult {
    /// All of the input given was written to the output.
    InputEmpty,
    /// The output buffer is full. The caller should drain it and retry with
    /// whatever input remains.
    OutputFull,
}

/// A writer for delimited data.
///
/// This writer never allocates and never performs I/O. Callers provide an
/// output buffer to each call and are told how many bytes were written to
/// it. When the output buffer runs out of room, the writer returns
/// `WriteResult::OutputFull` and the same call should be repeated with the
/// unwritten remainder of the input and a fresh output buffer.
///
/// A record is written as a sequence of `field` calls separated by
/// `delimiter` calls and ended by `terminator`. The whole contents of a
/// field must be given to the first `field` call for that field, since it
/// decides whether the field is quoted.
///
/// # Example
///
/// ```
/// use dsv_core::{Writer, WriteResult};
///
/// let mut wtr = Writer::new();
/// let mut out = [0; 1024];
/// let mut n = 0;
///
/// let (res, _, nout) = wtr.field(b"a\"b", &mut out[n..]);
/// assert_eq!(res, WriteResult::InputEmpty);
/// n += nout;
/// n += wtr.delimiter(&mut out[n..]).1;
/// n += wtr.field(b"c", &mut out[n..]).2;
/// n += wtr.terminator(&mut out[n..]).1;
///
/// assert_eq!(&out[..n], b"\"a\"\"b\",c\n");
/// ```
#[derive(Clone, Debug)]
pub struct Writer {
    state: WriterState,
    requires_quotes: [bool; 256],
    sep: u8,
    term: Terminator,
    style: QuoteStyle,
    quote: u8,
    quote_cr: bool,
}

#[derive(Clone, Debug, Default)]
struct WriterState {
    /// Whether a field has been started but not yet ended.
    in_field: bool,
    /// Whether the current field was opened with a quote that still needs
    /// closing.
    quoting: bool,
    /// The number of fields started in the current record.
    record_fields: u64,
    /// The number of bytes written for the current record.
    record_bytes: u64,
}

impl Default for Writer {
    fn default() -> Writer {
        WriterBuilder {
            wtr: Writer {
                state: WriterState::default(),
                requires_quotes: [false; 256],
                sep: b',',
                term: Terminator::default(),
                style: QuoteStyle::default(),
                quote: b'"',
                quote_cr: true,
            },
        }
        .build()
    }
}

impl Writer {
    /// Creates a new writer with the default configuration.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// Returns the configured field separator.
    pub fn get_separator(&self) -> u8 {
        self.sep
    }

    /// Returns the configured quoting style.
    pub fn get_quote_style(&self) -> QuoteStyle {
        self.style
    }

    /// Returns true if the given field would be wrapped in quotes.
    pub fn should_quote(&self, field: &[u8]) -> bool {
        match self.style {
            QuoteStyle::Always => true,
            QuoteStyle::Never => false,
            QuoteStyle::Necessary => {
                field.iter().any(|&b| self.requires_quotes[b as usize])
            }
        }
    }

    /// Write the contents of a field.
    ///
    /// The first call for a field decides whether it is quoted, based on all
    /// of `input`. Later calls with the remainder of the input after an
    /// `OutputFull` continue the same field.
    ///
    /// Returns the result along with the number of input bytes consumed and
    /// output bytes written.
    pub fn field(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> (WriteResult, usize, usize) {
        let mut nout = 0;
        if !self.state.in_field {
            let quoting = self.should_quote(input);
            if quoting {
                if output.is_empty() {
                    return (WriteResult::OutputFull, 0, 0);
                }
                output[0] = self.quote;
                nout += 1;
            }
            self.state.in_field = true;
            self.state.quoting = quoting;
            self.state.record_fields += 1;
        }
        let (res, nin, o) = if self.state.quoting {
            quote_into(input, &mut output[nout..], self.quote)
        } else {
            let (res, n) = copy_into(input, &mut output[nout..]);
            (res, n, n)
        };
        nout += o;
        self.state.record_bytes += nout as u64;
        (res, nin, nout)
    }

    /// Write a field separator, ending the current field.
    pub fn delimiter(&mut self, output: &mut [u8]) -> (WriteResult, usize) {
        let (res, mut nout) = self.finish(output);
        if res == WriteResult::OutputFull {
            return (res, nout);
        }
        if output.len() <= nout {
            return (WriteResult::OutputFull, nout);
        }
        output[nout] = self.sep;
        nout += 1;
        self.state.in_field = false;
        self.state.record_bytes += 1;
        (WriteResult::InputEmpty, nout)
    }

    /// Write a record terminator, ending the current field and record.
    ///
    /// A record made of a single empty field is written as an empty quoted
    /// field (unless the quote style is `Never`), so that it is not read
    /// back as an empty line.
    pub fn terminator(&mut self, output: &mut [u8]) -> (WriteResult, usize) {
        let (res, mut nout) = self.finish(output);
        if res == WriteResult::OutputFull {
            return (res, nout);
        }
        if self.style != QuoteStyle::Never
            && self.state.record_fields == 1
            && self.state.record_bytes == 0
        {
            if output.len() < nout + 2 {
                return (WriteResult::OutputFull, nout);
            }
            output[nout] = self.quote;
            output[nout + 1] = self.quote;
            nout += 2;
            self.state.record_bytes += 2;
        }
        let term = self.term.as_bytes();
        if output.len() < nout + term.len() {
            return (WriteResult::OutputFull, nout);
        }
        output[nout..nout + term.len()].copy_from_slice(term);
        self.state = WriterState::default();
        (WriteResult::InputEmpty, nout + term.len())
    }

    /// Close the quotes of the current field, if it is quoted.
    ///
    /// `delimiter` and `terminator` call this themselves. It is only needed
    /// directly when the output ends in the middle of a record.
    pub fn finish(&mut self, output: &mut [u8]) -> (WriteResult, usize) {
        if !self.state.quoting {
            return (WriteResult::InputEmpty, 0);
        }
        if output.is_empty() {
            return (WriteResult::OutputFull, 0);
        }
        output[0] = self.quote;
        self.state.quoting = false;
        self.state.record_bytes += 1;
        (WriteResult::InputEmpty, 1)
    }
}

/// Copy `input` into `output`, doubling every quote, stopping short of a
/// quote that does not fit in full.
fn quote_into(
    input: &[u8],
    output: &mut [u8],
    quote: u8,
) -> (WriteResult, usize, usize) {
    let (mut nin, mut nout) = (0, 0);
    loop {
        let (rest, out) = (&input[nin..], &mut output[nout..]);
        match memchr(quote, rest) {
            None => {
                let (res, n) = copy_into(rest, out);
                return (res, nin + n, nout + n);
            }
            Some(i) => {
                let (res, n) = copy_into(&rest[..i], out);
                nin += n;
                nout += n;
                if res == WriteResult::OutputFull || out.len() < i + 2 {
                    return (WriteResult::OutputFull, nin, nout);
                }
                out[i] = quote;
                out[i + 1] = quote;
                nin += 1;
                nout += 2;
            }
        }
    }
}

fn copy_into(input: &[u8], output: &mut [u8]) -> (WriteResult, usize) {
    if input.len() > output.len() {
        let n = output.len();
        output.copy_from_slice(&input[..n]);
        (WriteResult::OutputFull, n)
    } else {
        output[..input.len()].copy_from_slice(input);
        (WriteResult::InputEmpty, input.len())
    }
}
