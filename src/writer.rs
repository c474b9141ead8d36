use std::cmp;
use std::fs::File;
use std::io;
use std::mem;
use std::path::Path;
use std::result;

use dsv_core::{
    QuoteStyle, Terminator, WriteResult, Writer as CoreWriter,
    WriterBuilder as CoreWriterBuilder,
};
use tracing::debug;

use crate::encode::Encode;
use crate::error::{Error, IntoInnerError, Result};

/// Builds a writer with various configuration knobs.
///
/// This builder can be used to tweak the field separator, record
/// terminator, quoting rules and more. Once a `Writer` is built, its
/// configuration cannot be changed.
#[derive(Debug)]
pub struct WriterBuilder {
    builder: CoreWriterBuilder,
    capacity: usize,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            builder: CoreWriterBuilder::new(),
            capacity: 8 * (1 << 10),
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring writers.
    ///
    /// To convert a builder into a writer, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use dsv::{Terminator, WriterBuilder};
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let mut wtr = WriterBuilder::new()
    ///         .separator(b'\t')
    ///         .terminator(Terminator::CRLF)
    ///         .from_writer(vec![]);
    ///     wtr.write_record(&["a", "b c", "d\te"])?;
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "a\tb c\t\"d\te\"\r\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a writer from this configuration that writes data to the given
    /// file path. The file is truncated if it already exists.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(Writer::new(self, File::create(path)?))
    }

    /// Build a writer from this configuration that writes data to `wtr`.
    ///
    /// Note that the writer is buffered automatically, so you should not
    /// wrap `wtr` in a buffered writer like `io::BufWriter`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer::new(self, wtr)
    }

    /// The field separator to use when writing.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, sep: u8) -> &mut WriterBuilder {
        self.builder.separator(sep);
        self
    }

    /// The record terminator to use when writing.
    ///
    /// The default is `Terminator::LF`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.builder.terminator(term);
        self
    }

    /// The quoting style to use when writing.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    /// `QuoteStyle::Never` writes every field verbatim.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.builder.quote_style(style);
        self
    }

    /// The quote character to use when writing.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.builder.quote(quote);
        self
    }

    /// Whether a `\r` in a field requires the field to be quoted.
    ///
    /// This is enabled by default.
    pub fn quote_cr(&mut self, yes: bool) -> &mut WriterBuilder {
        self.builder.quote_cr(yes);
        self
    }

    /// Set the capacity (in bytes) of the internal buffer used in the
    /// writer. This can be used to tune performance.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut WriterBuilder {
        self.capacity = capacity;
        self
    }
}

/// A buffered writer for delimited data.
///
/// Fields are quoted only when needed (see `QuoteStyle`), with embedded
/// quotes doubled. A record made of a single empty field is written as
/// `""` so that it is not mistaken for an empty line when read back.
///
/// The first I/O error returned by the underlying writer is latched: every
/// later call fails with an error of the same kind and message without
/// touching the underlying writer, and `err` returns it.
///
/// The writer is flushed when it is dropped. Errors are ignored in that
/// case; call `flush` or `into_inner` to observe them.
///
/// # Example
///
/// ```
/// use dsv::Writer;
///
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_record(&["c1", "c\"2", "c\n3", "c,4"]).unwrap();
/// wtr.write_value(1.5).unwrap();
/// wtr.write_value(None::<u32>).unwrap();
/// wtr.end_of_record().unwrap();
///
/// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "c1,\"c\"\"2\",\"c\n3\",\"c,4\"\n1.5,\n");
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    core: CoreWriter,
    wtr: Option<W>,
    buf: Buffer,
    state: WriterState,
    /// Scratch space for encoding values.
    scratch: Vec<u8>,
}

#[derive(Debug)]
struct WriterState {
    /// The number of fields written in the current record.
    fields: u64,
    /// The latched error, if any.
    err: Option<io::Error>,
    /// Whether the underlying writer panicked while we were flushing.
    panicked: bool,
}

/// A simple internal buffer for buffering writes.
///
/// We need this because the `dsv_core` writer writes into a plain byte
/// slice.
#[derive(Debug)]
struct Buffer {
    /// The contents of the buffer.
    buf: Vec<u8>,
    /// The number of bytes written to the buffer.
    len: usize,
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.wtr.is_some() && !self.state.panicked {
            let _ = self.flush();
        }
    }
}

impl Writer<File> {
    /// Build a writer with a default configuration that writes data to the
    /// given file path. The file is truncated if it already exists.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Writer<W> {
        // Every write of the core writer makes progress with room for a
        // doubled quote or a CRLF.
        let capacity = cmp::max(builder.capacity, 2);
        Writer {
            core: builder.builder.build(),
            wtr: Some(wtr),
            buf: Buffer { buf: vec![0; capacity], len: 0 },
            state: WriterState { fields: 0, err: None, panicked: false },
            scratch: vec![],
        }
    }

    /// Build a writer with a default configuration that writes data to
    /// `wtr`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single field.
    ///
    /// A separator is written first unless this is the first field of the
    /// record. Call `end_of_record` to end the record.
    pub fn write_field<T: AsRef<[u8]>>(&mut self, field: T) -> Result<()> {
        self.check()?;
        let res = self.write_field_impl(field.as_ref());
        self.latch(res)
    }

    /// Encode a value and write it as a single field.
    ///
    /// See `Encode` for the supported types.
    pub fn write_value<E: Encode>(&mut self, value: E) -> Result<()> {
        let mut scratch = mem::replace(&mut self.scratch, vec![]);
        scratch.clear();
        value.encode(&mut scratch);
        let res = self.write_field(&scratch);
        self.scratch = scratch;
        res
    }

    /// Write every field yielded by `record`, then end the record.
    ///
    /// # Example
    ///
    /// ```
    /// use dsv::Writer;
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// wtr.write_record(&["a", "b"]).unwrap();
    /// wtr.write_record(vec![String::new()]).unwrap();
    /// wtr.write_record(&[b"x\xFF"]).unwrap();
    ///
    /// assert_eq!(wtr.into_inner().unwrap(), b"a,b\n\"\"\nx\xFF\n".to_vec());
    /// ```
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for field in record {
            self.write_field(field)?;
        }
        self.end_of_record()
    }

    /// End the current record with the configured terminator.
    ///
    /// The next field written starts a new record.
    pub fn end_of_record(&mut self) -> Result<()> {
        self.check()?;
        let res = self.end_of_record_impl();
        self.latch(res)
    }

    /// Flush the contents of the internal buffer to the underlying writer,
    /// then flush the underlying writer.
    ///
    /// Note that this also happens when the writer is dropped.
    pub fn flush(&mut self) -> Result<()> {
        self.check()?;
        let res = self.flush_impl();
        self.latch(res)
    }

    /// Returns the error latched by a previous call, if any.
    pub fn err(&self) -> Option<&io::Error> {
        self.state.err.as_ref()
    }

    /// Flush the contents of the internal buffer and return the underlying
    /// writer.
    pub fn into_inner(
        mut self,
    ) -> result::Result<W, IntoInnerError<Writer<W>>> {
        match self.flush() {
            Ok(()) => Ok(self.take_inner()),
            Err(err) => Err(IntoInnerError::new(self, io::Error::from(err))),
        }
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        match self.wtr {
            Some(ref wtr) => wtr,
            None => unreachable!("writer used after into_inner"),
        }
    }

    fn take_inner(&mut self) -> W {
        match self.wtr.take() {
            Some(wtr) => wtr,
            None => unreachable!("writer used after into_inner"),
        }
    }

    /// Fail with a copy of the latched error, if there is one.
    fn check(&self) -> Result<()> {
        match self.state.err {
            Some(ref err) => Err(Error::Io(copy_error(err))),
            None => Ok(()),
        }
    }

    /// Latch the error in `res`, if any.
    fn latch(&mut self, res: io::Result<()>) -> Result<()> {
        match res {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!("writer failed, further writes are rejected: {}", err);
                self.state.err = Some(copy_error(&err));
                Err(Error::Io(err))
            }
        }
    }

    fn write_field_impl(&mut self, mut field: &[u8]) -> io::Result<()> {
        if self.state.fields > 0 {
            self.write_delimiter()?;
        }
        loop {
            let (res, nin, nout) = self.core.field(field, self.buf.writable());
            field = &field[nin..];
            self.buf.written(nout);
            match res {
                WriteResult::InputEmpty => break,
                WriteResult::OutputFull => self.flush_buf()?,
            }
        }
        // Close the quotes right away, so that flushing in the middle of a
        // record never leaves a field open.
        loop {
            let (res, nout) = self.core.finish(self.buf.writable());
            self.buf.written(nout);
            match res {
                WriteResult::InputEmpty => {
                    self.state.fields += 1;
                    return Ok(());
                }
                WriteResult::OutputFull => self.flush_buf()?,
            }
        }
    }

    fn write_delimiter(&mut self) -> io::Result<()> {
        loop {
            let (res, nout) = self.core.delimiter(self.buf.writable());
            self.buf.written(nout);
            match res {
                WriteResult::InputEmpty => return Ok(()),
                WriteResult::OutputFull => self.flush_buf()?,
            }
        }
    }

    fn end_of_record_impl(&mut self) -> io::Result<()> {
        loop {
            let (res, nout) = self.core.terminator(self.buf.writable());
            self.buf.written(nout);
            match res {
                WriteResult::InputEmpty => {
                    self.state.fields = 0;
                    return Ok(());
                }
                WriteResult::OutputFull => self.flush_buf()?,
            }
        }
    }

    fn flush_impl(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        match self.wtr {
            Some(ref mut wtr) => wtr.flush(),
            None => Ok(()),
        }
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        let wtr = match self.wtr {
            Some(ref mut wtr) => wtr,
            None => return Ok(()),
        };
        self.state.panicked = true;
        let res = wtr.write_all(self.buf.readable());
        self.state.panicked = false;
        res?;
        self.buf.clear();
        Ok(())
    }
}

/// `io::Error` is not `Clone`, so the latched error is handed out as a new
/// error with the same kind and message.
fn copy_error(err: &io::Error) -> io::Error {
    io::Error::new(err.kind(), err.to_string())
}

impl Buffer {
    /// Returns a slice of the buffer's current contents.
    ///
    /// The slice returned may be empty.
    fn readable(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns a mutable slice of the remaining space in this buffer.
    ///
    /// The slice returned may be empty.
    fn writable(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Indicates that `n` bytes have been written to this buffer.
    fn written(&mut self, n: usize) {
        self.len += n;
    }

    /// Clear the buffer.
    fn clear(&mut self) {
        self.len = 0;
    }
}
