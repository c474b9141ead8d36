#![allow(dead_code)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{self, Command};

use dsv::{
    ByteRecord, Error, StringRecord, Terminator, Token, Tokenizer,
    TokenizerBuilder, Writer, WriterBuilder,
};
use proptest::prelude::*;

fn tokenizer(data: &str) -> Tokenizer<&[u8]> {
    Tokenizer::new(data.as_bytes())
}

/// Read the fields of the next non-empty record, as strings.
fn read_row<R: io::Read>(tok: &mut Tokenizer<R>) -> Vec<String> {
    let mut row = vec![];
    loop {
        match tok.advance().unwrap() {
            Token::Field { .. } if tok.empty_line() => continue,
            Token::Field { record_end } => {
                row.push(tok.field_str().unwrap().to_string());
                if record_end {
                    break;
                }
            }
            Token::Comment => continue,
            Token::End => break,
        }
    }
    row
}

#[test]
fn single_value() {
    let mut tok = tokenizer("Foo");
    assert_eq!(tok.advance().unwrap(), Token::Field { record_end: true });
    assert_eq!(tok.field_str().unwrap(), "Foo");
    assert_eq!(tok.advance().unwrap(), Token::End);
}

#[test]
fn last_empty() {
    let mut tok = tokenizer("Foo,Bar,\n");
    assert_eq!(read_row(&mut tok), vec!["Foo", "Bar", ""]);
}

#[test]
fn two_lines() {
    let row1 = "1,2,3,4,5,6,7,8,9,10,".repeat(5);
    let row2 = "a,b,c,d,e,f,g,h,i,j,".repeat(3);
    let data = format!("{}\n{}", row1, row2);
    let mut tok = tokenizer(&data);
    assert_eq!(read_row(&mut tok).len(), 51);
    assert_eq!(read_row(&mut tok).len(), 31);
    assert!(read_row(&mut tok).is_empty());
}

#[test]
fn long_line() {
    let data = "1,2,3,4,5,6,7,8,9,10,".repeat(200);
    let mut tok = tokenizer(&data);
    assert_eq!(read_row(&mut tok).len(), 2001);
}

#[test]
fn quoted_line() {
    let mut tok = tokenizer("\"a\",b,\"c,d\"");
    assert_eq!(read_row(&mut tok), vec!["a", "b", "c,d"]);
}

#[test]
fn escaped_quote_line() {
    let mut tok = tokenizer(r#""a",b,"c""d""#);
    assert_eq!(read_row(&mut tok), vec!["a", "b", "c\"d"]);
}

#[test]
fn embedded_newline() {
    let mut tok = tokenizer("a,\"b\nb\",\"c\n\n\",d");
    assert_eq!(read_row(&mut tok), vec!["a", "b\nb", "c\n\n", "d"]);
    assert_eq!(tok.line(), 4);
}

#[test]
fn escaped_quote_and_embedded_crlf() {
    let mut tok = tokenizer("\"a\"\"b\",\"c\"\"\r\nd\"");
    assert_eq!(read_row(&mut tok), vec!["a\"b", "c\"\r\nd"]);
}

#[test]
fn reader_example() {
    let mut tok = tokenizer("c1,\"c\"\"2\",\"c\n3\",\"c,4\"");
    let mut got = vec![];
    while let Token::Field { record_end } = tok.advance().unwrap() {
        got.push((tok.field_to_vec(), record_end));
    }
    assert_eq!(
        got,
        vec![
            (b"c1".to_vec(), false),
            (b"c\"2".to_vec(), false),
            (b"c\n3".to_vec(), false),
            (b"c,4".to_vec(), true),
        ]
    );
}

#[test]
fn guess() {
    let mut tok = TokenizerBuilder::new()
        .guess(true)
        .from_reader("a,b;c\td:e|f;g".as_bytes());
    assert_eq!(read_row(&mut tok), vec!["a,b", "c\td:e|f", "g"]);
    assert_eq!(tok.separator(), b';');
}

#[test]
fn guess_keeps_separator_without_candidates() {
    let mut tok = TokenizerBuilder::new()
        .separator(b'#')
        .guess(true)
        .from_reader("a#b\n".as_bytes());
    assert_eq!(read_row(&mut tok), vec!["a", "b"]);
    assert_eq!(tok.separator(), b'#');
}

#[test]
fn trim() {
    let mut tok = TokenizerBuilder::new()
        .trim(true)
        .from_reader(r#" a,b ," c ", d "#.as_bytes());
    assert_eq!(read_row(&mut tok), vec!["a", "b", " c ", "d"]);
}

#[test]
fn line_comment() {
    let mut tok = TokenizerBuilder::new()
        .comment(Some(b'#'))
        .from_reader("a,#\n# comment\nb\n# comment".as_bytes());
    assert_eq!(read_row(&mut tok), vec!["a", "#"]);
    assert_eq!(read_row(&mut tok), vec!["b"]);
    assert_eq!(tok.advance().unwrap(), Token::Comment);
    assert_eq!(tok.advance().unwrap(), Token::End);
}

#[test]
fn empty_line() {
    let mut tok = tokenizer("a,b,\"c\"\n\nd,e,f");
    assert_eq!(read_row(&mut tok), vec!["a", "b", "c"]);
    assert_eq!(read_row(&mut tok), vec!["d", "e", "f"]);
}

#[test]
fn windows_end_of_line() {
    let mut tok = tokenizer("a,b,c\r\nd,e,\"f\"\r\n");
    assert_eq!(read_row(&mut tok), vec!["a", "b", "c"]);
    assert_eq!(read_row(&mut tok), vec!["d", "e", "f"]);
    assert!(read_row(&mut tok).is_empty());
}

#[test]
fn strict_and_lazy_quotes() {
    let data = "a \"word\",\"b\"";
    let mut tok = tokenizer(data);
    match tok.advance() {
        Err(Error::UnescapedQuote { line: 1, .. }) => {}
        res => panic!("expected unescaped quote, got {:?}", res),
    }
    assert_eq!(tok.advance().unwrap(), Token::End);

    let mut tok =
        TokenizerBuilder::new().lazy_quotes(true).from_reader(data.as_bytes());
    assert_eq!(read_row(&mut tok), vec!["a \"word\"", "b"]);
}

#[test]
fn bad_quote_in_quoted_field() {
    let mut tok = tokenizer("x\n\"ab\"c\"");
    assert_eq!(read_row(&mut tok), vec!["x"]);
    match tok.advance() {
        Err(Error::UnescapedQuote { line: 2, column: 4 }) => {}
        res => panic!("expected unescaped quote, got {:?}", res),
    }
}

#[test]
fn non_terminated_quote() {
    let mut tok = tokenizer("a\nb,\"c\nd");
    assert_eq!(read_row(&mut tok), vec!["a"]);
    tok.advance().unwrap();
    match tok.advance() {
        Err(ref err @ Error::NonTerminatedQuote { .. }) => {
            assert_eq!(err.line(), Some(2));
        }
        res => panic!("expected non-terminated quote, got {:?}", res),
    }
}

#[test]
fn overflow() {
    let data = format!("a,{}", "x".repeat(10_000));
    let mut tok = TokenizerBuilder::new()
        .max_buffer_size(1024)
        .from_reader(data.as_bytes());
    assert_eq!(read_row_result(&mut tok).unwrap_err().to_string(),
        "parse error: field too long, buffer full at its maximum size of \
         1024 bytes");
}

#[test]
fn overflow_default_max() {
    let data = "x".repeat(64 * 1024 + 1);
    let mut tok = tokenizer(&data);
    match tok.advance() {
        Err(Error::BufferOverflow { max }) => assert_eq!(max, 64 * 1024),
        res => panic!("expected overflow, got {:?}", res),
    }
}

fn read_row_result<R: io::Read>(
    tok: &mut Tokenizer<R>,
) -> Result<ByteRecord, Error> {
    let mut rec = ByteRecord::new();
    tok.read_byte_record(&mut rec)?;
    Ok(rec)
}

#[test]
fn records_skip_empty_lines_and_comments() {
    let mut tok = TokenizerBuilder::new()
        .comment(Some(b'#'))
        .from_reader("\n# header\na,b\n\n\"\"\nc\n".as_bytes());
    let recs: Vec<StringRecord> =
        tok.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        recs,
        vec![
            StringRecord::from(vec!["a", "b"]),
            StringRecord::from(vec![""]),
            StringRecord::from(vec!["c"]),
        ]
    );
}

#[test]
fn scan_values_and_lines() {
    let mut tok = tokenizer("1,2.5,true\nx,3\n");
    assert_eq!(tok.scan_value::<u32>().unwrap(), Some(1));
    assert_eq!(tok.scan_value::<f64>().unwrap(), Some(2.5));
    assert_eq!(tok.scan_value::<bool>().unwrap(), Some(true));
    assert_eq!(
        tok.scan_line::<(char, Option<i8>)>().unwrap(),
        Some(('x', Some(3)))
    );
    assert_eq!(tok.scan_line::<(char, i8)>().unwrap(), None);
}

macro_rules! writes_to {
    ($name:ident, $rows:expr, $expected:expr) => {
        writes_to!($name, $rows, $expected, Terminator::LF);
    };
    ($name:ident, $rows:expr, $expected:expr, $term:expr) => {
        #[test]
        fn $name() {
            let rows: Vec<Vec<&str>> = $rows;
            let mut wtr =
                WriterBuilder::new().terminator($term).from_writer(vec![]);
            for row in rows {
                wtr.write_record(row).unwrap();
            }
            let got = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
            assert_eq!(got, $expected);
        }
    };
}

writes_to!(write_plain, vec![vec!["abc"]], "abc\n");
writes_to!(write_crlf, vec![vec!["abc"]], "abc\r\n", Terminator::CRLF);
writes_to!(write_quoted_quotes, vec![vec![r#""abc""#]], "\"\"\"abc\"\"\"\n");
writes_to!(write_inner_quote, vec![vec![r#"a"b"#]], "\"a\"\"b\"\n");
writes_to!(write_leading_space, vec![vec![" abc"]], " abc\n");
writes_to!(write_separator, vec![vec!["abc,def"]], "\"abc,def\"\n");
writes_to!(write_two_fields, vec![vec!["abc", "def"]], "abc,def\n");
writes_to!(write_two_records, vec![vec!["abc"], vec!["def"]], "abc\ndef\n");
writes_to!(write_newline, vec![vec!["abc\ndef"]], "\"abc\ndef\"\n");
writes_to!(
    write_newline_crlf,
    vec![vec!["abc\ndef"]],
    "\"abc\ndef\"\r\n",
    Terminator::CRLF
);
writes_to!(write_cr, vec![vec!["abc\rdef"]], "\"abc\rdef\"\n");
writes_to!(
    write_mixed,
    vec![vec!["a", "b,\n", "c\"d"]],
    "a,\"b,\n\",\"c\"\"d\"\n"
);
writes_to!(write_utf8, vec![vec!["à", "é", "è", "ù"]], "à,é,è,ù\n");
writes_to!(write_single_empty, vec![vec![""]], "\"\"\n");

#[test]
fn writer_example() {
    let mut wtr = Writer::from_writer(vec![]);
    for field in &["c1", "c\"2", "c\n3", "c,4"] {
        wtr.write_field(field).unwrap();
    }
    wtr.flush().unwrap();
    assert_eq!(wtr.get_ref(), b"c1,\"c\"\"2\",\"c\n3\",\"c,4\"");
}

struct ErrorWriter;

impl Write for ErrorWriter {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "Test"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn writer_error() {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(&["abc"]).unwrap();
    wtr.flush().unwrap();
    assert!(wtr.err().is_none());

    let mut wtr = Writer::from_writer(ErrorWriter);
    wtr.write_record(&["abc"]).unwrap();
    assert!(wtr.flush().is_err());
    assert_eq!(wtr.err().map(|e| e.to_string()), Some("Test".to_string()));
    assert!(wtr.write_record(&["def"]).is_err());
}

#[test]
fn files_round_trip() {
    let path = temp_path("plain.csv");
    {
        let mut wtr = Writer::from_path(&path).unwrap();
        wtr.write_record(&["a", "b c", "d,e"]).unwrap();
        wtr.write_value(42u8).unwrap();
        wtr.end_of_record().unwrap();
    }
    let mut tok = Tokenizer::from_path(&path).unwrap();
    assert_eq!(read_row(&mut tok), vec!["a", "b c", "d,e"]);
    assert_eq!(read_row(&mut tok), vec!["42"]);
    fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file() {
    let path = temp_path("does-not-exist.csv");
    match Tokenizer::from_path(&path) {
        Err(ref err) if err.is_io_error() => {}
        res => panic!("expected I/O error, got {:?}", res.map(|_| ())),
    }
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_source() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = temp_path("data.csv.gz");
    {
        let file = fs::File::create(&path).unwrap();
        let mut gz = GzEncoder::new(file, Compression::default());
        gz.write_all(b"a,b\nc,\"d\ne\"\n").unwrap();
        gz.finish().unwrap();
    }
    let mut tok = Tokenizer::from_path(&path).unwrap();
    assert_eq!(read_row(&mut tok), vec!["a", "b"]);
    assert_eq!(read_row(&mut tok), vec!["c", "d\ne"]);
    assert!(read_row(&mut tok).is_empty());
    fs::remove_file(&path).unwrap();
}

#[cfg(feature = "bzip2")]
#[test]
fn bzip2_source() {
    use bzip2::write::BzEncoder;
    use bzip2::Compression;

    let path = temp_path("data.tsv.bz2");
    {
        let file = fs::File::create(&path).unwrap();
        let mut bz = BzEncoder::new(file, Compression::default());
        bz.write_all(b"a\tb\n\n# note\nc\t\"d\te\"\n").unwrap();
        bz.finish().unwrap();
    }
    let mut tok = TokenizerBuilder::new()
        .separator(b'\t')
        .comment(Some(b'#'))
        .from_path(&path)
        .unwrap();
    assert_eq!(read_row(&mut tok), vec!["a", "b"]);
    assert_eq!(read_row(&mut tok), vec!["c", "d\te"]);
    assert!(read_row(&mut tok).is_empty());
    fs::remove_file(&path).unwrap();
}

#[cfg(feature = "serde")]
#[test]
fn deserialize_records() {
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        city: String,
        pop: Option<u64>,
        coastal: bool,
    }

    let data = "Boston,4628910,true\n# skipped\n\nDenver,,F\n";
    let mut tok =
        TokenizerBuilder::new().comment(Some(b'#')).from_reader(data.as_bytes());
    let mut rows = vec![];
    while let Some(row) = tok.deserialize::<Row>().unwrap() {
        rows.push(row);
    }
    assert_eq!(
        rows,
        vec![
            Row { city: "Boston".into(), pop: Some(4628910), coastal: true },
            Row { city: "Denver".into(), pop: None, coastal: false },
        ]
    );
}

#[test]
fn copy_demo() {
    let mut cmd = cmd_for_example("copy");
    let out = cmd_output_with(&mut cmd, b"a\tb c\n\nd\t\"e\tf\"\t\"g\"\n");
    assert_eq!(out.stdout(), "a\tb c\nd\t\"e\tf\"\tg\n");
}

#[test]
fn copy_demo_error() {
    let mut cmd = cmd_for_example("copy");
    let out = cmd_output_with(&mut cmd, b"a\t\"b\n");
    assert!(out.stderr().contains("non-terminated quoted field at line 1"));
}

fn field_strategy() -> impl Strategy<Value = String> {
    "[ -~àé]{0,8}"
}

proptest! {
    #[test]
    fn write_then_read(
        rows in prop::collection::vec(
            prop::collection::vec(field_strategy(), 1..5),
            0..8,
        ),
        crlf in any::<bool>(),
    ) {
        let term = if crlf { Terminator::CRLF } else { Terminator::LF };
        let mut wtr = WriterBuilder::new().terminator(term).from_writer(vec![]);
        for row in &rows {
            wtr.write_record(row).unwrap();
        }
        let data = wtr.into_inner().unwrap();

        let mut tok = Tokenizer::new(&data[..]);
        let mut got = vec![];
        let mut rec = StringRecord::new();
        while tok.read_record(&mut rec).unwrap() {
            got.push(rec.iter().map(|f| f.to_string()).collect::<Vec<_>>());
        }
        prop_assert_eq!(got, rows);
    }

    #[test]
    fn trim_is_idempotent(field in "[ \t]{0,3}[a-z ]{0,6}[ \t]{0,3}") {
        let once = dsv_core::trim(field.as_bytes());
        prop_assert_eq!(dsv_core::trim(once), once);
    }
}

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!("dsv-{}-{}", process::id(), name))
}

/// Return the target/debug directory path.
fn debug_dir() -> PathBuf {
    env::current_exe()
        .expect("test binary path")
        .parent()
        .expect("test binary directory")
        .parent()
        .expect("example binary directory")
        .to_path_buf()
}

/// Return the directory containing the demo binaries.
fn example_bin_dir() -> PathBuf {
    debug_dir().join("examples")
}

/// Return a command ready to execute the given demo binary.
fn cmd_for_example(name: &str) -> Command {
    Command::new(example_bin_dir().join(name))
}

/// Like cmd_output, but sends the given data as stdin to the given child.
fn cmd_output_with(cmd: &mut Command, data: &[u8]) -> Output {
    cmd.stdin(process::Stdio::piped());
    cmd.stdout(process::Stdio::piped());
    cmd.stderr(process::Stdio::piped());
    let mut child = cmd.spawn().expect("command spawns successfully");
    {
        let stdin = child.stdin.as_mut().expect("failed to get stdin");
        stdin.write_all(data).expect("failed to write to stdin");
    }
    Output::new(cmd, child)
}

struct Output {
    stdout: String,
    stderr: String,
    command: String,
    status: process::ExitStatus,
}

impl Output {
    /// Return the (stdout, stderr) of running the given child as a string.
    fn new(cmd: &mut Command, child: process::Child) -> Output {
        let out =
            child.wait_with_output().expect("command runs successfully");
        let stdout =
            String::from_utf8(out.stdout).expect("valid utf-8 (stdout)");
        let stderr =
            String::from_utf8(out.stderr).expect("valid utf-8 (stderr)");
        Output { stdout, stderr, command: format!("{:?}", cmd), status: out.status }
    }

    /// Return stdout, panicking if the command failed.
    fn stdout(&self) -> &str {
        if !self.status.success() {
            panic!(
                "\n\n==== {} ====\n\
                 command failed but expected success!\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n=====\n",
                self.command, self.status, self.stdout, self.stderr
            );
        }
        &self.stdout
    }

    /// Return stderr, panicking if the command succeeded.
    fn stderr(&self) -> &str {
        if self.status.success() {
            panic!(
                "\n\n==== {} ====\n\
                 command succeeded but expected failure!\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n=====\n",
                self.command, self.status, self.stdout, self.stderr
            );
        }
        &self.stderr
    }
}
