//! Copy tab separated data from stdin to stdout, one field at a time.
//!
//! Fields are re-quoted only where needed, so the output is a normalized
//! version of the input.

use std::error::Error;
use std::io;
use std::process;

use dsv::{Token, TokenizerBuilder, WriterBuilder};

fn run() -> Result<(), Box<dyn Error>> {
    let mut tok = TokenizerBuilder::new()
        .separator(b'\t')
        .from_reader(io::stdin());
    let mut wtr = WriterBuilder::new()
        .separator(b'\t')
        .from_writer(io::stdout());

    loop {
        match tok.advance()? {
            Token::Field { .. } if tok.empty_line() => {}
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
        eprintln!("{}", err);
        process::exit(1);
    }
}
