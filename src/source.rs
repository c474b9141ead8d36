use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

#[cfg(feature = "bzip2")]
use bzip2::read::MultiBzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
use tracing::debug;

/// A file opened for reading, decompressed on the fly when needed.
///
/// With the `gzip` feature enabled (the default), a path ending in `.gz` is
/// read through a gzip decoder. Likewise, with the `bzip2` feature (also a
/// default), a path ending in `.bz2` is read through a bzip2 decoder.
/// Concatenated members are read in sequence in both cases, as `gzip -d`
/// and `bzip2 -d` do. Every other path is read as is.
pub enum Source {
    /// A plain file.
    File(File),
    /// A gzip compressed file.
    #[cfg(feature = "gzip")]
    Gzip(MultiGzDecoder<File>),
    /// A bzip2 compressed file.
    #[cfg(feature = "bzip2")]
    Bzip2(MultiBzDecoder<File>),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(file) => f.debug_tuple("File").field(file).finish(),
            #[cfg(feature = "gzip")]
            Source::Gzip(dec) => f.debug_tuple("Gzip").field(dec).finish(),
            #[cfg(feature = "bzip2")]
            Source::Bzip2(_) => f.debug_tuple("Bzip2").finish(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Source {
    /// Open the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Source> {
        let path = path.as_ref();
        let file = File::open(path)?;
        match compression(path) {
            Compression::None => {}
            Compression::Gzip => {
                #[cfg(feature = "gzip")]
                {
                    debug!("reading {} through a gzip decoder", path.display());
                    return Ok(Source::Gzip(MultiGzDecoder::new(file)));
                }
                #[cfg(not(feature = "gzip"))]
                debug!(
                    "reading {} as is, gzip support is disabled",
                    path.display()
                );
            }
            Compression::Bzip2 => {
                #[cfg(feature = "bzip2")]
                {
                    debug!(
                        "reading {} through a bzip2 decoder",
                        path.display()
                    );
                    return Ok(Source::Bzip2(MultiBzDecoder::new(file)));
                }
                #[cfg(not(feature = "bzip2"))]
                debug!(
                    "reading {} as is, bzip2 support is disabled",
                    path.display()
                );
            }
        }
        Ok(Source::File(file))
    }
}

fn compression(path: &Path) -> Compression {
    match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Compression::Gzip,
        Some("bz2") => Compression::Bzip2,
        _ => Compression::None,
    }
}

impl io::Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            Source::File(ref mut file) => file.read(buf),
            #[cfg(feature = "gzip")]
            Source::Gzip(ref mut gz) => gz.read(buf),
            #[cfg(feature = "bzip2")]
            Source::Bzip2(ref mut bz) => bz.read(buf),
        }
    }
}
