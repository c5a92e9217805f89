//! Transparent gzip handling for file sources and sinks.
//!
//! Detection is by extension first (`.gz`), then by the gzip magic bytes for
//! readers. With the `compression-gzip` feature disabled, gzip input is an
//! error and every writer is plain.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied to a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    None,
    Gzip,
}

impl Codec {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        if name.ends_with(".gz") { Codec::Gzip } else { Codec::None }
    }
}

/// Open `path` for line-oriented reading, decompressing when needed.
pub fn open_reader(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    auto_detect_reader(f, path)
}

/// Wrap `reader` in a decompressor chosen from `path`'s extension, falling
/// back to sniffing the first bytes.
pub fn auto_detect_reader<R>(reader: R, path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>>
where
    R: Read + Send + 'static,
{
    let mut buffered = BufReader::new(reader);
    let codec = match Codec::from_path(&path) {
        Codec::Gzip => Codec::Gzip,
        Codec::None => {
            let head = buffered.fill_buf().context("peek file header")?;
            if head.starts_with(&GZIP_MAGIC) { Codec::Gzip } else { Codec::None }
        }
    };
    wrap_reader(buffered, codec, path.as_ref())
}

#[cfg(feature = "compression-gzip")]
fn wrap_reader<R>(reader: BufReader<R>, codec: Codec, _path: &Path) -> Result<Box<dyn BufRead + Send>>
where
    R: Read + Send + 'static,
{
    Ok(match codec {
        Codec::Gzip => Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(reader))),
        Codec::None => Box::new(reader),
    })
}

#[cfg(not(feature = "compression-gzip"))]
fn wrap_reader<R>(reader: BufReader<R>, codec: Codec, path: &Path) -> Result<Box<dyn BufRead + Send>>
where
    R: Read + Send + 'static,
{
    match codec {
        Codec::Gzip => anyhow::bail!("{} is gzip-compressed; enable the compression-gzip feature", path.display()),
        Codec::None => Ok(Box::new(reader)),
    }
}

/// A file writer that may compress. Call [`finish`](Self::finish) to flush and
/// write any trailer; dropping it unfinished loses buffered output errors.
pub enum FileWriter {
    Plain(BufWriter<File>),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<BufWriter<File>>),
}

impl FileWriter {
    pub fn finish(self) -> Result<()> {
        match self {
            FileWriter::Plain(mut w) => w.flush().context("flush output file")?,
            #[cfg(feature = "compression-gzip")]
            FileWriter::Gzip(enc) => {
                let mut inner = enc.finish().context("finish gzip stream")?;
                inner.flush().context("flush output file")?;
            }
        }
        Ok(())
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FileWriter::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            FileWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FileWriter::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            FileWriter::Gzip(w) => w.flush(),
        }
    }
}

/// Create `path` (and its parent directories), compressing when its extension asks for it.
pub fn create_writer(path: impl AsRef<Path>) -> Result<FileWriter> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let w = BufWriter::new(f);
    match Codec::from_path(path) {
        Codec::None => Ok(FileWriter::Plain(w)),
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip => Ok(FileWriter::Gzip(flate2::write::GzEncoder::new(w, flate2::Compression::default()))),
        #[cfg(not(feature = "compression-gzip"))]
        Codec::Gzip => anyhow::bail!("cannot write {}: enable the compression-gzip feature", path.display()),
    }
}

#[cfg(all(test, feature = "compression-gzip"))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn gzip_round_trip_and_magic_sniffing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let gz = dir.path().join("lines.txt.gz");
        let mut w = create_writer(&gz)?;
        w.write_all(b"one\ntwo\n")?;
        w.finish()?;

        let lines: Vec<String> = open_reader(&gz)?.lines().collect::<std::io::Result<_>>()?;
        assert_eq!(lines, vec!["one", "two"]);

        // same bytes under a name without the extension
        let renamed = dir.path().join("lines.bin");
        std::fs::copy(&gz, &renamed)?;
        let lines: Vec<String> = open_reader(&renamed)?.lines().collect::<std::io::Result<_>>()?;
        assert_eq!(lines, vec!["one", "two"]);
        Ok(())
    }
}
