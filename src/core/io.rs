use crate::error::{QcError, Result};
use flate2::read::MultiGzDecoder;
use gzp::deflate::{Bgzf, Mgzip};
use gzp::par::decompress::ParDecompressBuilder;
use memchr::memchr;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const READ_BUF: usize = 1024 * 1024;

/// A forward-only supply of text lines with line terminators removed.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<&[u8]>>;
}

/// Something that can hand out a fresh [`LineSource`] positioned at the
/// start of the data. Engines needing more than one pass require this.
pub trait Reopen {
    type Lines<'a>: LineSource
    where
        Self: 'a;

    fn reopen(&self) -> Result<Self::Lines<'_>>;
}

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }
}

fn split_line<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    if *pos >= data.len() {
        return None;
    }
    let start = *pos;
    let end = match memchr(b'\n', &data[start..]) {
        Some(i) => start + i,
        None => data.len(),
    };
    *pos = (end + 1).min(data.len());
    Some(trim_cr(&data[start..end]))
}

fn trim_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

/// Lines over a borrowed byte slice.
pub struct SliceLines<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceLines<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl LineSource for SliceLines<'_> {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        Ok(split_line(self.data, &mut self.pos))
    }
}

pub struct MappedLines {
    map: MmapSource,
    pos: usize,
}

impl LineSource for MappedLines {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        Ok(split_line(self.map.bytes(), &mut self.pos))
    }
}

/// Lines over any buffered reader, reusing one line buffer.
pub struct ReaderLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(512),
        }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(&self.buf))
    }
}

pub enum FileLines {
    Mapped(MappedLines),
    Stream(ReaderLines<BufReader<Box<dyn Read + Send>>>),
}

impl LineSource for FileLines {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        match self {
            FileLines::Mapped(lines) => lines.next_line(),
            FileLines::Stream(lines) => lines.next_line(),
        }
    }
}

/// A FASTQ file on disk, plain or gzip compressed.
#[derive(Clone, Debug)]
pub struct FastqPath {
    path: PathBuf,
    threads: usize,
}

impl FastqPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            threads: 1,
        }
    }

    /// Threads used for block-gzip decompression. Ignored for plain input.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<FileLines> {
        open_lines(&self.path, self.threads)
    }
}

impl Reopen for FastqPath {
    type Lines<'a> = FileLines;

    fn reopen(&self) -> Result<FileLines> {
        self.open()
    }
}

/// Owned bytes replayed from the start on every reopen. Use this to buffer a
/// stream that cannot be rewound.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self { data })
    }

    pub fn lines(&self) -> SliceLines<'_> {
        SliceLines::new(&self.data)
    }
}

impl Reopen for MemorySource {
    type Lines<'a> = SliceLines<'a>;

    fn reopen(&self) -> Result<SliceLines<'_>> {
        Ok(self.lines())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
}

pub fn open_lines(path: &Path, threads: usize) -> Result<FileLines> {
    match detect_input_kind(path)? {
        InputKind::Plain => {
            let len = std::fs::metadata(path)?.len();
            if len == 0 {
                let empty: Box<dyn Read + Send> = Box::new(io::empty());
                return Ok(FileLines::Stream(ReaderLines::new(BufReader::new(empty))));
            }
            let map = MmapSource::open(path)?;
            log::debug!("mapped {} ({} bytes)", path.display(), map.len());
            Ok(FileLines::Mapped(MappedLines { map, pos: 0 }))
        }
        InputKind::Gzip => {
            let reader = open_gzip_reader(path, threads)?;
            Ok(FileLines::Stream(ReaderLines::new(BufReader::with_capacity(
                READ_BUF, reader,
            ))))
        }
    }
}

pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        if ext.eq_ignore_ascii_case("gz") {
            return Ok(InputKind::Gzip);
        }
    }
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(InputKind::Gzip)
    } else {
        Ok(InputKind::Plain)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GzipVariant {
    Standard,
    Mgzip,
    Bgzf,
}

fn detect_gzip_variant(path: &Path) -> Result<GzipVariant> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 20];
    let n = file.read(&mut header)?;
    if n < 14 || header[0] != 0x1f || header[1] != 0x8b {
        return Ok(GzipVariant::Standard);
    }
    // FEXTRA must be set for block variants.
    if header[3] & 4 == 0 {
        return Ok(GzipVariant::Standard);
    }
    match (header[12], header[13]) {
        (b'B', b'C') => Ok(GzipVariant::Bgzf),
        (b'I', b'G') => Ok(GzipVariant::Mgzip),
        _ => Ok(GzipVariant::Standard),
    }
}

pub fn open_gzip_reader(path: &Path, threads: usize) -> Result<Box<dyn Read + Send>> {
    let variant = detect_gzip_variant(path)?;
    let reader = BufReader::new(File::open(path)?);
    log::debug!(
        "opening {} as {:?} gzip with {} thread(s)",
        path.display(),
        variant,
        threads
    );
    let reader: Box<dyn Read + Send> = match variant {
        GzipVariant::Bgzf if threads > 1 => Box::new(
            ParDecompressBuilder::<Bgzf>::new()
                .num_threads(threads)
                .map_err(gzp_error)?
                .from_reader(reader),
        ),
        GzipVariant::Mgzip if threads > 1 => Box::new(
            ParDecompressBuilder::<Mgzip>::new()
                .num_threads(threads)
                .map_err(gzp_error)?
                .from_reader(reader),
        ),
        _ => Box::new(MultiGzDecoder::new(reader)),
    };
    Ok(reader)
}

fn gzp_error(e: impl std::fmt::Display) -> QcError {
    QcError::Io(io::Error::other(e.to_string()))
}
