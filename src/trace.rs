use std::{
    fmt, fs,
    io::{self, BufRead, BufReader, Split},
    path::{Path, PathBuf},
};

use xz2::read::XzDecoder;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Instruction fetch, skipped by the simulator.
    Instr,
    Load,
    Store,
    /// Load followed by a store to the same address.
    Modify,
}

impl Kind {
    fn from_char(c: char) -> Option<Kind> {
        match c {
            'I' => Some(Kind::Instr),
            'L' => Some(Kind::Load),
            'S' => Some(Kind::Store),
            'M' => Some(Kind::Modify),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Kind::Instr => 'I',
            Kind::Load => 'L',
            Kind::Store => 'S',
            Kind::Modify => 'M',
        }
    }
}

/// One trace line: `<kind> <hex-address>,<size>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub kind: Kind,
    pub addr: u64,
    pub size: i32,
}

impl Access {
    /// Raw trace bytes. Anything that is not UTF-8 is as malformed as a bad token.
    pub fn parse_bytes(line: &[u8]) -> Option<Access> {
        Access::parse(std::str::from_utf8(line).ok()?)
    }

    pub fn parse(line: &str) -> Option<Access> {
        let line = line.trim_start();
        let mut chars = line.chars();
        let kind = Kind::from_char(chars.next()?)?;

        let (addr, size) = chars.as_str().trim_start().split_once(',')?;
        let addr = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .unwrap_or(addr);
        let addr = u64::from_str_radix(addr, 16).ok()?;
        let size = size.trim().parse().ok()?;

        Some(Access { kind, addr, size })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x},{}", self.kind.as_char(), self.addr, self.size)
    }
}

/// Sequential reader over a trace. Stops at end of input or at the first
/// line that does not parse, whichever comes first.
pub struct Trace<R> {
    path: PathBuf,
    lines: Split<R>,
    done: bool,
}

impl Trace<Box<dyn BufRead>> {
    /// Opens a trace file, decompressing it if the name ends in `.xz`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let stream = fs::File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let compressed = path.extension().is_some_and(|ext| ext == "xz");
        let reader: Box<dyn BufRead> = if compressed {
            Box::new(BufReader::new(XzDecoder::new(stream)))
        } else {
            Box::new(BufReader::new(stream))
        };
        log::info!("reading trace {} (compressed: {compressed})", path.display());
        Ok(Trace::from_reader(path, reader))
    }
}

impl<R: BufRead> Trace<R> {
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Self {
        Trace {
            path: path.into(),
            lines: reader.split(b'\n'),
            done: false,
        }
    }

    fn unavailable(&self, source: io::Error) -> Error {
        Error::SourceUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl<R: BufRead> Iterator for Trace<R> {
    type Item = Result<Access, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    self.done = true;
                    return Some(Err(self.unavailable(err)));
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match Access::parse_bytes(&line) {
                Some(access) => return Some(Ok(access)),
                None => {
                    log::warn!(
                        "{}: stopping at malformed trace line {:?}",
                        self.path.display(),
                        String::from_utf8_lossy(&line)
                    );
                    self.done = true;
                }
            }
        }
        None
    }
}
