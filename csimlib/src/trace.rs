use std::io::{self, BufRead};
use std::path::PathBuf;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use crate::cache::AccessKind;

lazy_static! {
    // `<op> <hex-address>,<decimal-size>`, surrounding whitespace allowed
    static ref RECORD: Regex =
        Regex::new(r"^\s*(?P<op>[LSMI])\s+(?P<address>[0-9a-fA-F]+)\s*,\s*(?P<size>[0-9]+)\s*$").unwrap();
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't open the trace file at path {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("couldn't read the trace: {0}")]
    Read(#[from] io::Error),
    #[error("malformed trace record on line {line_number}: {line:?}")]
    Malformed { line_number: usize, line: String },
}

/// One data access from a trace
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub kind: AccessKind,
    pub address: u64,
    /// Bytes accessed. Carried through for reporting, it never affects the cache
    pub size: u32,
}

/// Where a tolerant parse stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub line_number: usize,
    pub line: String,
}

enum Line {
    Data(TraceRecord),
    Instruction,
    Blank,
}

/// Parses one trace line. `None` if the line isn't a record
fn parse_line(text: &str) -> Option<Line> {
    if text.trim().is_empty() {
        return Some(Line::Blank);
    }
    let captures = RECORD.captures(text)?;
    let kind = match &captures["op"] {
        "L" => AccessKind::Load,
        "S" => AccessKind::Store,
        "M" => AccessKind::Modify,
        _ => return Some(Line::Instruction),
    };
    Some(Line::Data(TraceRecord {
        kind,
        address: u64::from_str_radix(&captures["address"], 16).ok()?,
        size: captures["size"].parse().ok()?,
    }))
}

/// Lazily reads data access records from a valgrind style trace
///
/// Instruction fetches (`I` records) are consumed but never yielded. The sequence ends at the
/// end of input, on a read error (yielded once as `Err`), or on the first line that isn't a
/// record.
///
/// What happens on a malformed line depends on the mode. By default the sequence just ends and
/// the line is kept in [`TraceParser::truncation`], so callers can tell a clean end of file from
/// a cut short trace. In strict mode the line is yielded as [`TraceError::Malformed`] instead
pub struct TraceParser<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    strict: bool,
    finished: bool,
    truncation: Option<Truncation>,
}

impl<R: BufRead> TraceParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            strict: false,
            finished: false,
            truncation: None,
        }
    }

    /// Report malformed lines as errors rather than stopping silently
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The line a tolerant parse stopped at, if it stopped before the end of input
    pub fn truncation(&self) -> Option<&Truncation> {
        self.truncation.as_ref()
    }

    /// Number of lines read so far, including skipped ones
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    fn stop(&mut self) {
        self.finished = true;
    }
}

impl<R: BufRead> Iterator for TraceParser<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.stop(),
                Ok(_) => {
                    self.line_number += 1;
                    // Bytes that aren't UTF-8 can't form a record
                    let parsed = std::str::from_utf8(&self.buffer).ok().and_then(parse_line);
                    match parsed {
                        Some(Line::Data(record)) => return Some(Ok(record)),
                        Some(Line::Instruction) | Some(Line::Blank) => continue,
                        None => {
                            self.stop();
                            let line = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
                            if self.strict {
                                return Some(Err(TraceError::Malformed {
                                    line_number: self.line_number,
                                    line,
                                }));
                            }
                            self.truncation = Some(Truncation {
                                line_number: self.line_number,
                                line,
                            });
                        }
                    }
                }
                Err(e) => {
                    self.stop();
                    return Some(Err(TraceError::Read(e)));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valgrind_spacing() {
        let Some(Line::Data(record)) = parse_line(" M 7ff000388,8\n") else {
            panic!("expected a data record");
        };
        assert_eq!(record, TraceRecord { kind: AccessKind::Modify, address: 0x7ff000388, size: 8 });
        assert!(matches!(parse_line("I  0400d7d4,8"), Some(Line::Instruction)));
        assert!(matches!(parse_line(" L 10,4 \n"), Some(Line::Data(_))));
        assert!(matches!(parse_line("   \n"), Some(Line::Blank)));
    }

    #[test]
    fn rejects_non_records() {
        assert!(parse_line("X 10,4").is_none());
        assert!(parse_line("L 0x10,4").is_none());
        assert!(parse_line("L 10").is_none());
        assert!(parse_line("L 10,-1").is_none());
        // Wider than 64 bits
        assert!(parse_line("L 1ffffffffffffffff,1").is_none());
    }
}
