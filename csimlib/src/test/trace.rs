use std::io::{self, BufRead, BufReader, Read};
use crate::cache::AccessKind;
use crate::trace::{TraceError, TraceParser, TraceRecord, Truncation};

fn records(trace: &str) -> Vec<TraceRecord> {
    TraceParser::new(trace.as_bytes()).map(|r| r.unwrap()).collect()
}

#[test]
fn skips_instruction_fetches() {
    let trace = "I 0400d7d4,8\n L 7ff0005c8,8\nI  0400d7d8,3\n S 7ff0005d0,4\n M 0421c7f0,4\n";
    assert_eq!(
        records(trace),
        vec![
            TraceRecord { kind: AccessKind::Load, address: 0x7ff0005c8, size: 8 },
            TraceRecord { kind: AccessKind::Store, address: 0x7ff0005d0, size: 4 },
            TraceRecord { kind: AccessKind::Modify, address: 0x421c7f0, size: 4 },
        ]
    );
}

#[test]
fn only_instructions_yields_nothing() {
    let mut parser = TraceParser::new("I 10,1\nI 20,4\nI 400000,5\n".as_bytes());
    assert!(parser.next().is_none());
    assert!(parser.truncation().is_none());
    assert_eq!(parser.lines_read(), 3);
}

#[test]
fn blank_lines_and_missing_newline() {
    let trace = "\n L 10,1\n\n   \n S 20,1";
    let parsed = records(trace);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].address, 0x20);
}

#[test]
fn malformed_line_truncates() {
    let mut parser = TraceParser::new(" L 10,1\n L 20,1\ngarbage here\n L 30,1\n".as_bytes());
    let parsed: Vec<_> = parser.by_ref().map(|r| r.unwrap().address).collect();
    assert_eq!(parsed, vec![0x10, 0x20]);
    assert_eq!(
        parser.truncation(),
        Some(&Truncation { line_number: 3, line: "garbage here".to_string() })
    );
    // Non-restartable
    assert!(parser.next().is_none());
}

#[test]
fn clean_end_has_no_truncation() {
    let mut parser = TraceParser::new(" L 10,1\n".as_bytes());
    assert_eq!(parser.by_ref().count(), 1);
    assert!(parser.truncation().is_none());
}

#[test]
fn strict_reports_malformed_line_once() {
    let mut parser = TraceParser::new(" L 10,1\n Q 20,1\n L 30,1\n".as_bytes()).strict(true);
    assert!(matches!(parser.next(), Some(Ok(_))));
    match parser.next() {
        Some(Err(TraceError::Malformed { line_number, line })) => {
            assert_eq!(line_number, 2);
            assert_eq!(line, " Q 20,1");
        }
        other => panic!("expected a malformed line error, got {other:?}"),
    }
    assert!(parser.next().is_none());
    assert!(parser.truncation().is_none());
}

/// Produces its contents then fails
struct FailingReader {
    data: &'static [u8],
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        }
        let n = self.data.read(buf)?;
        Ok(n)
    }
}

#[test]
fn read_errors_end_the_sequence() {
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(FailingReader { data: b" L 10,1\n" }));
    let mut parser = TraceParser::new(reader);
    assert!(matches!(parser.next(), Some(Ok(_))));
    assert!(matches!(parser.next(), Some(Err(TraceError::Read(_)))));
    assert!(parser.next().is_none());
}

#[test]
fn non_utf8_line_truncates() {
    let mut parser = TraceParser::new(&b" L 10,1\n\xff\xfe garbage\n L 20,1\n"[..]);
    let parsed: Vec<_> = parser.by_ref().map(|r| r.unwrap().address).collect();
    assert_eq!(parsed, vec![0x10]);
    let truncation = parser.truncation().unwrap();
    assert_eq!(truncation.line_number, 2);
    assert!(truncation.line.ends_with(" garbage"));
}

#[test]
fn strict_reports_non_utf8_line() {
    let mut parser = TraceParser::new(&b" L 10,1\n\xff\xfe garbage\n"[..]).strict(true);
    assert!(matches!(parser.next(), Some(Ok(_))));
    assert!(matches!(parser.next(), Some(Err(TraceError::Malformed { line_number: 2, .. }))));
    assert!(parser.next().is_none());
}
