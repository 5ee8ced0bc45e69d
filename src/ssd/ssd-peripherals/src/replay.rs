use crate::capture::Capture;
use ssd_core::constants::MAX_LINES;
use ssd_core::Level;

use log::warn;
use std::fmt;
use std::io::{self, BufRead};

/// Failure while reading a capture stream
#[derive(Debug)]
pub enum ReplayError {
    Io(io::Error),
    Parse { line: usize, reason: &'static str },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "capture read failed: {}", e),
            ReplayError::Parse { line, reason } => write!(f, "capture line {}: {}", line, reason),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Io(e) => Some(e),
            ReplayError::Parse { .. } => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        ReplayError::Io(e)
    }
}

fn parse_number(field: &str) -> Result<u32, &'static str> {
    let parsed = match field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => field.parse(),
    };
    parsed.map_err(|_| "Invalid number")
}

/// Parses `<line> <level> <tick> <snapshot>`; blank lines and `#` comments yield None
pub fn parse_capture(text: &str) -> Result<Option<Capture>, &'static str> {
    let text = match text.find('#') {
        Some(idx) => &text[..idx],
        None => text,
    };
    let mut fields = text.split_whitespace();

    let line = match fields.next() {
        Some(field) => parse_number(field)?,
        None => return Ok(None),
    };
    if line >= MAX_LINES as u32 {
        return Err("Line outside of the 0-31 bank");
    }

    let level = match parse_number(fields.next().ok_or("Missing level")?) {
        Ok(0) => Level::Low,
        Ok(1) => Level::High,
        _ => return Err("Level must be 0 or 1"),
    };

    let tick = parse_number(fields.next().ok_or("Missing tick")?)?;
    let snapshot = parse_number(fields.next().ok_or("Missing snapshot")?)?;

    if fields.next().is_some() {
        return Err("Trailing fields");
    }

    Ok(Some(Capture::new(line as u8, level, tick, snapshot)))
}

/// Renders a capture in the replay format
pub fn format_capture(capture: &Capture) -> String {
    format!(
        "{} {} {} 0x{:08x}",
        capture.edge.line,
        capture.edge.level.as_bit(),
        capture.edge.tick,
        capture.snapshot
    )
}

/// Iterates the captures of a text stream
pub struct ReplayReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    strict: bool,
}

impl<R: BufRead> ReplayReader<R> {
    pub fn new(reader: R) -> Self {
        ReplayReader {
            lines: reader.lines(),
            line_no: 0,
            strict: true,
        }
    }

    /// Skip malformed lines with a warning instead of failing
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<Capture, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            match parse_capture(&text) {
                Ok(Some(capture)) => return Some(Ok(capture)),
                Ok(None) => continue,
                Err(reason) if self.strict => {
                    return Some(Err(ReplayError::Parse {
                        line: self.line_no,
                        reason,
                    }))
                }
                Err(reason) => warn!("Skipping capture line {}: {}", self.line_no, reason),
            }
        }
    }
}

#[cfg(test)]
mod replay_tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_fields() {
        let capture = parse_capture("4 0 1200 0x0c08e060").unwrap().unwrap();
        assert_eq!(capture.edge.line, 4);
        assert_eq!(capture.edge.level, Level::Low);
        assert_eq!(capture.edge.tick, 1200);
        assert_eq!(capture.snapshot, 0x0c08_e060);

        let capture = parse_capture("  7 1 5 255   # trailing note").unwrap().unwrap();
        assert_eq!(capture.edge.level, Level::High);
        assert_eq!(capture.snapshot, 255);
        assert_eq!(format_capture(&capture), "7 1 5 0x000000ff");
    }

    #[test]
    fn test_skips_blank_and_comment() {
        assert_eq!(parse_capture(""), Ok(None));
        assert_eq!(parse_capture("   "), Ok(None));
        assert_eq!(parse_capture("# gpio capture"), Ok(None));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_capture("32 0 1 0").is_err());
        assert!(parse_capture("4 2 1 0").is_err());
        assert!(parse_capture("4 0 1").is_err());
        assert!(parse_capture("4 0 1 0x").is_err());
        assert!(parse_capture("4 0 1 0 9").is_err());
        assert!(parse_capture("four 0 1 0").is_err());
    }

    #[test]
    fn test_reader_reports_line_numbers() {
        let text = "# header\n4 0 1 0\n\nbad line\n";
        let mut reader = ReplayReader::new(Cursor::new(text));
        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lenient_reader_skips() {
        let text = "bad\n4 0 1 0\n7 1 2 3\n";
        let captures: Vec<_> = ReplayReader::new(Cursor::new(text))
            .lenient()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[1].edge.line, 7);
    }
}
