use ssd_core::{ErrorState, Reading};

use std::fmt::Write;

// One display's entry in a report line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayReport {
    pub index: usize,
    pub state: ErrorState,
    pub value: Option<f64>, // Present when Ok or Unconfirmed
}

impl DisplayReport {
    pub fn from_reading(index: usize, reading: &Reading) -> Self {
        let value = match reading.error {
            ErrorState::Ok | ErrorState::Unconfirmed => Some(reading.value),
            _ => None,
        };
        DisplayReport {
            index,
            state: reading.error,
            value,
        }
    }

    /// Entry for a display that has not completed a cycle yet
    pub fn uninitialized(index: usize) -> Self {
        DisplayReport {
            index,
            state: ErrorState::Uninitialized,
            value: None,
        }
    }
}

// A full reporting tick
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub tick: u32,
    pub displays: Vec<DisplayReport>,
}

/// Formats a report as `tick=<n> d<i>=<field> ...`.
/// Field is the value when Ok, otherwise `!<label>` with `:<value>` appended when known.
pub fn serialize_report(report: &Report) -> String {
    let mut line = format!("tick={}", report.tick);
    for entry in report.displays.iter() {
        // Writing into a String cannot fail
        let _ = match (entry.state, entry.value) {
            (ErrorState::Ok, Some(value)) => write!(line, " d{}={}", entry.index, value),
            (state, Some(value)) => write!(line, " d{}=!{}:{}", entry.index, state, value),
            (state, None) => write!(line, " d{}=!{}", entry.index, state),
        };
    }
    line
}

/// Parses a line produced by `serialize_report`
pub fn parse_report(line: &str) -> Option<Report> {
    let mut fields = line.split_whitespace();

    let tick = fields.next()?.strip_prefix("tick=")?.parse().ok()?;

    let mut displays = Vec::new();
    for field in fields {
        let (key, body) = field.split_once('=')?;
        let index = key.strip_prefix('d')?.parse().ok()?;

        let entry = match body.strip_prefix('!') {
            // Error entry, optionally carrying the last candidate value
            Some(rest) => {
                let (label, value) = match rest.split_once(':') {
                    Some((label, value)) => (label, Some(value.parse().ok()?)),
                    None => (rest, None),
                };
                let state = ErrorState::from_label(label)?;
                if state.is_ok() {
                    return None;
                }
                DisplayReport {
                    index,
                    state,
                    value,
                }
            }
            None => DisplayReport {
                index,
                state: ErrorState::Ok,
                value: Some(body.parse().ok()?),
            },
        };
        displays.push(entry);
    }

    Some(Report { tick, displays })
}

#[cfg(test)]
mod report_tests {
    use super::*;

    fn reading(value: f64, error: ErrorState) -> Reading {
        Reading {
            value,
            error,
            repeat: 0,
            tick: 0,
        }
    }

    #[test]
    fn test_serialize_states() {
        let report = Report {
            tick: 42,
            displays: vec![
                DisplayReport::from_reading(0, &reading(12.3, ErrorState::Ok)),
                DisplayReport::from_reading(1, &reading(7.0, ErrorState::Unconfirmed)),
                DisplayReport::from_reading(2, &reading(7.0, ErrorState::OutOfSync)),
                DisplayReport::uninitialized(3),
            ],
        };
        assert_eq!(
            serialize_report(&report),
            "tick=42 d0=12.3 d1=!unconfirmed:7 d2=!out-of-sync d3=!uninitialized"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let line = "tick=7 d0=123 d1=!collapsed d2=!unconfirmed:0.5";
        let report = parse_report(line).unwrap();
        assert_eq!(report.tick, 7);
        assert_eq!(report.displays.len(), 3);
        assert_eq!(report.displays[0].value, Some(123.0));
        assert_eq!(report.displays[1].state, ErrorState::Collapsed);
        assert_eq!(report.displays[2].value, Some(0.5));
        assert_eq!(serialize_report(&report), line);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_report("").is_none());
        assert!(parse_report("tock=1").is_none());
        assert!(parse_report("tick=1 d0").is_none());
        assert!(parse_report("tick=1 x0=5").is_none());
        assert!(parse_report("tick=1 d0=!sleeping").is_none());
        assert!(parse_report("tick=1 d0=!ok:5").is_none());
        assert!(parse_report("tick=1 d0=abc").is_none());
    }
}
