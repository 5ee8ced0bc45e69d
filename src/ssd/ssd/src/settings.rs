use ssd_core::constants::{DEFAULT_POSITIONS, MAX_DISPLAYS};
use ssd_core::{CycleTrigger, DisplayConfig, Polarity, SegmentMapping, Wiring};

use std::path::PathBuf;
use std::time::Duration;

// Option ranges (min, max, default), as accepted by the capture tool
pub const OPT_P: (u32, u32, u32) = (1, 1000, 20);
pub const OPT_R: (u32, u32, u32) = (1, 10, 5);
pub const OPT_S: (u32, u32, u32) = (1, 10, 5);

/// Where edges come from
#[derive(Debug, PartialEq)]
pub enum Source {
    Replay(Option<PathBuf>), // None reads stdin
    Simulate {
        values: Vec<String>,       // One value per display
        glitch_every: Option<u32>, // Inject a fault every N scans
    },
}

#[derive(Debug)]
pub struct Settings {
    pub mapping: SegmentMapping,
    pub wiring: Wiring,
    pub displays: heapless::Vec<DisplayConfig, MAX_DISPLAYS>,
    pub refresh: Duration,
    pub sample_micros: u32,
    pub pulse_micros: u32,
    pub source: Source,
    pub listen: Option<String>,
}

/// Configures command-line interface using clap
pub fn get_cli_config<'a, 'b>() -> clap::App<'a, 'b> {
    let description = "Reads multiplexed seven-segment LED displays from their select and segment lines";
    clap::App::new("Seven-segment display reader (ssd)")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("gpio")
                .multiple(true)
                .required(true)
                .help("Select lines, most significant position first, display after display"),
        )
        .arg(
            clap::Arg::with_name("positions")
                .long("positions")
                .takes_value(true)
                .default_value("3")
                .help("Positions per display"),
        )
        .arg(
            clap::Arg::with_name("refresh")
                .short("r")
                .takes_value(true)
                .help("Refresh period in deciseconds, 1-10, default 5"),
        )
        .arg(
            clap::Arg::with_name("sample")
                .short("s")
                .takes_value(true)
                .help("Sampling rate in micros, 1-10, default 5"),
        )
        .arg(
            clap::Arg::with_name("pulse")
                .short("p")
                .takes_value(true)
                .help("Simulated strobe period in micros, 1-1000, TESTING only"),
        )
        .arg(
            clap::Arg::with_name("segments")
                .long("segments")
                .takes_value(true)
                .multiple(true)
                .require_delimiter(true)
                .help("Segment lines as a,b,c,d,e,f,g,dp"),
        )
        .arg(
            clap::Arg::with_name("active-high-select")
                .long("active-high-select")
                .help("Select lines read high while a position is lit"),
        )
        .arg(
            clap::Arg::with_name("active-low-segments")
                .long("active-low-segments")
                .help("Segment lines read low while lit"),
        )
        .arg(
            clap::Arg::with_name("last-line-trigger")
                .long("last-line-trigger")
                .help("Aggregate when the last select line fires instead of waiting for every position"),
        )
        .arg(
            clap::Arg::with_name("replay")
                .long("replay")
                .takes_value(true)
                .conflicts_with("simulate")
                .help("Capture file to replay, '-' for stdin (default)"),
        )
        .arg(
            clap::Arg::with_name("simulate")
                .long("simulate")
                .takes_value(true)
                .multiple(true)
                .require_delimiter(true)
                .help("Drive a simulated panel showing these values, one per display"),
        )
        .arg(
            clap::Arg::with_name("glitch-every")
                .long("glitch-every")
                .takes_value(true)
                .requires("simulate")
                .help("Inject a multiplexing fault every N simulated scans"),
        )
        .arg(
            clap::Arg::with_name("listen")
                .long("listen")
                .takes_value(true)
                .help("Also publish report lines to a TCP client on this address"),
        )
}

fn parse_line(text: &str) -> Result<u8, String> {
    match text.trim().parse::<u8>() {
        Ok(line) if line < 32 => Ok(line),
        _ => Err(format!("{} is not a valid gpio number", text)),
    }
}

// Reads a numeric option and checks it against its range
fn ranged(matches: &clap::ArgMatches<'_>, name: &str, flag: char, range: (u32, u32, u32)) -> Result<u32, String> {
    let (min, max, default) = range;
    let text = match matches.value_of(name) {
        Some(text) => text,
        None => return Ok(default),
    };
    match text.parse::<u32>() {
        Ok(value) if value >= min && value <= max => Ok(value),
        _ => Err(format!("invalid -{} option ({})", flag, text)),
    }
}

impl Settings {
    pub fn from_matches(matches: &clap::ArgMatches<'_>) -> Result<Settings, String> {
        let refresh = ranged(matches, "refresh", 'r', OPT_R)?;
        let sample_micros = ranged(matches, "sample", 's', OPT_S)?;
        let pulse_micros = ranged(matches, "pulse", 'p', OPT_P)?;

        let mapping = match matches.values_of("segments") {
            Some(values) => {
                let lines = values.map(parse_line).collect::<Result<Vec<u8>, String>>()?;
                SegmentMapping::from_slice(&lines)?
            }
            None => SegmentMapping::default(),
        };

        let wiring = Wiring {
            select: if matches.is_present("active-high-select") {
                Polarity::ActiveHigh
            } else {
                Polarity::ActiveLow
            },
            segments: if matches.is_present("active-low-segments") {
                Polarity::ActiveLow
            } else {
                Polarity::ActiveHigh
            },
        };

        let trigger = if matches.is_present("last-line-trigger") {
            CycleTrigger::LastLine
        } else {
            CycleTrigger::AllRefreshed
        };

        let positions = match matches.value_of("positions").map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => n,
            None => DEFAULT_POSITIONS,
            _ => return Err("--positions must be a positive number".to_owned()),
        };

        let lines = matches
            .values_of("gpio")
            .ok_or("At least one gpio must be specified")?
            .map(parse_line)
            .collect::<Result<Vec<u8>, String>>()?;
        if lines.len() % positions != 0 {
            return Err(format!(
                "{} gpios do not split into displays of {} positions",
                lines.len(),
                positions
            ));
        }

        let mut displays = heapless::Vec::new();
        for group in lines.chunks(positions) {
            let config = DisplayConfig::new(group)?.with_trigger(trigger);
            displays
                .push(config)
                .map_err(|_| format!("At most {} displays are supported", MAX_DISPLAYS))?;
        }

        let source = match matches.values_of("simulate") {
            Some(values) => {
                let values: Vec<String> = values.map(str::to_owned).collect();
                if values.len() != displays.len() {
                    return Err(format!(
                        "--simulate needs one value per display ({} given, {} displays)",
                        values.len(),
                        displays.len()
                    ));
                }
                let glitch_every = match matches.value_of("glitch-every").map(str::parse::<u32>) {
                    Some(Ok(n)) if n > 0 => Some(n),
                    None => None,
                    _ => return Err("--glitch-every must be a positive number".to_owned()),
                };
                Source::Simulate {
                    values,
                    glitch_every,
                }
            }
            None => match matches.value_of("replay") {
                Some("-") | None => Source::Replay(None),
                Some(path) => Source::Replay(Some(PathBuf::from(path))),
            },
        };

        Ok(Settings {
            mapping,
            wiring,
            displays,
            refresh: Duration::from_millis(refresh as u64 * 100),
            sample_micros,
            pulse_micros,
            source,
            listen: matches.value_of("listen").map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, String> {
        let mut argv = vec!["ssd"];
        argv.extend_from_slice(args);
        let matches = get_cli_config()
            .get_matches_from_safe(argv)
            .map_err(|e| e.message)?;
        Settings::from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&["4", "7", "8"]).unwrap();
        assert_eq!(settings.displays.len(), 1);
        assert_eq!(settings.displays[0].lines(), &[4, 7, 8]);
        assert_eq!(settings.refresh, Duration::from_millis(500));
        assert_eq!(settings.sample_micros, 5);
        assert_eq!(settings.pulse_micros, 20);
        assert_eq!(settings.mapping, SegmentMapping::default());
        assert_eq!(settings.wiring, Wiring::default());
        assert_eq!(settings.source, Source::Replay(None));
    }

    #[test]
    fn test_options_in_range() {
        let settings = parse(&["4", "7", "8", "-r2", "-s", "1", "-p", "1000"]).unwrap();
        assert_eq!(settings.refresh, Duration::from_millis(200));
        assert_eq!(settings.sample_micros, 1);
        assert_eq!(settings.pulse_micros, 1000);
    }

    #[test]
    fn test_options_out_of_range() {
        assert_eq!(parse(&["4", "-r", "11"]).unwrap_err(), "invalid -r option (11)");
        assert!(parse(&["4", "-s", "0"]).is_err());
        assert!(parse(&["4", "-p", "x"]).is_err());
    }

    #[test]
    fn test_display_grouping() {
        let settings = parse(&["--positions", "2", "4", "7", "8", "9"]).unwrap();
        assert_eq!(settings.displays.len(), 2);
        assert_eq!(settings.displays[1].lines(), &[8, 9]);
        assert!(parse(&["4", "7"]).is_err());
        assert!(parse(&["4", "7", "40"]).is_err());
    }

    #[test]
    fn test_simulate_and_segments() {
        let settings = parse(&[
            "--segments",
            "0,1,2,3,4,5,6,7",
            "--simulate",
            "12.3",
            "--glitch-every",
            "4",
            "10",
            "11",
            "12",
        ])
        .unwrap();
        assert_eq!(settings.mapping.lines(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            settings.source,
            Source::Simulate {
                values: vec!["12.3".to_owned()],
                glitch_every: Some(4),
            }
        );
        assert!(parse(&["--segments", "0,1,2", "10"]).is_err());
        assert!(parse(&["--simulate", "1,2", "10", "11", "12"]).is_err());
    }

    #[test]
    fn test_wiring_flags() {
        let settings = parse(&["--active-high-select", "--active-low-segments", "--last-line-trigger", "4", "7", "8"]).unwrap();
        assert_eq!(settings.wiring.select, Polarity::ActiveHigh);
        assert_eq!(settings.wiring.segments, Polarity::ActiveLow);
        assert_eq!(settings.displays[0].trigger, CycleTrigger::LastLine);
    }
}
