mod debounce;

pub use debounce::{Confidence, CycleOutcome, Debounce, ErrorState};

use crate::constants::{MAX_LINES, MAX_POSITIONS};
use crate::decoder::DecodedDigit;
use crate::segments::SegmentTable;
use crate::sync::check_sync;
use crate::utils::{line_bit, pow10};
use crate::wiring::Wiring;

use log::{trace, warn};

/// When a display considers its scan cycle complete
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleTrigger {
    AllRefreshed, // Every position sampled since the last aggregation
    LastLine,     // The last configured select line fired
}

impl Default for CycleTrigger {
    fn default() -> Self {
        CycleTrigger::AllRefreshed
    }
}

/// Setup of one display: select lines from the most significant position down
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    lines: heapless::Vec<u8, MAX_POSITIONS>,
    pub trigger: CycleTrigger,
    pub debounce: Debounce,
}

impl DisplayConfig {
    pub fn new(lines: &[u8]) -> Result<Self, &'static str> {
        if lines.is_empty() {
            return Err("Display needs at least one select line");
        }

        let mut stored = heapless::Vec::new();
        let mut seen = 0u32;
        for &line in lines {
            if line >= MAX_LINES {
                return Err("Select line outside of the 0-31 bank");
            }
            if seen & line_bit(line) != 0 {
                return Err("Select line listed twice");
            }
            seen |= line_bit(line);
            stored
                .push(line)
                .map_err(|_| "Too many positions for one display")?;
        }

        Ok(Self {
            lines: stored,
            trigger: CycleTrigger::default(),
            debounce: Debounce::default(),
        })
    }

    pub fn with_trigger(mut self, trigger: CycleTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_debounce(mut self, debounce: Debounce) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn lines(&self) -> &[u8] {
        &self.lines
    }

    pub fn select_mask(&self) -> u32 {
        self.lines.iter().fold(0, |mask, &line| mask | line_bit(line))
    }
}

/// Snapshot of a display handed to readers after each aggregation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub error: ErrorState,
    pub repeat: u8,
    pub tick: u32, // Tick of the sample that completed the cycle
}

impl Reading {
    /// The value, when it can be trusted
    pub fn trusted(&self) -> Option<f64> {
        if self.error.is_ok() {
            Some(self.value)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Position {
    line: u8,
    digit: DecodedDigit,
    tick: u32,
}

/// One multiplexed display and its debounce state
#[derive(Clone, Debug)]
pub struct Display {
    positions: heapless::Vec<Position, MAX_POSITIONS>,
    select_mask: u32,
    trigger: CycleTrigger,
    refreshed: u8, // Bit per position sampled since the last aggregation
    confidence: Confidence,
    last_tick: u32,
}

impl Display {
    pub fn new(config: &DisplayConfig) -> Self {
        let positions = config
            .lines()
            .iter()
            .map(|&line| Position {
                line,
                digit: DecodedDigit::blank(),
                tick: 0,
            })
            .collect();

        Self {
            positions,
            select_mask: config.select_mask(),
            trigger: config.trigger,
            refreshed: 0,
            confidence: Confidence::new(config.debounce),
            last_tick: 0,
        }
    }

    pub fn select_mask(&self) -> u32 {
        self.select_mask
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_of(&self, line: u8) -> Option<usize> {
        self.positions.iter().position(|p| p.line == line)
    }

    pub fn lines(&self) -> impl Iterator<Item = u8> + '_ {
        self.positions.iter().map(|p| p.line)
    }

    pub fn digit(&self, index: usize) -> Option<&DecodedDigit> {
        self.positions.get(index).map(|p| &p.digit)
    }

    pub fn sample_tick(&self, index: usize) -> Option<u32> {
        self.positions.get(index).map(|p| p.tick)
    }

    pub fn value(&self) -> f64 {
        self.confidence.value()
    }

    pub fn error_state(&self) -> ErrorState {
        self.confidence.state()
    }

    pub fn repeat(&self) -> u8 {
        self.confidence.repeat()
    }

    pub fn reading(&self) -> Reading {
        Reading {
            value: self.confidence.value(),
            error: self.confidence.state(),
            repeat: self.confidence.repeat(),
            tick: self.last_tick,
        }
    }

    /// Decodes a qualifying sample of `line`; returns a reading when it completed a cycle
    pub fn sample(
        &mut self,
        table: &SegmentTable,
        wiring: Wiring,
        line: u8,
        snapshot: u32,
        tick: u32,
    ) -> Option<Reading> {
        let index = self.position_of(line)?;

        let out_of_sync = check_sync(snapshot, self.select_mask, line, wiring.select);
        let mut digit = table.decode(wiring.segments.normalize(snapshot));
        digit.out_of_sync = out_of_sync;
        trace!("line {} position {}: {:?}", line, index, digit);

        if self.record(index, digit, tick) {
            Some(self.aggregate(tick))
        } else {
            None
        }
    }

    /// Stores a decoded digit; true when the scan cycle is complete
    pub fn record(&mut self, index: usize, digit: DecodedDigit, tick: u32) -> bool {
        let count = self.positions.len();
        let position = match self.positions.get_mut(index) {
            Some(p) => p,
            None => return false,
        };
        position.digit = digit;
        position.tick = tick;
        self.refreshed |= 1u8 << index;

        match self.trigger {
            CycleTrigger::AllRefreshed => self.refreshed == full_mask(count),
            CycleTrigger::LastLine => index + 1 == count,
        }
    }

    /// Folds the current positions into the debounce state
    pub fn aggregate(&mut self, tick: u32) -> Reading {
        let outcome = self.evaluate();
        if outcome == CycleOutcome::OutOfSync || outcome == CycleOutcome::Collapsed {
            warn!("Cycle rejected at tick {}: {:?}", tick, outcome);
        }
        self.confidence.apply(outcome);
        self.refreshed = 0;
        self.last_tick = tick;
        self.reading()
    }

    /// Value of the positions as they stand, without touching the debounce state
    pub fn evaluate(&self) -> CycleOutcome {
        if self.positions.iter().any(|p| p.digit.out_of_sync) {
            return CycleOutcome::OutOfSync;
        }

        let mut magnitude: u32 = 0;
        for p in self.positions.iter() {
            match p.digit.magnitude() {
                Some(d) => magnitude = magnitude * 10 + d as u32,
                None => return CycleOutcome::Collapsed,
            }
        }

        let decimals = self
            .positions
            .iter()
            .position(|p| p.digit.decimal_point)
            .map(|idx| self.positions.len() - idx - 1)
            .unwrap_or(0);

        CycleOutcome::Value(magnitude as f64 / pow10(decimals))
    }
}

fn full_mask(count: usize) -> u8 {
    if count >= 8 {
        u8::MAX
    } else {
        (1u8 << count) - 1
    }
}
