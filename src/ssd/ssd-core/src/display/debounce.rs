use crate::constants::debounce::{CONFIRM_THRESHOLD, REPEAT_CEILING};

use core::fmt;
use log::{info, warn};

/// Confidence in the value of one display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorState {
    Uninitialized, // Nothing read since startup
    Collapsed,     // A position lit no valid digit
    OutOfSync,     // A position was sampled while another was selected
    Unconfirmed,   // Plausible value, not repeated often enough yet
    Ok,            // Value confirmed stable
}

impl ErrorState {
    pub fn label(self) -> &'static str {
        match self {
            ErrorState::Uninitialized => "uninitialized",
            ErrorState::Collapsed => "collapsed",
            ErrorState::OutOfSync => "out-of-sync",
            ErrorState::Unconfirmed => "unconfirmed",
            ErrorState::Ok => "ok",
        }
    }

    pub fn from_label(label: &str) -> Option<ErrorState> {
        match label {
            "uninitialized" => Some(ErrorState::Uninitialized),
            "collapsed" => Some(ErrorState::Collapsed),
            "out-of-sync" => Some(ErrorState::OutOfSync),
            "unconfirmed" => Some(ErrorState::Unconfirmed),
            "ok" => Some(ErrorState::Ok),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorState::Ok
    }

    fn is_failure(self) -> bool {
        matches!(
            self,
            ErrorState::Uninitialized | ErrorState::Collapsed | ErrorState::OutOfSync
        )
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Repeat counter limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    ceiling: u8,
    threshold: u8,
}

impl Debounce {
    pub fn new(ceiling: u8, threshold: u8) -> Result<Self, &'static str> {
        if threshold > ceiling {
            return Err("Confirmation threshold above the repeat ceiling");
        }
        Ok(Self { ceiling, threshold })
    }

    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            ceiling: REPEAT_CEILING,
            threshold: CONFIRM_THRESHOLD,
        }
    }
}

/// What one completed scan cycle produced
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    Value(f64),
    Collapsed,
    OutOfSync,
}

/// Debounce state machine over successive cycle outcomes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Confidence {
    value: f64,
    candidate: bool, // A valid value has been seen; `value` is no longer the placeholder
    repeat: u8,
    state: ErrorState,
    debounce: Debounce,
}

impl Confidence {
    pub fn new(debounce: Debounce) -> Self {
        Self {
            value: 0.0,
            candidate: false,
            repeat: 0,
            state: ErrorState::Uninitialized,
            debounce,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn repeat(&self) -> u8 {
        self.repeat
    }

    pub fn state(&self) -> ErrorState {
        self.state
    }

    pub fn apply(&mut self, outcome: CycleOutcome) {
        match outcome {
            CycleOutcome::Value(next) => self.accept(next),
            CycleOutcome::Collapsed => self.reject(ErrorState::Collapsed),
            CycleOutcome::OutOfSync => self.reject(ErrorState::OutOfSync),
        }
    }

    // Failures drain the counter; the state follows once it is empty
    fn reject(&mut self, failure: ErrorState) {
        if self.state == ErrorState::Uninitialized {
            self.state = failure;
            self.repeat = 0;
            return;
        }

        self.repeat = self.repeat.saturating_sub(1);
        if self.repeat == 0 && self.state != failure {
            if self.state.is_ok() {
                warn!("Confirmed value {} lost: {}", self.value, failure);
            }
            self.state = failure;
        }
    }

    fn accept(&mut self, next: f64) {
        if self.state.is_failure() {
            self.state = ErrorState::Unconfirmed;
        }

        // Exact comparison, the value comes from integer digits
        if self.candidate && next == self.value {
            self.repeat = self.repeat.saturating_add(1).min(self.debounce.ceiling);
            if self.state == ErrorState::Unconfirmed && self.repeat >= self.debounce.threshold {
                info!("Value {} confirmed after {} repeats", self.value, self.repeat);
                self.state = ErrorState::Ok;
            }
        } else {
            self.repeat = 0;
            self.state = ErrorState::Unconfirmed;
            self.value = next;
            self.candidate = true;
        }
    }
}
