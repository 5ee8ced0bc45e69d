/// Level a line settled on after a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

/// One transition reported by the edge feed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEvent {
    pub line: u8,     // Line that changed (0-31)
    pub level: Level, // Level after the change
    pub tick: u32,    // Driver timestamp in microseconds, wraps
}

impl EdgeEvent {
    pub fn new(line: u8, level: Level, tick: u32) -> Self {
        Self { line, level, tick }
    }
}

/// Snapshot primitive of the acquisition layer
pub trait LineSource {
    /// Combined state of all monitored lines at this instant
    fn read_bank(&self) -> u32;
}

/// A bank value captured by the driver at edge time
impl LineSource for u32 {
    fn read_bank(&self) -> u32 {
        *self
    }
}
