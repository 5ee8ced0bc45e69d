use ssd_core::{EdgeEvent, Level, LineSource};

/// An edge together with the bank state read when it fired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capture {
    pub edge: EdgeEvent,
    pub snapshot: u32,
}

impl Capture {
    pub fn new(line: u8, level: Level, tick: u32, snapshot: u32) -> Self {
        Capture {
            edge: EdgeEvent::new(line, level, tick),
            snapshot,
        }
    }
}

impl LineSource for Capture {
    fn read_bank(&self) -> u32 {
        self.snapshot
    }
}
