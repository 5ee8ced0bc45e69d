use crate::lines::Level;

/// Electrical sense of a group of lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    ActiveLow,  // Line reads 0 while asserted (reference select wiring)
    ActiveHigh, // Line reads 1 while asserted (reference segment wiring)
}

impl Polarity {
    /// Lines of `mask` that read asserted in `snapshot`
    pub fn asserted(self, snapshot: u32, mask: u32) -> u32 {
        match self {
            Polarity::ActiveLow => !snapshot & mask,
            Polarity::ActiveHigh => snapshot & mask,
        }
    }

    /// Rewrites a snapshot so that asserted lines read as set bits
    pub fn normalize(self, snapshot: u32) -> u32 {
        match self {
            Polarity::ActiveLow => !snapshot,
            Polarity::ActiveHigh => snapshot,
        }
    }

    /// Whether a transition to `level` asserts the line
    pub fn is_asserting(self, level: Level) -> bool {
        match self {
            Polarity::ActiveLow => level == Level::Low,
            Polarity::ActiveHigh => level == Level::High,
        }
    }
}

/// Polarity of the select lines and of the shared segment bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wiring {
    pub select: Polarity,
    pub segments: Polarity,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            select: Polarity::ActiveLow,
            segments: Polarity::ActiveHigh,
        }
    }
}
