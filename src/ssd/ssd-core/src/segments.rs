use crate::constants::segments::{
    DEFAULT_SEGMENT_LINES, ROLE_DP, ROLE_G, SEGMENT_ROLES, SEVEN_SEG_TABLE,
};
use crate::constants::MAX_LINES;
use crate::utils::{format_bits, line_bit};

use log::info;

/// Line assignment for each segment role, in a b c d e f g DP order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentMapping {
    lines: [u8; SEGMENT_ROLES],
}

impl SegmentMapping {
    /// Validates a mapping; every role needs its own line inside the bank
    pub fn new(lines: [u8; SEGMENT_ROLES]) -> Result<Self, &'static str> {
        let mut seen = 0u32;
        for &line in lines.iter() {
            if line >= MAX_LINES {
                return Err("Segment line outside of the 0-31 bank");
            }
            if seen & line_bit(line) != 0 {
                return Err("Segment line assigned to more than one role");
            }
            seen |= line_bit(line);
        }
        Ok(Self { lines })
    }

    /// Builds a mapping from a slice, as parsed from configuration
    pub fn from_slice(lines: &[u8]) -> Result<Self, &'static str> {
        if lines.len() != SEGMENT_ROLES {
            return Err("Segment mapping needs exactly 8 lines (a b c d e f g DP)");
        }
        let mut fixed = [0u8; SEGMENT_ROLES];
        fixed.copy_from_slice(lines);
        Self::new(fixed)
    }

    pub fn line(&self, role: usize) -> u8 {
        self.lines[role]
    }

    pub fn lines(&self) -> &[u8; SEGMENT_ROLES] {
        &self.lines
    }
}

impl Default for SegmentMapping {
    fn default() -> Self {
        Self {
            lines: DEFAULT_SEGMENT_LINES,
        }
    }
}

/// Bank-level masks and digit patterns compiled from a mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentTable {
    mapping: SegmentMapping,
    digit_mask: u32,         // Lines carrying segments a-g
    dp_mask: u32,            // Line carrying the decimal point
    patterns: [u32; 10],     // Bank pattern per digit, 0-9
}

impl SegmentTable {
    pub fn new(mapping: SegmentMapping) -> Self {
        let mut digit_mask = 0;
        for role in 0..=ROLE_G {
            digit_mask |= line_bit(mapping.line(role));
        }

        let mut patterns = [0u32; 10];
        for (digit, segs) in SEVEN_SEG_TABLE.iter().enumerate() {
            for role in 0..=ROLE_G {
                if segs & (1 << role) != 0 {
                    patterns[digit] |= line_bit(mapping.line(role));
                }
            }
        }

        Self {
            mapping,
            digit_mask,
            dp_mask: line_bit(mapping.line(ROLE_DP)),
            patterns,
        }
    }

    pub fn mapping(&self) -> &SegmentMapping {
        &self.mapping
    }

    pub fn digit_mask(&self) -> u32 {
        self.digit_mask
    }

    pub fn dp_mask(&self) -> u32 {
        self.dp_mask
    }

    /// Every line used by the segment bus
    pub fn bus_mask(&self) -> u32 {
        self.digit_mask | self.dp_mask
    }

    pub fn patterns(&self) -> &[u32; 10] {
        &self.patterns
    }

    /// Bank pattern for a digit, if it is one
    pub fn pattern(&self, digit: u8) -> Option<u32> {
        self.patterns.get(digit as usize).copied()
    }

    /// Logs the compiled masks the way the acquisition tool prints them at startup
    pub fn log_summary(&self) {
        info!(
            "seg_bitpattern_digit_mask: {} (gpio: 0-27)",
            format_bits(self.digit_mask, 28)
        );
        info!(
            "seg_bitpattern_fp_mask:    {} (gpio: 0-27)",
            format_bits(self.dp_mask, 28)
        );
        for (digit, pattern) in self.patterns.iter().enumerate() {
            info!(
                "[{}] {} (abcdefg) => {} (gpio: 0-27)",
                digit,
                format_bits(SEVEN_SEG_TABLE[digit] as u32, 7),
                format_bits(*pattern, 28)
            );
        }
    }
}

impl Default for SegmentTable {
    fn default() -> Self {
        Self::new(SegmentMapping::default())
    }
}
