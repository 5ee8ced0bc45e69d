use crate::segments::SegmentTable;

/// What the segment lines of one sample showed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Digit(u8), // Exact match against a digit pattern
    Blank,     // No segment lit
    Collapsed, // Segments lit, but no digit looks like this
}

/// Classification of one display position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedDigit {
    pub glyph: Glyph,
    pub decimal_point: bool,
    pub out_of_sync: bool,
}

impl DecodedDigit {
    /// State of a position that has not been sampled yet
    pub const fn blank() -> Self {
        Self {
            glyph: Glyph::Blank,
            decimal_point: false,
            out_of_sync: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.glyph == Glyph::Blank
    }

    pub fn is_collapsed(&self) -> bool {
        self.glyph == Glyph::Collapsed
    }

    pub fn digit(&self) -> Option<u8> {
        match self.glyph {
            Glyph::Digit(d) => Some(d),
            _ => None,
        }
    }

    /// Contribution to the display magnitude; blanks count as zero
    pub fn magnitude(&self) -> Option<u8> {
        match self.glyph {
            Glyph::Digit(d) => Some(d),
            Glyph::Blank => Some(0),
            Glyph::Collapsed => None,
        }
    }
}

impl Default for DecodedDigit {
    fn default() -> Self {
        Self::blank()
    }
}

/// Classifies the segment bits of a snapshot. `out_of_sync` is left clear.
pub fn decode(snapshot: u32, digit_mask: u32, dp_mask: u32, patterns: &[u32; 10]) -> DecodedDigit {
    let lit = snapshot & digit_mask;

    let glyph = if lit == 0 {
        Glyph::Blank
    } else {
        patterns
            .iter()
            .position(|&pattern| pattern == lit)
            .map(|digit| Glyph::Digit(digit as u8))
            .unwrap_or(Glyph::Collapsed)
    };

    DecodedDigit {
        glyph,
        decimal_point: snapshot & dp_mask != 0,
        out_of_sync: false,
    }
}

impl SegmentTable {
    /// Decodes a snapshot whose segment bits are already active-high
    pub fn decode(&self, snapshot: u32) -> DecodedDigit {
        decode(snapshot, self.digit_mask(), self.dp_mask(), self.patterns())
    }
}

#[cfg(test)]
mod decoder_tests {
    use super::*;

    #[test]
    fn test_every_digit_decodes() {
        let table = SegmentTable::default();
        for digit in 0..10u8 {
            let snapshot = table.pattern(digit).unwrap();
            let decoded = table.decode(snapshot);
            assert_eq!(decoded.glyph, Glyph::Digit(digit));
            assert!(!decoded.is_null());
            assert!(!decoded.is_collapsed());
            assert!(!decoded.decimal_point);
        }
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let table = SegmentTable::default();
        // Select lines and other noise outside the segment bus
        let noise = !table.bus_mask();
        let decoded = table.decode(table.pattern(4).unwrap() | noise);
        assert_eq!(decoded.digit(), Some(4));
        assert!(!decoded.decimal_point);
    }

    #[test]
    fn test_blank_regardless_of_dp() {
        let table = SegmentTable::default();
        assert!(table.decode(0).is_null());
        let with_dp = table.decode(table.dp_mask());
        assert!(with_dp.is_null());
        assert!(with_dp.decimal_point);
        assert_eq!(with_dp.magnitude(), Some(0));
    }

    #[test]
    fn test_partial_pattern_collapses() {
        let table = SegmentTable::default();
        // Segment a alone is no digit
        let a_only = 1 << table.mapping().line(0);
        let decoded = table.decode(a_only);
        assert!(decoded.is_collapsed());
        assert_eq!(decoded.digit(), None);
        assert_eq!(decoded.magnitude(), None);

        // 8 missing e reads as 9, missing e and g matches nothing
        let eight = table.pattern(8).unwrap();
        let without_e = eight & !(1 << table.mapping().line(4));
        assert_eq!(table.decode(without_e).digit(), Some(9));
        let without_e_and_g = without_e & !(1 << table.mapping().line(6));
        assert!(table.decode(without_e_and_g).is_collapsed());
    }

    #[test]
    fn test_dp_with_digit() {
        let table = SegmentTable::default();
        let decoded = table.decode(table.pattern(2).unwrap() | table.dp_mask());
        assert_eq!(decoded.digit(), Some(2));
        assert!(decoded.decimal_point);
    }
}
