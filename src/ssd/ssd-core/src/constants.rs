// Width of the line bank read in one snapshot (GPIO 0-31)
pub const MAX_LINES: u8 = 32;

// Fixed capacities for per-display and per-handler storage
pub const MAX_POSITIONS: usize = 8;
pub const MAX_DISPLAYS: usize = 8;

// Positions on the reference display
pub const DEFAULT_POSITIONS: usize = 3;

pub mod segments {
    // Number of segment roles (a-g plus decimal point)
    pub const SEGMENT_ROLES: usize = 8;

    // Role indexes into a segment mapping
    pub const ROLE_A: usize = 0;
    pub const ROLE_B: usize = 1;
    pub const ROLE_C: usize = 2;
    pub const ROLE_D: usize = 3;
    pub const ROLE_E: usize = 4;
    pub const ROLE_F: usize = 5;
    pub const ROLE_G: usize = 6;
    pub const ROLE_DP: usize = 7;

    // Canonical digit patterns, bit0 = a ... bit6 = g
    pub const SEVEN_SEG_TABLE: [u8; 10] = [
        0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F,
    ];

    // Reference rig wiring: a b c d e f g DP
    pub const DEFAULT_SEGMENT_LINES: [u8; SEGMENT_ROLES] = [26, 19, 13, 6, 5, 22, 27, 17];
}

pub mod debounce {
    // Saturation ceiling for the repeat counter
    pub const REPEAT_CEILING: u8 = 50;

    // Matching cycles needed before a candidate value is trusted
    pub const CONFIRM_THRESHOLD: u8 = 5;
}
