use crate::constants::MAX_LINES;

// Single-bit mask for a line, empty when the line is outside the bank
pub fn line_bit(line: u8) -> u32 {
    if line < MAX_LINES {
        1 << line
    } else {
        0
    }
}

// Renders the low `width` bits of `value`, most significant first
pub fn format_bits(value: u32, width: u8) -> heapless::String<32> {
    let mut buf = heapless::String::new();
    let width = width.min(MAX_LINES);
    for i in (0..width).rev() {
        let bit = if value & (1 << i) != 0 { '1' } else { '0' };
        // Capacity matches MAX_LINES, so this never overflows
        let _ = buf.push(bit);
    }
    buf
}

// 10^exp as a float, exact for the exponents a display can produce
pub fn pow10(exp: usize) -> f64 {
    let mut scale = 1.0;
    for _ in 0..exp {
        scale *= 10.0;
    }
    scale
}
