use crate::utils::line_bit;
use crate::wiring::Polarity;

/// True when a select line other than `trigger` was asserted in `snapshot`.
///
/// Positions share the segment bus, so a sample is only attributable to the
/// triggering position while every other select line of the display is idle.
pub fn check_sync(snapshot: u32, select_mask: u32, trigger: u8, polarity: Polarity) -> bool {
    let others = select_mask & !line_bit(trigger);
    polarity.asserted(snapshot, others) != 0
}

#[cfg(test)]
mod sync_tests {
    use super::*;

    const A: u8 = 4;
    const B: u8 = 7;
    const C: u8 = 8;
    const SELECT: u32 = (1 << A) | (1 << B) | (1 << C);

    #[test]
    fn test_in_sync_active_low() {
        // A pulled low, B and C idle high
        let snapshot = (1 << B) | (1 << C);
        assert!(!check_sync(snapshot, SELECT, A, Polarity::ActiveLow));
    }

    #[test]
    fn test_out_of_sync_active_low() {
        // B still low while A strobes
        assert!(check_sync(1 << C, SELECT, A, Polarity::ActiveLow));
        // C low as well
        assert!(check_sync(0, SELECT, A, Polarity::ActiveLow));
        // only C low
        assert!(check_sync(1 << B, SELECT, A, Polarity::ActiveLow));
    }

    #[test]
    fn test_trigger_level_is_not_checked() {
        // The triggering line may already have bounced back
        let snapshot = (1 << A) | (1 << B) | (1 << C);
        assert!(!check_sync(snapshot, SELECT, A, Polarity::ActiveLow));
    }

    #[test]
    fn test_active_high_select() {
        assert!(!check_sync(1 << A, SELECT, A, Polarity::ActiveHigh));
        assert!(check_sync((1 << A) | (1 << C), SELECT, A, Polarity::ActiveHigh));
    }

    #[test]
    fn test_lines_outside_display_ignored() {
        // Every line idle high except A and the foreign lines 0 and 9
        let snapshot = u32::MAX & !(1 << A) & !(1 << 0) & !(1 << 9);
        assert!(!check_sync(snapshot, SELECT, A, Polarity::ActiveLow));
        // Foreign lines high under active-high select
        let snapshot = (1 << A) | (1 << 0) | (1 << 9);
        assert!(!check_sync(snapshot, SELECT, A, Polarity::ActiveHigh));
    }
}
