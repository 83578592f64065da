//! Fixed-point ratio helpers.
//!
//! Derived statistics (production cost per move, move efficiency) are
//! ratios. They use fixed-point arithmetic so repeated runs produce
//! bit-identical reports on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for derived statistics.
///
/// 32 integer bits and 32 fractional bits.
pub type Fixed = I32F32;

/// Smoothing term added to the territory denominator of move efficiency.
#[must_use]
pub fn efficiency_epsilon() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(100)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> Option<Fixed> {
    if denominator == 0 {
        return None;
    }
    let n = Fixed::saturating_from_num(numerator);
    let d = Fixed::saturating_from_num(denominator);
    n.checked_div(d)
}

/// Share of held squares that moved: `moves / (territory + 0.01)`.
#[must_use]
pub fn move_efficiency(moves: u64, territory: u64) -> Fixed {
    let n = Fixed::saturating_from_num(moves);
    let d = Fixed::saturating_from_num(territory).saturating_add(efficiency_epsilon());
    n.checked_div(d).unwrap_or(Fixed::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(10, 4), Some(Fixed::from_num(2.5)));
        assert_eq!(ratio(3, 0), None);
        assert_eq!(ratio(0, 7), Some(Fixed::ZERO));
    }

    #[test]
    fn test_move_efficiency_empty_segment_is_zero() {
        assert_eq!(move_efficiency(0, 0), Fixed::ZERO);
    }

    #[test]
    fn test_move_efficiency_close_to_plain_ratio() {
        let e = move_efficiency(50, 100);
        let plain = Fixed::from_num(0.5);
        assert!(e < plain);
        assert!(plain - e < Fixed::from_num(0.001));
    }

    #[test]
    fn test_move_efficiency_is_deterministic() {
        assert_eq!(move_efficiency(123, 456), move_efficiency(123, 456));
    }
}
