//! Order total rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on order totals.
pub const TOTAL_SCALE: u32 = 2;

/// Sum `quantity × unit price` over `lines`, rounded half-up to two places.
///
/// Rounding is applied once to the sum, never per line.
pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (u32, Decimal)>,
{
    lines
        .into_iter()
        .map(|(quantity, price)| Decimal::from(quantity) * price)
        .sum::<Decimal>()
        .round_dp_with_strategy(TOTAL_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_then_rounds_to_cents() {
        let total = order_total([(2, Decimal::new(9_995, 3)), (1, Decimal::new(500, 2))]);

        assert_eq!(total, Decimal::new(2_499, 2));
    }

    #[test]
    fn midpoint_rounds_up() {
        assert_eq!(order_total([(1, Decimal::new(1_005, 3))]), Decimal::new(101, 2));
        assert_eq!(order_total([(3, Decimal::new(335, 3))]), Decimal::new(101, 2));
    }

    #[test]
    fn below_midpoint_rounds_down() {
        assert_eq!(order_total([(1, Decimal::new(10_049, 4))]), Decimal::new(100, 2));
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(order_total(Vec::<(u32, Decimal)>::new()), Decimal::ZERO);
    }
}
