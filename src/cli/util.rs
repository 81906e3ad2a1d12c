use rust_decimal::{Decimal, RoundingStrategy};

/// Whole-peso currency display: `$ 1.234.567`, `-$ 1.300`.
pub fn format_currency(value: &Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-$ {grouped}")
    } else {
        format!("$ {grouped}")
    }
}

pub fn fmt_percent(d: &Decimal) -> String {
    format!("{}%", d.floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_currency(&Decimal::from(0)), "$ 0");
        assert_eq!(format_currency(&Decimal::from(999)), "$ 999");
        assert_eq!(format_currency(&Decimal::from(1000)), "$ 1.000");
        assert_eq!(format_currency(&Decimal::from(1234567)), "$ 1.234.567");
    }

    #[test]
    fn negatives_and_fractions() {
        assert_eq!(format_currency(&Decimal::from(-1300)), "-$ 1.300");
        assert_eq!(format_currency(&Decimal::new(15, 1)), "$ 2");
        assert_eq!(format_currency(&Decimal::new(-4, 1)), "$ 0");
    }

    #[test]
    fn percent_is_floored() {
        assert_eq!(fmt_percent(&Decimal::new(759, 1)), "75%");
    }
}
