use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commission percentages applied to a settled payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatePair {
    pub coach_rate: Decimal,
    pub platform_rate: Decimal,
}

/// Both amounts always sum to the settled total exactly; the ledger
/// reconciles on that property.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RevenueSplit {
    pub coach_amount: Decimal,
    pub platform_amount: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("commission rates must sum to 100: coach {coach_rate} + platform {platform_rate}")]
    InvalidRateSum {
        coach_rate: Decimal,
        platform_rate: Decimal,
    },

    #[error("payment amount must be positive: {0}")]
    InvalidAmount(Decimal),
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Splits `total` between coach and platform. Each side is rounded to the
/// currency's minor unit; any rounding residue goes in full to the larger
/// side (coach on ties) so the two amounts reproduce `total` exactly.
pub fn split(
    total: Decimal,
    coach_rate: Decimal,
    platform_rate: Decimal,
) -> Result<RevenueSplit, SplitError> {
    if total <= Decimal::ZERO {
        return Err(SplitError::InvalidAmount(total));
    }

    let tolerance = Decimal::new(1, 2);
    if (coach_rate + platform_rate - Decimal::ONE_HUNDRED).abs() > tolerance {
        return Err(SplitError::InvalidRateSum {
            coach_rate,
            platform_rate,
        });
    }

    let mut coach_amount = round2(total * coach_rate / Decimal::ONE_HUNDRED);
    let mut platform_amount = round2(total * platform_rate / Decimal::ONE_HUNDRED);

    let diff = total - (coach_amount + platform_amount);
    if !diff.is_zero() {
        if coach_amount >= platform_amount {
            coach_amount += diff;
        } else {
            platform_amount += diff;
        }
    }

    Ok(RevenueSplit {
        coach_amount,
        platform_amount,
    })
}

/// Contractual breakpoints: bigger rosters keep a larger share.
pub fn rate_pair_for_student_count(student_count: i64) -> RatePair {
    if student_count <= 10 {
        RatePair {
            coach_rate: Decimal::from(88),
            platform_rate: Decimal::from(12),
        }
    } else if student_count <= 50 {
        RatePair {
            coach_rate: Decimal::from(90),
            platform_rate: Decimal::from(10),
        }
    } else {
        RatePair {
            coach_rate: Decimal::from(92),
            platform_rate: Decimal::from(8),
        }
    }
}

pub fn split_by_student_count(
    total: Decimal,
    student_count: i64,
) -> Result<RevenueSplit, SplitError> {
    let rates = rate_pair_for_student_count(student_count);
    split(total, rates.coach_rate, rates.platform_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn splits_the_contract_example() {
        let result = split(dec("1000"), dec("88"), dec("12")).unwrap();
        assert_eq!(result.coach_amount, dec("880"));
        assert_eq!(result.platform_amount, dec("120"));
    }

    #[test]
    fn moves_rounding_residue_onto_the_larger_side() {
        // 50.005 rounds away from zero on both sides, overshooting by a cent.
        let total = dec("100.01");
        let result = split(total, dec("50"), dec("50")).unwrap();

        assert_eq!(result.coach_amount + result.platform_amount, total);
        assert_eq!(result.coach_amount, dec("50.00"));
        assert_eq!(result.platform_amount, dec("50.01"));
    }

    #[test]
    fn amounts_always_sum_to_the_total() {
        let totals = ["0.01", "0.03", "19.99", "100.01", "333.33", "1000", "12345.67"];
        let rates = [("88", "12"), ("90", "10"), ("92", "8"), ("50", "50"), ("66.5", "33.5")];

        for total in totals {
            for (coach_rate, platform_rate) in rates {
                let total = dec(total);
                let result = split(total, dec(coach_rate), dec(platform_rate)).unwrap();
                assert_eq!(
                    result.coach_amount + result.platform_amount,
                    total,
                    "split({total}, {coach_rate}, {platform_rate}) lost money"
                );
            }
        }
    }

    #[test]
    fn is_deterministic() {
        let first = split(dec("333.33"), dec("88"), dec("12")).unwrap();
        let second = split(dec("333.33"), dec("88"), dec("12")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_rates_that_do_not_sum_to_100() {
        let result = split(dec("1000"), dec("88"), dec("13"));
        assert_eq!(
            result,
            Err(SplitError::InvalidRateSum {
                coach_rate: dec("88"),
                platform_rate: dec("13"),
            })
        );
    }

    #[test]
    fn tolerates_drift_within_a_cent() {
        assert!(split(dec("1000"), dec("88.004"), dec("12")).is_ok());
        assert!(split(dec("1000"), dec("88.02"), dec("12")).is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert_eq!(
            split(Decimal::ZERO, dec("88"), dec("12")),
            Err(SplitError::InvalidAmount(Decimal::ZERO))
        );
        assert_eq!(
            split(dec("-5"), dec("88"), dec("12")),
            Err(SplitError::InvalidAmount(dec("-5")))
        );
    }

    #[test]
    fn tier_breakpoints_match_the_contract() {
        let cases = [
            (1, "88", "12"),
            (10, "88", "12"),
            (11, "90", "10"),
            (50, "90", "10"),
            (51, "92", "8"),
            (500, "92", "8"),
        ];

        for (count, coach_rate, platform_rate) in cases {
            let rates = rate_pair_for_student_count(count);
            assert_eq!(rates.coach_rate, dec(coach_rate), "count {count}");
            assert_eq!(rates.platform_rate, dec(platform_rate), "count {count}");
        }
    }

    #[test]
    fn tiered_split_delegates_to_the_fixed_split() {
        let tiered = split_by_student_count(dec("1000"), 10).unwrap();
        assert_eq!(tiered, split(dec("1000"), dec("88"), dec("12")).unwrap());

        let tiered = split_by_student_count(dec("1000"), 11).unwrap();
        assert_eq!(tiered, split(dec("1000"), dec("90"), dec("10")).unwrap());
    }
}
