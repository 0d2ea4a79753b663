use chrono::NaiveDate;

use super::Promotion;
use crate::errors::{BillingError, Result};

/// active and inside its (inclusive) date window on `reference_date`
pub fn is_eligible(promotion: &Promotion, reference_date: NaiveDate) -> bool {
    let starts_ok = promotion
        .start_date
        .map_or(true, |start| start <= reference_date);
    let ends_ok = promotion
        .end_date
        .map_or(true, |end| reference_date <= end);

    promotion.active && starts_ok && ends_ok
}

/// fails with `PromotionInactive`; callers abort the payment on failure
/// rather than falling back to a default period
pub fn check_eligibility(promotion: &Promotion, reference_date: NaiveDate) -> Result<()> {
    if is_eligible(promotion, reference_date) {
        Ok(())
    } else {
        Err(BillingError::PromotionInactive {
            id: promotion.id,
            reference_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotions::tests::draft;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn windowed() -> Promotion {
        let mut p = draft(100, Some(4));
        p.start_date = Some(d(2024, 1, 1));
        p.end_date = Some(d(2024, 12, 31));
        Promotion::create(p).unwrap()
    }

    #[test]
    fn test_inside_window() {
        let promo = windowed();
        assert!(check_eligibility(&promo, d(2024, 1, 1)).is_ok());
        assert!(check_eligibility(&promo, d(2024, 7, 14)).is_ok());
        assert!(check_eligibility(&promo, d(2024, 12, 31)).is_ok());
    }

    #[test]
    fn test_after_window() {
        let promo = windowed();
        let err = check_eligibility(&promo, d(2025, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            BillingError::PromotionInactive {
                id: promo.id,
                reference_date: d(2025, 1, 1),
            }
        );
    }

    #[test]
    fn test_before_window() {
        let promo = windowed();
        assert!(!is_eligible(&promo, d(2023, 12, 31)));
    }

    #[test]
    fn test_inactive_flag() {
        let mut promo = windowed();
        promo.active = false;
        assert!(check_eligibility(&promo, d(2024, 6, 1)).is_err());
    }

    #[test]
    fn test_open_ended_window() {
        let promo = Promotion::create(draft(80, None)).unwrap();
        assert!(is_eligible(&promo, d(1999, 1, 1)));
        assert!(is_eligible(&promo, d(2099, 1, 1)));
    }
}
