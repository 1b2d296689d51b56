use serde::Serialize;

use super::rules::Charge;
use crate::validation::{validate_amount, validate_percentage, ValidationError};

/// Split of a sale between the affiliate's commission and the remainder
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommissionSplit {
    pub gross: f64,
    pub commission: f64,
    pub remainder: f64,
}

pub fn commission(amount: f64, percent: f64) -> Result<CommissionSplit, ValidationError> {
    let gross = validate_amount(amount)?;
    let percent = validate_percentage(percent)?;
    let commission = Charge::Percent(percent).apply(gross);

    Ok(CommissionSplit {
        gross,
        commission,
        remainder: gross - commission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_split() {
        let split = commission(200.0, 12.5).unwrap();
        assert_eq!(split.commission, 25.0);
        assert_eq!(split.remainder, 175.0);
        assert_eq!(split.gross, 200.0);
    }

    #[test]
    fn test_commission_rejects_bad_input() {
        assert_eq!(commission(-1.0, 10.0), Err(ValidationError::InvalidAmount(-1.0)));
        assert_eq!(commission(100.0, 120.0), Err(ValidationError::InvalidPercentage(120.0)));
    }
}
