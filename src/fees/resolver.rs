//! First-match-wins fee resolution

use serde::Serialize;
use tracing::trace;

use super::rules::{Charge, FeeRule};
use crate::validation::{validate_amount, ValidationError};

/// Result of charging an amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetAmount {
    pub charge: f64,
    pub net: f64,
}

/// Pick the charge of the first rule matching `amount`.
///
/// Rules are never reordered or merged: if several match, the earliest wins.
/// No match (or no rules) yields [`Charge::NONE`].
pub fn resolve(amount: f64, rules: &[FeeRule]) -> Result<Charge, ValidationError> {
    let amount = validate_amount(amount)?;

    let charge = rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches(amount))
        .map(|(index, rule)| {
            trace!("Amount {} matched fee rule #{}: {}", amount, index, rule);
            rule.charge
        })
        .unwrap_or(Charge::NONE);

    Ok(charge)
}

/// Monetary value of `charge` for `amount`. Keeping the result within
/// `0..=amount` is up to the rule data.
pub fn apply_charge(amount: f64, charge: Charge) -> f64 {
    charge.apply(amount)
}

pub fn net_after_charge(amount: f64, rules: &[FeeRule]) -> Result<NetAmount, ValidationError> {
    let charge = apply_charge(amount, resolve(amount, rules)?);

    Ok(NetAmount {
        charge,
        net: amount - charge,
    })
}
