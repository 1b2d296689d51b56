//! Fee rule model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison between the amount and a rule's threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Operator {
    pub fn matches(self, amount: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => amount < threshold,
            Self::Le => amount <= threshold,
            Self::Gt => amount > threshold,
            Self::Ge => amount >= threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            other => Err(other.to_string()),
        }
    }
}

/// What a matching rule charges: a percentage of the amount (0-100) or a
/// fixed sum in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Charge {
    Percent(f64),
    Fixed(f64),
}

impl Charge {
    /// Charged when no rule matches
    pub const NONE: Charge = Charge::Fixed(0.0);

    pub fn apply(self, amount: f64) -> f64 {
        match self {
            Self::Percent(value) => amount * value / 100.0,
            Self::Fixed(value) => value,
        }
    }
}

impl Default for Charge {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRule {
    pub operator: Operator,
    pub threshold: f64,
    pub charge: Charge,
}

impl FeeRule {
    pub fn new(operator: Operator, threshold: f64, charge: Charge) -> Self {
        Self {
            operator,
            threshold,
            charge,
        }
    }

    pub fn matches(&self, amount: f64) -> bool {
        self.operator.matches(amount, self.threshold)
    }
}

impl fmt::Display for FeeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.charge {
            Charge::Percent(v) => write!(f, "amount {} {} => {}%", self.operator, self.threshold, v),
            Charge::Fixed(v) => write!(f, "amount {} {} => {} fixed", self.operator, self.threshold, v),
        }
    }
}

/// Rules in authoring order; the first one that matches wins
pub type FeeRuleSet = Vec<FeeRule>;
