//! Withdrawal tax and commission calculation

pub mod commission;
pub mod decode;
pub mod resolver;
pub mod rules;

pub use commission::{commission, CommissionSplit};
pub use decode::{decode_tax_rules, decode_tax_rules_or_empty, RuleDecodeError};
pub use resolver::{apply_charge, net_after_charge, resolve, NetAmount};
pub use rules::{Charge, FeeRule, FeeRuleSet, Operator};
