//! Deterministic assembler - the one canonical rule order
//!
//! Rules are ordered by case-insensitive name; the sort is stable, so names
//! that differ only in case keep their insertion order. Emitters consume
//! this order as-is.

use crate::rule::Rule;
use crate::store::RuleSlots;

pub fn assemble(slots: RuleSlots) -> Vec<Rule> {
    let mut rules = slots.into_rules();
    rules.sort_by_cached_key(Rule::sort_key);
    rules
}
