//! Ordered rule chain.
//!
//! A [`RuleChain`] holds the exclusivity rules sorted by ascending priority
//! and one floor rule that always runs last.
//!
//! # Evaluation
//!
//! 1. Walk the exclusivity rules in priority order.
//! 2. The first rule whose predicate matches produces the candidate price;
//!    no later exclusivity rule is consulted.
//! 3. With no match, the candidate is the current price.
//! 4. The floor rule is applied to the candidate exactly once.
//!
//! Rules with equal priority keep insertion order: the one added first is
//! evaluated first.

use rust_decimal::Decimal;

use crate::models::{round_price, ProductRecord};
use crate::rule::{self, Rule};

/// Outcome of running one product through the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Name of the exclusivity rule that fired, if any.
    pub applied_rule: Option<String>,
    /// Price after the exclusivity step, before the floor.
    pub candidate_price: Decimal,
    /// Final price after the floor.
    pub new_price: Decimal,
}

impl Evaluation {
    /// True when the floor rule changed the candidate price.
    pub fn floor_raised(&self) -> bool {
        self.new_price > self.candidate_price
    }
}

#[derive(Debug)]
pub struct RuleChain {
    rules: Vec<Rule>,
    floor: Rule,
}

impl RuleChain {
    /// An empty chain with only the given floor rule.
    pub fn new(floor: Rule) -> Self {
        Self {
            rules: Vec::new(),
            floor,
        }
    }

    /// The default three exclusivity rules plus the 20% minimum-profit floor.
    pub fn with_default_rules() -> Self {
        let mut chain = Self::new(rule::minimum_profit(rule::default_floor_margin()));
        for r in rule::default_rules() {
            chain.add_rule(r);
        }
        chain
    }

    /// Insert a rule after every rule with a lower or equal priority.
    pub fn add_rule(&mut self, rule: Rule) {
        let pos = self
            .rules
            .partition_point(|existing| existing.priority() <= rule.priority());
        self.rules.insert(pos, rule);
    }

    /// Remove every exclusivity rule named `name`. Returns whether any was removed.
    ///
    /// The floor rule cannot be removed.
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.name() != name);
        self.rules.len() != before
    }

    /// Replace the floor rule.
    pub fn set_floor(&mut self, floor: Rule) {
        self.floor = floor;
    }

    /// Exclusivity rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn floor(&self) -> &Rule {
        &self.floor
    }

    /// Whether an exclusivity rule or the floor carries this name.
    pub fn contains(&self, name: &str) -> bool {
        self.floor.name() == name || self.rules.iter().any(|r| r.name() == name)
    }

    /// Run one product through the chain.
    pub fn evaluate(&self, product: &ProductRecord, quantity_sold: u64) -> Evaluation {
        let matched = self
            .rules
            .iter()
            .find(|r| r.should_apply(product, quantity_sold));

        let (applied_rule, candidate_price) = match matched {
            Some(r) => (Some(r.name().to_string()), r.apply(product)),
            None => (None, round_price(product.current_price)),
        };

        let new_price = self.floor.apply_to(product, candidate_price);

        Evaluation {
            applied_rule,
            candidate_price,
            new_price,
        }
    }
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
