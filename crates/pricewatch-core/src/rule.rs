//! Pricing rules.
//!
//! A [`Rule`] is a named, prioritized pair of closures: a predicate that
//! decides whether the rule applies to a product, and an action that maps a
//! price to a new price. Both must be pure. New rules are added by building
//! another `Rule` and inserting it into a [`RuleChain`](crate::chain::RuleChain);
//! no existing rule has to change.
//!
//! # Default rules
//!
//! | Priority | Name | Predicate | Action |
//! |----------|------|-----------|--------|
//! | 1 | Low Stock, High Demand | `stock < 20 && sold > 30` | `price * 1.15` |
//! | 2 | Dead Stock | `stock > 200 && sold == 0` | `price * 0.70` |
//! | 3 | Overstocked Inventory | `stock > 100 && sold < 20` | `price * 0.90` |
//! | floor | Minimum Profit Constraint | always | `max(price, cost * (1 + margin))` |

use rust_decimal::Decimal;
use std::fmt;

use crate::models::{round_price, round_price_up, ProductRecord};

pub const LOW_STOCK_HIGH_DEMAND: &str = "Low Stock, High Demand";
pub const DEAD_STOCK: &str = "Dead Stock";
pub const OVERSTOCKED_INVENTORY: &str = "Overstocked Inventory";
pub const MINIMUM_PROFIT: &str = "Minimum Profit Constraint";

/// Default minimum margin over cost enforced by the floor rule (20%).
pub fn default_floor_margin() -> Decimal {
    Decimal::new(20, 2)
}

type Predicate = dyn Fn(&ProductRecord, u64) -> bool + Send + Sync;
type Action = dyn Fn(&ProductRecord, Decimal) -> Decimal + Send + Sync;

/// A single named pricing rule.
pub struct Rule {
    name: String,
    priority: i32,
    description: String,
    predicate: Box<Predicate>,
    action: Box<Action>,
}

impl Rule {
    /// Build a rule from a predicate over `(product, quantity_sold)` and an
    /// action over `(product, price)`.
    pub fn new<P, A>(name: impl Into<String>, priority: i32, predicate: P, action: A) -> Self
    where
        P: Fn(&ProductRecord, u64) -> bool + Send + Sync + 'static,
        A: Fn(&ProductRecord, Decimal) -> Decimal + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            description: String::new(),
            predicate: Box::new(predicate),
            action: Box::new(action),
        }
    }

    /// Attach a one-line human description, shown by `pricewatch rules`.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn should_apply(&self, product: &ProductRecord, quantity_sold: u64) -> bool {
        (self.predicate)(product, quantity_sold)
    }

    /// Apply the action to the product's current price.
    pub fn apply(&self, product: &ProductRecord) -> Decimal {
        self.apply_to(product, product.current_price)
    }

    /// Apply the action to an explicit price, rounded to two places.
    pub fn apply_to(&self, product: &ProductRecord, price: Decimal) -> Decimal {
        round_price((self.action)(product, price))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Increase price by 15% when stock is low and demand is high.
pub fn low_stock_high_demand(priority: i32) -> Rule {
    Rule::new(
        LOW_STOCK_HIGH_DEMAND,
        priority,
        |p, sold| p.stock < 20 && sold > 30,
        |_, price| price * Decimal::new(115, 2),
    )
    .describe("stock < 20 and quantity_sold > 30: price * 1.15")
}

/// Cut price by 30% when there is a lot of stock and nothing sold.
pub fn dead_stock(priority: i32) -> Rule {
    Rule::new(
        DEAD_STOCK,
        priority,
        |p, sold| p.stock > 200 && sold == 0,
        |_, price| price * Decimal::new(70, 2),
    )
    .describe("stock > 200 and quantity_sold == 0: price * 0.70")
}

/// Cut price by 10% when stock is high and sales are slow.
pub fn overstocked_inventory(priority: i32) -> Rule {
    Rule::new(
        OVERSTOCKED_INVENTORY,
        priority,
        |p, sold| p.stock > 100 && sold < 20,
        |_, price| price * Decimal::new(90, 2),
    )
    .describe("stock > 100 and quantity_sold < 20: price * 0.90")
}

/// The always-applied floor: price never drops below `cost * (1 + margin)`.
///
/// The minimum is rounded up to the cent so the rounded result still
/// satisfies the bound.
pub fn minimum_profit(margin: Decimal) -> Rule {
    let factor = Decimal::ONE + margin;
    Rule::new(
        MINIMUM_PROFIT,
        i32::MAX,
        |_, _| true,
        move |p, price| price.max(round_price_up(p.cost_price * factor)),
    )
    .describe(format!("always: price = max(price, cost_price * {})", factor))
}

/// The three default exclusivity rules, in priority order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        low_stock_high_demand(1),
        dead_stock(2),
        overstocked_inventory(3),
    ]
}
