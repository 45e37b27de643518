//! `pricewatch rules`: print the effective rule chain.

use anyhow::Result;
use pricewatch_core::RuleChain;

use crate::config::Config;

/// Render the chain in evaluation order, floor last.
pub fn format_rules(chain: &RuleChain) -> String {
    let mut out = format!("{:<6} {:<28} {}\n", "ORDER", "RULE", "EFFECT");
    for (i, rule) in chain.rules().iter().enumerate() {
        out.push_str(&format!(
            "{:<6} {:<28} {}\n",
            i + 1,
            rule.name(),
            rule.description()
        ));
    }
    let floor = chain.floor();
    out.push_str(&format!(
        "{:<6} {:<28} {}\n",
        "floor",
        floor.name(),
        floor.description()
    ));
    out
}

pub fn list_rules(config: &Config) -> Result<()> {
    print!("{}", format_rules(&config.rule_chain()));
    Ok(())
}
