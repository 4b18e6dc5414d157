//! Price resolution for cart totals.
//!
//! Plans reach the cart in three shapes: a catalog plan, a persisted cart
//! item, or a bare legacy plan name. Each call site wraps its value in the
//! matching `PriceSource` variant.
//!
//! Resolution order (first match wins):
//! 1. explicit `numeric_price` (cart items only), returned verbatim, `0` included
//! 2. display price `"Free"` / `"Custom"` → 0
//! 3. display price stripped of `₹`, `,` and whitespace; its leading digit
//!    run is the amount (`"₹19,999.00"` and `"₹19,999/year"` are both 19999)
//! 4. legacy name lookup (bare names only)
//! 5. anything else → 0

use crate::cart::CartItem;

use super::plans::Plan;

#[derive(Debug, Clone, Copy)]
pub enum PriceSource<'a> {
    CatalogPlan(&'a Plan),
    CartItem(&'a CartItem),
    LegacyName(&'a str),
}

const LEGACY_PRICES: &[(&str, u64)] = &[
    ("Basic", 1999),
    ("Starter", 19999),
    ("Professional", 39999),
    ("Enterprise", 0),
    ("Free", 0),
];

pub fn resolve_price(source: PriceSource<'_>) -> u64 {
    match source {
        PriceSource::CatalogPlan(plan) => parse_display_price(plan.price).unwrap_or(0),
        PriceSource::CartItem(item) => {
            if let Some(numeric) = item.numeric_price {
                return numeric;
            }
            item.price
                .as_deref()
                .and_then(parse_display_price)
                .unwrap_or(0)
        }
        PriceSource::LegacyName(name) => legacy_price(name),
    }
}

/// Rules 2 and 3. `None` means "fall through".
fn parse_display_price(price: &str) -> Option<u64> {
    if price == "Free" || price == "Custom" {
        return Some(0);
    }
    let digits: String = price
        .chars()
        .filter(|c| *c != '₹' && *c != ',' && !c.is_whitespace())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u64>().ok()
}

fn legacy_price(name: &str) -> u64 {
    LEGACY_PRICES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

/// Formats a rupee amount with Indian digit grouping: `₹1,39,997`.
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("₹{},{last3}", groups.join(","))
}
