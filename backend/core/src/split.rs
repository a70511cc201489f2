//! Per-person totals from item shares.
//!
//! Each share is a relative weight on one item; a person owes
//! `price * weight / sum_of_weights` for every item they claimed. Tax and tip
//! are then distributed proportionally to each person's claimed subtotal.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::types::{Bill, ItemShare, Person};

/// What one person owes for a bill.
#[derive(Debug, Clone, Serialize)]
pub struct PersonTotal {
    pub person_id: Uuid,
    pub name: String,
    /// Sum of this person's item claims, before tax and tip.
    pub items_subtotal: f64,
    pub tax_share: f64,
    pub tip_share: f64,
    pub total: f64,
}

/// Compute per-person totals for a bill.
///
/// Items nobody claimed contribute nothing to anyone; their cost stays
/// unassigned rather than being spread across the group. Shares with zero or
/// negative weight are ignored.
pub fn person_totals(bill: &Bill, people: &[Person], shares: &[ItemShare]) -> Vec<PersonTotal> {
    let mut weight_sums: HashMap<Uuid, f64> = HashMap::new();
    for share in shares.iter().filter(|s| s.weight > 0.0) {
        *weight_sums.entry(share.item_id).or_insert(0.0) += share.weight;
    }

    let prices: HashMap<Uuid, f64> = bill.items.iter().map(|i| (i.id, i.price)).collect();

    let mut claimed: HashMap<Uuid, f64> = HashMap::new();
    for share in shares.iter().filter(|s| s.weight > 0.0) {
        let Some(price) = prices.get(&share.item_id) else {
            continue;
        };
        let sum = weight_sums[&share.item_id];
        if sum <= 0.0 {
            continue;
        }
        *claimed.entry(share.person_id).or_insert(0.0) += price * share.weight / sum;
    }

    let claimed_total: f64 = claimed.values().sum();

    people
        .iter()
        .map(|person| {
            let items_subtotal = claimed.get(&person.id).copied().unwrap_or(0.0);
            let fraction = if claimed_total > 0.0 {
                items_subtotal / claimed_total
            } else {
                0.0
            };
            let tax_share = bill.sales_tax * fraction;
            let tip_share = bill.tip * fraction;
            PersonTotal {
                person_id: person.id,
                name: person.name.clone(),
                items_subtotal,
                tax_share,
                tip_share,
                total: items_subtotal + tax_share + tip_share,
            }
        })
        .collect()
}
