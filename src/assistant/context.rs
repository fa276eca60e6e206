// src/assistant/context.rs
//! What the chat model gets to see: a bounded slice of history and the live inventory

use crate::products::models::Product;
use crate::services::ai::ChatTurn;

/// Largest scroll-back a client may send
pub const MAX_HISTORY: usize = 50;
/// Turns actually forwarded to the provider
pub const FORWARDED_TURNS: usize = 5;

pub fn recent_turns(history: &[ChatTurn]) -> &[ChatTurn] {
    &history[history.len().saturating_sub(FORWARDED_TURNS)..]
}

/// One line per published product
pub fn inventory_snapshot(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| format!("- {} (ID:{}) — {} {}", p.title, p.id, p.price, p.currency))
        .collect::<Vec<_>>()
        .join("\n")
}
