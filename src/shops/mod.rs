//! # Shops Module
//!
//! Public storefronts: the shop directory with published-listing counts,
//! and a single shop with its published listings.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use routes::shops_routes;
