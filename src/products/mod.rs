// src/products/mod.rs

pub mod filter;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod uploads;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::*;
pub use routes::products_routes;
