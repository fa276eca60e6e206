//! # Assistant Module
//!
//! AI features built on the AI-access layer:
//! - The stateless chat assistant, grounded on the published inventory
//! - Listing-photo analysis that prefills the create form, with moderation

pub mod context;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod routes;


pub use routes::assistant_routes;
