// src/admin/handlers/mod.rs

pub mod products;
pub mod settings;
pub mod users;
