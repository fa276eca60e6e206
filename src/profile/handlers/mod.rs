// src/profile/handlers/mod.rs

pub mod avatar;
pub mod profile;
pub mod shop;
