// File: lib.rs
// Location: /src/lib.rs

pub mod config;
pub mod error;
pub mod form;
pub mod generate;
pub mod payload;
pub mod qr;
pub mod render;
pub mod schema;
pub mod settings;
