// Adapters layer: concrete implementations for external systems (http, html, flat files, sqlite).

pub mod flat_file;
pub mod html;
pub mod http;
pub mod sqlite;
