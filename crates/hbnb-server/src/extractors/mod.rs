//! Request extractors

pub mod json_body;

pub use json_body::{parse_object, JsonObject};
