//! Business logic services

pub mod catalog;
pub mod relations;
pub mod search;

pub use catalog::Catalog;
pub use search::PlaceSearch;
