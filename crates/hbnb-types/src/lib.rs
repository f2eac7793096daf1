//! HBnB Types - Pure entity definitions for the catalog
//!
//! This crate contains only plain data types and their serialization rules,
//! shared by every storage engine and by the HTTP layer.

pub mod base;
pub mod entity;
pub mod location;
pub mod place;
pub mod review;
pub mod user;

pub use base::{now, BaseModel, TIME_FORMAT};
pub use entity::{Entity, View};
pub use location::{City, State};
pub use place::{Amenity, Place};
pub use review::Review;
pub use user::User;

use std::str::FromStr;

/// The six persisted record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    State,
    City,
    Amenity,
    User,
    Place,
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Amenity,
        EntityKind::City,
        EntityKind::Place,
        EntityKind::Review,
        EntityKind::State,
        EntityKind::User,
    ];

    /// Class name used in storage keys and the `__class__` discriminator
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::User => "User",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    /// Lowercase plural, as used by collection routes and `/stats`
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::State => "states",
            EntityKind::City => "cities",
            EntityKind::Amenity => "amenities",
            EntityKind::User => "users",
            EntityKind::Place => "places",
            EntityKind::Review => "reviews",
        }
    }

    /// Fields an update payload may change
    pub fn writable_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::State | EntityKind::City | EntityKind::Amenity => &["name"],
            EntityKind::User => &["password", "first_name", "last_name"],
            EntityKind::Place => &[
                "name",
                "description",
                "number_rooms",
                "number_bathrooms",
                "max_guest",
                "price_by_night",
                "latitude",
                "longitude",
            ],
            EntityKind::Review => &["text"],
        }
    }

    /// Fields set once at creation and frozen afterwards
    pub fn fixed_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::State | EntityKind::Amenity => &[],
            EntityKind::City => &["state_id"],
            EntityKind::User => &["email"],
            EntityKind::Place => &["city_id", "user_id"],
            EntityKind::Review => &["place_id", "user_id"],
        }
    }

    /// Storage key for an entity of this kind
    pub fn key(&self, id: &str) -> String {
        format!("{}.{}", self.name(), id)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "State" => Ok(EntityKind::State),
            "City" => Ok(EntityKind::City),
            "Amenity" => Ok(EntityKind::Amenity),
            "User" => Ok(EntityKind::User),
            "Place" => Ok(EntityKind::Place),
            "Review" => Ok(EntityKind::Review),
            other => Err(format!("unknown entity class: {}", other)),
        }
    }
}
