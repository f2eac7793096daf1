//! Tagged union over every record type
//!
//! The serialized form is a flat field map carrying a `__class__`
//! discriminator, which is what the JSON store persists and what the API
//! returns (minus the password).

use crate::{Amenity, BaseModel, City, EntityKind, Place, Review, State, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which serialized form to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// API output: never carries the password field
    Public,
    /// Durable snapshot: everything, password hash included
    Snapshot,
}

/// Any persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    State(State),
    City(City),
    Amenity(Amenity),
    User(User),
    Place(Place),
    Review(Review),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::State(_) => EntityKind::State,
            Entity::City(_) => EntityKind::City,
            Entity::Amenity(_) => EntityKind::Amenity,
            Entity::User(_) => EntityKind::User,
            Entity::Place(_) => EntityKind::Place,
            Entity::Review(_) => EntityKind::Review,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Entity::State(e) => &e.base,
            Entity::City(e) => &e.base,
            Entity::Amenity(e) => &e.base,
            Entity::User(e) => &e.base,
            Entity::Place(e) => &e.base,
            Entity::Review(e) => &e.base,
        }
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            Entity::State(e) => &mut e.base,
            Entity::City(e) => &mut e.base,
            Entity::Amenity(e) => &mut e.base,
            Entity::User(e) => &mut e.base,
            Entity::Place(e) => &mut e.base,
            Entity::Review(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// `"Type.id"` storage key
    pub fn key(&self) -> String {
        self.kind().key(self.id())
    }

    pub fn touch(&mut self) {
        self.base_mut().touch();
    }

    /// Records this one belongs to, as `(kind, id)` pairs.
    ///
    /// Deleting any of them deletes this record too.
    pub fn parent_refs(&self) -> Vec<(EntityKind, &str)> {
        match self {
            Entity::City(city) => vec![(EntityKind::State, city.state_id.as_str())],
            Entity::Place(place) => vec![
                (EntityKind::City, place.city_id.as_str()),
                (EntityKind::User, place.user_id.as_str()),
            ],
            Entity::Review(review) => vec![
                (EntityKind::Place, review.place_id.as_str()),
                (EntityKind::User, review.user_id.as_str()),
            ],
            Entity::State(_) | Entity::Amenity(_) | Entity::User(_) => Vec::new(),
        }
    }

    pub fn to_value(&self, view: View) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if view == View::Public {
            if let Some(fields) = value.as_object_mut() {
                fields.remove("password");
            }
        }
        Ok(value)
    }

    /// Build a new record from a request payload.
    ///
    /// Only writable and creation-time fields are taken from `payload`; the
    /// id and timestamps are always freshly generated.
    pub fn from_payload(kind: EntityKind, payload: &Map<String, Value>) -> serde_json::Result<Self> {
        let mut fields: Map<String, Value> = payload
            .iter()
            .filter(|(key, _)| {
                kind.writable_fields().contains(&key.as_str())
                    || kind.fixed_fields().contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if let Value::Object(base) = serde_json::to_value(BaseModel::new())? {
            fields.extend(base);
        }
        fields.insert("__class__".to_string(), Value::String(kind.name().to_string()));

        serde_json::from_value(Value::Object(fields))
    }

    /// Merge the writable keys of `patch` into this record and refresh
    /// `updated_at`. Every other key is ignored. On error the record is left
    /// untouched.
    pub fn apply_update(&mut self, patch: &Map<String, Value>) -> serde_json::Result<()> {
        let writable = self.kind().writable_fields();
        let mut value = serde_json::to_value(&*self)?;
        if let Some(fields) = value.as_object_mut() {
            for (key, new_value) in patch {
                if writable.contains(&key.as_str()) {
                    fields.insert(key.clone(), new_value.clone());
                }
            }
        }

        let mut updated: Entity = serde_json::from_value(value)?;
        updated.touch();
        *self = updated;
        Ok(())
    }

    pub fn as_city(&self) -> Option<&City> {
        match self {
            Entity::City(city) => Some(city),
            _ => None,
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Entity::Place(place) => Some(place),
            _ => None,
        }
    }

    pub fn as_place_mut(&mut self) -> Option<&mut Place> {
        match self {
            Entity::Place(place) => Some(place),
            _ => None,
        }
    }

    pub fn as_review(&self) -> Option<&Review> {
        match self {
            Entity::Review(review) => Some(review),
            _ => None,
        }
    }

    pub fn as_user_mut(&mut self) -> Option<&mut User> {
        match self {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }
}

impl From<State> for Entity {
    fn from(value: State) -> Self {
        Entity::State(value)
    }
}

impl From<City> for Entity {
    fn from(value: City) -> Self {
        Entity::City(value)
    }
}

impl From<Amenity> for Entity {
    fn from(value: Amenity) -> Self {
        Entity::Amenity(value)
    }
}

impl From<User> for Entity {
    fn from(value: User) -> Self {
        Entity::User(value)
    }
}

impl From<Place> for Entity {
    fn from(value: Place) -> Self {
        Entity::Place(value)
    }
}

impl From<Review> for Entity {
    fn from(value: Review) -> Self {
        Entity::Review(value)
    }
}
