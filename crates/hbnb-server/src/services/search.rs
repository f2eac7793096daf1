//! Place search by state, city and amenity

use super::Catalog;
use hbnb_core::{Entity, EntityKind, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// Search filters; every list is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceSearch {
    #[serde(default)]
    pub states: Option<Vec<String>>,
    #[serde(default)]
    pub cities: Option<Vec<String>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
}

impl PlaceSearch {
    fn states(&self) -> &[String] {
        self.states.as_deref().unwrap_or_default()
    }

    fn cities(&self) -> &[String] {
        self.cities.as_deref().unwrap_or_default()
    }

    fn amenities(&self) -> &[String] {
        self.amenities.as_deref().unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.states().is_empty() && self.cities().is_empty() && self.amenities().is_empty()
    }
}

impl Catalog {
    pub async fn search_places(&self, query: &PlaceSearch) -> Result<Vec<Entity>> {
        let places = self.list(EntityKind::Place).await?;
        if query.is_empty() {
            return Ok(places);
        }

        // Cities named directly, then the cities of every named state
        let mut city_ids: Vec<String> = Vec::new();
        if !query.states().is_empty() {
            let cities = self.list(EntityKind::City).await?;
            for state_id in query.states() {
                city_ids.extend(
                    cities
                        .iter()
                        .filter_map(Entity::as_city)
                        .filter(|city| &city.state_id == state_id)
                        .map(|city| city.base.id.clone()),
                );
            }
        }
        city_ids.extend(query.cities().iter().cloned());

        let mut seen = HashSet::new();
        let mut candidates: Vec<Entity> = Vec::new();
        for city_id in &city_ids {
            for place in &places {
                let in_city = place.as_place().map_or(false, |p| &p.city_id == city_id);
                if in_city && seen.insert(place.id().to_string()) {
                    candidates.push(place.clone());
                }
            }
        }

        let wanted = query.amenities();
        if wanted.is_empty() {
            return Ok(candidates);
        }

        if candidates.is_empty() {
            candidates = places;
        }
        candidates.retain(|place| {
            place
                .as_place()
                .map_or(false, |p| wanted.iter().all(|id| p.has_amenity(id)))
        });
        Ok(candidates)
    }
}
