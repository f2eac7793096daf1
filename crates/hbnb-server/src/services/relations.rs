//! Parent/child lookups

use super::Catalog;
use hbnb_core::{Entity, EntityKind, Result};
use tracing::warn;

impl Catalog {
    /// Records of `child` that belong to the given parent.
    ///
    /// The parent must exist; a missing parent is `NotFound`.
    pub async fn children(
        &self,
        parent: EntityKind,
        parent_id: &str,
        child: EntityKind,
    ) -> Result<Vec<Entity>> {
        self.fetch(parent, parent_id).await?;

        let children = self
            .list(child)
            .await?
            .into_iter()
            .filter(|entity| {
                entity
                    .parent_refs()
                    .iter()
                    .any(|(kind, id)| *kind == parent && *id == parent_id)
            })
            .collect();
        Ok(children)
    }

    /// Amenities linked to a place, in link order
    pub async fn amenities_of(&self, place_id: &str) -> Result<Vec<Entity>> {
        let place = self.fetch(EntityKind::Place, place_id).await?;
        let amenity_ids = place
            .as_place()
            .map(|p| p.amenity_ids.clone())
            .unwrap_or_default();

        let mut amenities = Vec::with_capacity(amenity_ids.len());
        for amenity_id in amenity_ids {
            match self.storage().get(EntityKind::Amenity, &amenity_id).await? {
                Some(amenity) => amenities.push(amenity),
                None => warn!("Place.{} links missing Amenity.{}", place_id, amenity_id),
            }
        }
        Ok(amenities)
    }
}

#[cfg(test)]
mod tests {
    use super::super::catalog::tests::{catalog, object};
    use hbnb_core::{EntityKind, HbnbError};
    use serde_json::json;

    #[tokio::test]
    async fn test_children_of_state() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let ca = catalog
            .create(EntityKind::State, &object(json!({"name": "CA"})))
            .await
            .unwrap();
        let ny = catalog
            .create(EntityKind::State, &object(json!({"name": "NY"})))
            .await
            .unwrap();
        for (name, state) in [("SF", &ca), ("LA", &ca), ("NYC", &ny)] {
            catalog
                .create(
                    EntityKind::City,
                    &object(json!({"name": name, "state_id": state.id()})),
                )
                .await
                .unwrap();
        }

        let cities = catalog
            .children(EntityKind::State, ca.id(), EntityKind::City)
            .await
            .unwrap();
        assert_eq!(cities.len(), 2);
        assert!(cities
            .iter()
            .all(|c| c.as_city().unwrap().state_id == ca.id()));
    }

    #[tokio::test]
    async fn test_children_of_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let result = catalog
            .children(EntityKind::Place, "nope", EntityKind::Review)
            .await;
        assert!(matches!(result, Err(HbnbError::NotFound(_))));
    }
}
