//! Catalog service: CRUD over every record type through one storage engine

use hbnb_core::password::hash_password;
use hbnb_core::ports::Storage;
use hbnb_core::{Entity, EntityKind, HbnbError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Catalog {
    storage: Arc<dyn Storage>,
}

impl Catalog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Every record of `kind`, oldest first
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        let mut entities: Vec<Entity> = self.storage.all(Some(kind)).await?.into_values().collect();
        entities.sort_by(|a, b| {
            a.base()
                .created_at
                .cmp(&b.base().created_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(entities)
    }

    pub async fn fetch(&self, kind: EntityKind, id: &str) -> Result<Entity> {
        self.storage
            .get(kind, id)
            .await?
            .ok_or_else(|| HbnbError::NotFound(kind.key(id)))
    }

    pub async fn exists(&self, kind: EntityKind, id: &str) -> Result<bool> {
        Ok(self.storage.get(kind, id).await?.is_some())
    }

    /// Build, register and persist a new record from a request payload
    pub async fn create(&self, kind: EntityKind, payload: &Map<String, Value>) -> Result<Entity> {
        let payload = hash_secret(kind, payload)?;
        let entity = Entity::from_payload(kind, &payload).map_err(HbnbError::invalid_payload)?;

        self.storage.new(entity.clone()).await?;
        self.storage.save().await?;

        info!("Created {}", entity.key());
        Ok(entity)
    }

    /// Merge the writable fields of `patch` into an existing record
    pub async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Entity> {
        let mut entity = self.fetch(kind, id).await?;
        let patch = hash_secret(kind, patch)?;
        entity
            .apply_update(&patch)
            .map_err(HbnbError::invalid_payload)?;

        self.storage.new(entity.clone()).await?;
        self.storage.save().await?;

        debug!("Updated {}", entity.key());
        Ok(entity)
    }

    /// Delete a record (and everything that belongs to it)
    pub async fn remove(&self, kind: EntityKind, id: &str) -> Result<()> {
        let entity = self.fetch(kind, id).await?;
        self.storage.delete(&entity).await?;
        self.storage.save().await?;

        info!("Deleted {}", entity.key());
        Ok(())
    }

    /// Link an amenity to a place. Returns the amenity and whether the link
    /// is new.
    pub async fn link_amenity(&self, place_id: &str, amenity_id: &str) -> Result<(Entity, bool)> {
        let mut place = self.fetch(EntityKind::Place, place_id).await?;
        let amenity = self.fetch(EntityKind::Amenity, amenity_id).await?;

        let linked = place
            .as_place_mut()
            .map(|p| p.link_amenity(amenity_id))
            .unwrap_or(false);
        if linked {
            self.storage.new(place).await?;
            self.storage.save().await?;
            debug!("Linked Amenity.{} to Place.{}", amenity_id, place_id);
        }
        Ok((amenity, linked))
    }

    /// Remove the link between a place and an amenity; an absent link is
    /// `NotFound`
    pub async fn unlink_amenity(&self, place_id: &str, amenity_id: &str) -> Result<()> {
        let mut place = self.fetch(EntityKind::Place, place_id).await?;
        self.fetch(EntityKind::Amenity, amenity_id).await?;

        let unlinked = place
            .as_place_mut()
            .map(|p| p.unlink_amenity(amenity_id))
            .unwrap_or(false);
        if !unlinked {
            return Err(HbnbError::NotFound(format!(
                "Amenity.{} is not linked to Place.{}",
                amenity_id, place_id
            )));
        }

        self.storage.new(place).await?;
        self.storage.save().await?;
        debug!("Unlinked Amenity.{} from Place.{}", amenity_id, place_id);
        Ok(())
    }
}

/// Replace a plaintext `password` with its hash before it can be stored.
/// A password that is not a string (`null` included) is rejected.
fn hash_secret(kind: EntityKind, payload: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut payload = payload.clone();
    if kind != EntityKind::User {
        return Ok(payload);
    }
    match payload.get("password") {
        None => {}
        Some(Value::String(plain)) => {
            let hashed = hash_password(plain)?;
            payload.insert("password".to_string(), Value::String(hashed));
        }
        Some(_) => {
            return Err(HbnbError::Validation(
                "password must be a string".to_string(),
            ))
        }
    }
    Ok(payload)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use hbnb_core::password::verify_password;
    use serde_json::json;

    pub(crate) fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    pub(crate) fn catalog(dir: &tempfile::TempDir) -> Catalog {
        let storage = FileStorage::new(dir.path().join("file.json"));
        Catalog::new(Arc::new(storage))
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let state = catalog
            .create(EntityKind::State, &object(json!({"name": "Ohio"})))
            .await
            .unwrap();
        let fetched = catalog.fetch(EntityKind::State, state.id()).await.unwrap();
        assert_eq!(fetched, state);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let result = catalog.fetch(EntityKind::City, "nope").await;
        assert!(matches!(result, Err(HbnbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ill_typed_field_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let result = catalog
            .create(EntityKind::Amenity, &object(json!({"name": 12})))
            .await;
        assert!(matches!(result, Err(HbnbError::Validation(_))));
        assert_eq!(catalog.list(EntityKind::Amenity).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_user_password_is_hashed_on_create_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let mut user = catalog
            .create(
                EntityKind::User,
                &object(json!({"email": "a@b.c", "password": "secret"})),
            )
            .await
            .unwrap();
        let hash = user.as_user_mut().unwrap().password.clone().unwrap();
        assert!(verify_password("secret", &hash));

        let mut updated = catalog
            .update(EntityKind::User, user.id(), &object(json!({"password": "other"})))
            .await
            .unwrap();
        let hash = updated.as_user_mut().unwrap().password.clone().unwrap();
        assert!(verify_password("other", &hash));
        assert!(!verify_password("secret", &hash));
    }

    #[tokio::test]
    async fn test_non_string_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let result = catalog
            .create(EntityKind::User, &object(json!({"email": "a@b.c", "password": null})))
            .await;
        assert!(matches!(result, Err(HbnbError::Validation(_))));

        let user = catalog
            .create(
                EntityKind::User,
                &object(json!({"email": "a@b.c", "password": "secret"})),
            )
            .await
            .unwrap();
        for bad in [json!(null), json!(42), json!(["secret"])] {
            let result = catalog
                .update(EntityKind::User, user.id(), &object(json!({ "password": bad })))
                .await;
            assert!(matches!(result, Err(HbnbError::Validation(_))));
        }

        let mut stored = catalog.fetch(EntityKind::User, user.id()).await.unwrap();
        let hash = stored.as_user_mut().unwrap().password.clone().unwrap();
        assert!(verify_password("secret", &hash));
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        for name in ["A", "B", "C"] {
            catalog
                .create(EntityKind::Amenity, &object(json!({"name": name})))
                .await
                .unwrap();
        }
        let listed = catalog.list(EntityKind::Amenity).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed
            .windows(2)
            .all(|pair| pair[0].base().created_at <= pair[1].base().created_at));
    }

    #[tokio::test]
    async fn test_link_and_unlink_amenity() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir);

        let state = catalog
            .create(EntityKind::State, &object(json!({"name": "CA"})))
            .await
            .unwrap();
        let city = catalog
            .create(
                EntityKind::City,
                &object(json!({"name": "SF", "state_id": state.id()})),
            )
            .await
            .unwrap();
        let user = catalog
            .create(EntityKind::User, &object(json!({"email": "a@b.c", "password": "p"})))
            .await
            .unwrap();
        let place = catalog
            .create(
                EntityKind::Place,
                &object(json!({"name": "Loft", "city_id": city.id(), "user_id": user.id()})),
            )
            .await
            .unwrap();
        let wifi = catalog
            .create(EntityKind::Amenity, &object(json!({"name": "Wifi"})))
            .await
            .unwrap();

        let (_, linked) = catalog.link_amenity(place.id(), wifi.id()).await.unwrap();
        assert!(linked);
        let (_, linked) = catalog.link_amenity(place.id(), wifi.id()).await.unwrap();
        assert!(!linked);

        catalog.unlink_amenity(place.id(), wifi.id()).await.unwrap();
        let again = catalog.unlink_amenity(place.id(), wifi.id()).await;
        assert!(matches!(again, Err(HbnbError::NotFound(_))));
    }
}
