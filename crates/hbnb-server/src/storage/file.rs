//! JSON file storage
//!
//! Every entity lives in an in-memory map keyed `"Type.id"`. `save` rewrites
//! the whole map into one JSON document; there is no incremental persistence.

use async_trait::async_trait;
use hbnb_core::ports::{RejectedRecord, ReloadReport, Storage};
use hbnb_core::{Entity, EntityKind, HbnbError, Result, View};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct FileStorage {
    path: PathBuf,
    state: RwLock<FileState>,
}

#[derive(Default)]
struct FileState {
    objects: BTreeMap<String, Entity>,
    /// Mutations made since the last save or reload
    dirty: bool,
}

impl FileStorage {
    /// Create an empty engine bound to `path`. Call `reload` to load it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(FileState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_store(&self) -> Result<(BTreeMap<String, Entity>, ReloadReport)> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {} not found, starting empty", self.path.display());
                return Ok((BTreeMap::new(), ReloadReport::absent()));
            }
            Err(e) => return Err(HbnbError::Io(e)),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok((BTreeMap::new(), ReloadReport::loaded(0)));
        }

        let document: Map<String, Value> = serde_json::from_slice(&raw).map_err(|e| {
            HbnbError::LoadCorruption(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(decode_records(document))
    }
}

/// Rebuild typed entities, rejecting records one by one
fn decode_records(document: Map<String, Value>) -> (BTreeMap<String, Entity>, ReloadReport) {
    let mut objects = BTreeMap::new();
    let mut rejected = Vec::new();

    for (key, value) in document {
        match serde_json::from_value::<Entity>(value) {
            Ok(entity) if entity.key() == key => {
                objects.insert(key, entity);
            }
            Ok(entity) => rejected.push(RejectedRecord {
                reason: format!("key does not match record {}", entity.key()),
                key,
            }),
            Err(e) => rejected.push(RejectedRecord {
                key,
                reason: e.to_string(),
            }),
        }
    }

    let mut report = ReloadReport::loaded(objects.len());
    report.rejected = rejected;
    (objects, report)
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

fn dedup_amenities(entity: &mut Entity) {
    if let Some(place) = entity.as_place_mut() {
        let mut seen = std::collections::HashSet::new();
        place.amenity_ids.retain(|id| seen.insert(id.clone()));
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>> {
        let state = self.state.read().await;
        Ok(state
            .objects
            .iter()
            .filter(|(_, entity)| kind.map_or(true, |k| entity.kind() == k))
            .map(|(key, entity)| (key.clone(), entity.clone()))
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let state = self.state.read().await;
        Ok(state.objects.get(&kind.key(id)).cloned())
    }

    async fn new(&self, mut entity: Entity) -> Result<()> {
        dedup_amenities(&mut entity);
        let mut state = self.state.write().await;
        state.objects.insert(entity.key(), entity);
        state.dirty = true;
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        // Held for the whole write so saves never interleave
        let mut state = self.state.write().await;

        let mut document = Map::new();
        for (key, entity) in &state.objects {
            document.insert(key.clone(), entity.to_value(View::Snapshot)?);
        }
        let bytes = serde_json::to_vec(&Value::Object(document))?;

        write_atomic(&self.path, &bytes).await.map_err(|e| {
            HbnbError::Persistence(format!("writing {}: {}", self.path.display(), e))
        })?;

        state.dirty = false;
        debug!(
            "Saved {} objects to {}",
            state.objects.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn delete(&self, entity: &Entity) -> Result<()> {
        let mut state = self.state.write().await;
        let mut doomed = vec![(entity.kind(), entity.id().to_string())];

        while let Some((kind, id)) = doomed.pop() {
            if state.objects.remove(&kind.key(&id)).is_none() {
                continue;
            }

            if kind == EntityKind::Amenity {
                for other in state.objects.values_mut() {
                    if let Some(place) = other.as_place_mut() {
                        place.unlink_amenity(&id);
                    }
                }
            }

            doomed.extend(
                state
                    .objects
                    .values()
                    .filter(|other| {
                        other
                            .parent_refs()
                            .iter()
                            .any(|(parent_kind, parent_id)| *parent_kind == kind && *parent_id == id)
                    })
                    .map(|other| (other.kind(), other.id().to_string())),
            );
        }

        state.dirty = true;
        Ok(())
    }

    async fn reload(&self) -> Result<ReloadReport> {
        let (objects, report) = self.read_store().await?;

        for record in &report.rejected {
            warn!("Skipping unreadable record {}: {}", record.key, record.reason);
        }

        let mut state = self.state.write().await;
        state.objects = objects;
        state.dirty = false;

        info!(
            "Loaded {} objects from {}",
            report.loaded,
            self.path.display()
        );
        Ok(report)
    }

    async fn close(&self) -> Result<()> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            debug!("Discarding unsaved changes");
            self.reload().await?;
        }
        Ok(())
    }
}
