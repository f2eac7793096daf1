//! SQLite storage (embedded, no external dependencies)
//!
//! `new` and `delete` only stage operations; `save` replays them inside one
//! transaction. `close` throws away whatever is still staged.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use hbnb_core::ports::{ReloadReport, Storage};
use hbnb_core::{Amenity, BaseModel, City, Entity, EntityKind, HbnbError, Place, Result, Review, State, User};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct DbStorage {
    pool: SqlitePool,
    pending: Mutex<Vec<PendingOp>>,
}

/// A change staged in the current unit of work
#[derive(Debug, Clone)]
enum PendingOp {
    Upsert(Entity),
    Remove(EntityKind, String),
}

fn db_err(e: sqlx::Error) -> HbnbError {
    HbnbError::Database(e.to_string())
}

fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::State => "states",
        EntityKind::City => "cities",
        EntityKind::Amenity => "amenities",
        EntityKind::User => "users",
        EntityKind::Place => "places",
        EntityKind::Review => "reviews",
    }
}

impl DbStorage {
    /// Open (or create) the database. With `reset`, every table is dropped
    /// first.
    pub async fn connect(database_path: &str, reset: bool) -> Result<Self> {
        info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        if reset {
            warn!("Test environment: dropping all tables");
            Self::drop_schema(&pool).await?;
        }

        Ok(Self {
            pool,
            pending: Mutex::new(Vec::new()),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS states (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name VARCHAR(128) NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cities (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                state_id VARCHAR(60) NOT NULL REFERENCES states(id) ON DELETE CASCADE,
                name VARCHAR(128) NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS amenities (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name VARCHAR(128) NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                email VARCHAR(128) NOT NULL,
                password VARCHAR(128),
                first_name VARCHAR(128),
                last_name VARCHAR(128)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                city_id VARCHAR(60) NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
                user_id VARCHAR(60) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name VARCHAR(128) NOT NULL,
                description VARCHAR(1024),
                number_rooms INTEGER NOT NULL DEFAULT 0,
                number_bathrooms INTEGER NOT NULL DEFAULT 0,
                max_guest INTEGER NOT NULL DEFAULT 0,
                price_by_night INTEGER NOT NULL DEFAULT 0,
                latitude REAL,
                longitude REAL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id VARCHAR(60) PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                place_id VARCHAR(60) NOT NULL REFERENCES places(id) ON DELETE CASCADE,
                user_id VARCHAR(60) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text VARCHAR(1024) NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS place_amenity (
                place_id VARCHAR(60) NOT NULL REFERENCES places(id) ON DELETE CASCADE,
                amenity_id VARCHAR(60) NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
                PRIMARY KEY (place_id, amenity_id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }

    async fn drop_schema(pool: &SqlitePool) -> Result<()> {
        for name in [
            "place_amenity",
            "reviews",
            "places",
            "cities",
            "states",
            "amenities",
            "users",
        ] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", name))
                .execute(pool)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    async fn fetch(&self, kind: EntityKind, id: Option<&str>) -> Result<Vec<Entity>> {
        let mut sql = format!("SELECT * FROM {}", table(kind));
        if id.is_some() {
            sql.push_str(" WHERE id = ?1");
        }
        sql.push_str(" ORDER BY created_at, id");

        macro_rules! rows {
            ($row:ty) => {{
                let mut query = sqlx::query_as::<_, $row>(&sql);
                if let Some(id) = id {
                    query = query.bind(id);
                }
                query
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_err)?
                    .into_iter()
                    .map(Entity::from)
                    .collect::<Vec<_>>()
            }};
        }

        let mut entities = match kind {
            EntityKind::State => rows!(StateRow),
            EntityKind::City => rows!(CityRow),
            EntityKind::Amenity => rows!(AmenityRow),
            EntityKind::User => rows!(UserRow),
            EntityKind::Place => rows!(PlaceRow),
            EntityKind::Review => rows!(ReviewRow),
        };

        if kind == EntityKind::Place {
            self.attach_amenities(&mut entities, id).await?;
        }

        Ok(entities)
    }

    /// Fill `Place.amenity_ids` from the join table
    async fn attach_amenities(&self, places: &mut [Entity], place_id: Option<&str>) -> Result<()> {
        let links: Vec<(String, String)> = match place_id {
            Some(id) => sqlx::query_as(
                "SELECT place_id, amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
            None => sqlx::query_as("SELECT place_id, amenity_id FROM place_amenity ORDER BY rowid")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?,
        };

        let mut by_place: HashMap<String, Vec<String>> = HashMap::new();
        for (place_id, amenity_id) in links {
            by_place.entry(place_id).or_default().push(amenity_id);
        }

        for entity in places.iter_mut() {
            if let Some(place) = entity.as_place_mut() {
                place.amenity_ids = by_place.remove(&place.base.id).unwrap_or_default();
            }
        }
        Ok(())
    }

    async fn apply(&self, ops: &[PendingOp]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Staging order need not follow foreign keys; they are checked at commit
        sqlx::query("PRAGMA defer_foreign_keys = ON")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for op in ops {
            match op {
                PendingOp::Upsert(entity) => upsert(&mut *tx, entity).await?,
                PendingOp::Remove(kind, id) => {
                    sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table(*kind)))
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}

async fn upsert(conn: &mut SqliteConnection, entity: &Entity) -> Result<()> {
    let base = entity.base();
    let result = match entity {
        Entity::State(state) => {
            sqlx::query(
                r#"
                INSERT INTO states (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at, name = excluded.name
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&state.name)
            .execute(&mut *conn)
            .await
        }
        Entity::City(city) => {
            sqlx::query(
                r#"
                INSERT INTO cities (id, created_at, updated_at, state_id, name)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at, name = excluded.name
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&city.state_id)
            .bind(&city.name)
            .execute(&mut *conn)
            .await
        }
        Entity::Amenity(amenity) => {
            sqlx::query(
                r#"
                INSERT INTO amenities (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at, name = excluded.name
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&amenity.name)
            .execute(&mut *conn)
            .await
        }
        Entity::User(user) => {
            sqlx::query(
                r#"
                INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    password = excluded.password,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .execute(&mut *conn)
            .await
        }
        Entity::Place(place) => {
            let result = sqlx::query(
                r#"
                INSERT INTO places (id, created_at, updated_at, city_id, user_id, name, description,
                                    number_rooms, number_bathrooms, max_guest, price_by_night,
                                    latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name,
                    description = excluded.description,
                    number_rooms = excluded.number_rooms,
                    number_bathrooms = excluded.number_bathrooms,
                    max_guest = excluded.max_guest,
                    price_by_night = excluded.price_by_night,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&place.city_id)
            .bind(&place.user_id)
            .bind(&place.name)
            .bind(&place.description)
            .bind(place.number_rooms)
            .bind(place.number_bathrooms)
            .bind(place.max_guest)
            .bind(place.price_by_night)
            .bind(place.latitude)
            .bind(place.longitude)
            .execute(&mut *conn)
            .await;
            if result.is_ok() {
                replace_amenity_links(conn, place).await?;
            }
            result
        }
        Entity::Review(review) => {
            sqlx::query(
                r#"
                INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at, text = excluded.text
                "#,
            )
            .bind(&base.id)
            .bind(base.created_at)
            .bind(base.updated_at)
            .bind(&review.place_id)
            .bind(&review.user_id)
            .bind(&review.text)
            .execute(&mut *conn)
            .await
        }
    };

    result.map_err(db_err)?;
    Ok(())
}

async fn replace_amenity_links(conn: &mut SqliteConnection, place: &Place) -> Result<()> {
    sqlx::query("DELETE FROM place_amenity WHERE place_id = ?1")
        .bind(&place.base.id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    for amenity_id in &place.amenity_ids {
        sqlx::query("INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)")
            .bind(&place.base.id)
            .bind(amenity_id)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

#[async_trait]
impl Storage for DbStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut objects = BTreeMap::new();
        for kind in kinds {
            for entity in self.fetch(kind, None).await? {
                objects.insert(entity.key(), entity);
            }
        }
        Ok(objects)
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self.fetch(kind, Some(id)).await?.into_iter().next())
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        self.pending.lock().await.push(PendingOp::Upsert(entity));
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let ops = std::mem::take(&mut *self.pending.lock().await);
        if ops.is_empty() {
            return Ok(());
        }

        match self.apply(&ops).await {
            Ok(()) => {
                debug!("Committed {} staged operations", ops.len());
                Ok(())
            }
            Err(e) => {
                warn!("Commit failed, rolled back: {}", e);
                // Keep the unit of work intact; `close` discards it
                let mut pending = self.pending.lock().await;
                let newer = std::mem::take(&mut *pending);
                *pending = ops;
                pending.extend(newer);
                Err(HbnbError::Persistence(e.to_string()))
            }
        }
    }

    async fn delete(&self, entity: &Entity) -> Result<()> {
        self.pending
            .lock()
            .await
            .push(PendingOp::Remove(entity.kind(), entity.id().to_string()));
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut total = 0usize;
        for kind in kinds {
            let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table(kind)))
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
            total += count as usize;
        }
        Ok(total)
    }

    async fn reload(&self) -> Result<ReloadReport> {
        Self::run_migrations(&self.pool).await?;
        self.pending.lock().await.clear();

        let loaded = self.count(None).await?;
        info!("Database ready with {} objects", loaded);
        Ok(ReloadReport::loaded(loaded))
    }

    async fn close(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            debug!("Discarding {} uncommitted operations", pending.len());
            pending.clear();
        }
        Ok(())
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct StateRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    name: String,
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    state_id: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct AmenityRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    name: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    email: String,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    city_id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    number_rooms: i64,
    number_bathrooms: i64,
    max_guest: i64,
    price_by_night: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    place_id: String,
    user_id: String,
    text: String,
}

fn base(id: String, created_at: NaiveDateTime, updated_at: NaiveDateTime) -> BaseModel {
    BaseModel {
        id,
        created_at,
        updated_at,
    }
}

impl From<StateRow> for Entity {
    fn from(r: StateRow) -> Self {
        Entity::State(State {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        })
    }
}

impl From<CityRow> for Entity {
    fn from(r: CityRow) -> Self {
        Entity::City(City {
            base: base(r.id, r.created_at, r.updated_at),
            state_id: r.state_id,
            name: r.name,
        })
    }
}

impl From<AmenityRow> for Entity {
    fn from(r: AmenityRow) -> Self {
        Entity::Amenity(Amenity {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        })
    }
}

impl From<UserRow> for Entity {
    fn from(r: UserRow) -> Self {
        Entity::User(User {
            base: base(r.id, r.created_at, r.updated_at),
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
        })
    }
}

impl From<PlaceRow> for Entity {
    fn from(r: PlaceRow) -> Self {
        Entity::Place(Place {
            base: base(r.id, r.created_at, r.updated_at),
            city_id: r.city_id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            number_rooms: r.number_rooms,
            number_bathrooms: r.number_bathrooms,
            max_guest: r.max_guest,
            price_by_night: r.price_by_night,
            latitude: r.latitude,
            longitude: r.longitude,
            amenity_ids: Vec::new(),
        })
    }
}

impl From<ReviewRow> for Entity {
    fn from(r: ReviewRow) -> Self {
        Entity::Review(Review {
            base: base(r.id, r.created_at, r.updated_at),
            place_id: r.place_id,
            user_id: r.user_id,
            text: r.text,
        })
    }
}
