//! Kit storage: a MongoDB-backed store for the running service and an in-memory
//! store for tests and local runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Kit, NewKit};

const KITS_COLLECTION: &str = "kits";
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")] Unavailable(String),
    #[error("store connection closed")] Closed,
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self { StoreError::Unavailable(e.to_string()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreHealth {
    Connected,
    Disconnected,
    Error,
}

impl StoreHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreHealth::Connected => "connected",
            StoreHealth::Disconnected => "disconnected",
            StoreHealth::Error => "error",
        }
    }
}

/// Read side used by request handling plus the insert used for seeding.
#[async_trait]
pub trait KitStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Kit>, StoreError>;
    /// `Ok(None)` for ids that do not resolve, including malformed ids.
    async fn find(&self, id: &str) -> Result<Option<Kit>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn insert_many(&self, kits: Vec<NewKit>) -> Result<usize, StoreError>;
    async fn health(&self) -> StoreHealth;
    async fn close(&self);
}

pub fn seed_data() -> Vec<NewKit> {
    vec![
        NewKit::new("Arduino Starter Kit", &[
            "Arduino Uno",
            "Breadboard",
            "LEDs (assorted)",
            "Resistors (220Ω, 1kΩ, 10kΩ)",
            "Jumper Wires",
            "Push Buttons",
            "Potentiometer",
            "USB Cable",
        ]),
        NewKit::new("Motor Kit", &[
            "L298N Motor Driver",
            "DC Motors x2",
            "Wheels x2",
            "Battery Holder (4xAA)",
            "Robot Chassis",
            "Caster Wheel",
            "Motor Mounting Brackets",
        ]),
        NewKit::new("Sensor Pack", &[
            "HC-SR04 Ultrasonic Sensor",
            "IR Line Sensors x2",
            "Photoresistors x3",
            "PIR Motion Sensor",
            "DHT11 Temperature/Humidity Sensor",
            "Buzzer",
        ]),
    ]
}

/// Inserts the default kits when the store is empty. Returns how many were inserted.
pub async fn seed_kits(store: &dyn KitStore) -> Result<usize, StoreError> {
    let count = store.count().await?;
    if count > 0 {
        info!("Kits collection already has {} documents, skipping seed", count);
        return Ok(0);
    }
    let inserted = store.insert_many(seed_data()).await?;
    info!("🌱 Seeded {} kits", inserted);
    Ok(inserted)
}

// --- MongoDB ---

#[derive(Debug, Serialize, Deserialize)]
struct KitDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    #[serde(default)]
    parts: Vec<String>,
}

impl KitDocument {
    fn into_kit(self) -> Kit {
        Kit {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: self.name,
            parts: self.parts,
        }
    }
}

pub struct MongoKitStore {
    client: Client,
    kits: Collection<KitDocument>,
    closed: AtomicBool,
}

impl MongoKitStore {
    /// Connects and pings the server; an unreachable server is an error here.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        options.app_name = Some("buildit".to_string());
        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        info!("✅ Connected to MongoDB database '{}'", database);
        let kits = client.database(database).collection::<KitDocument>(KITS_COLLECTION);
        Ok(Self { client, kits, closed: AtomicBool::new(false) })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) { Err(StoreError::Closed) } else { Ok(()) }
    }
}

#[async_trait]
impl KitStore for MongoKitStore {
    async fn list(&self) -> Result<Vec<Kit>, StoreError> {
        self.ensure_open()?;
        let docs: Vec<KitDocument> = self.kits.find(doc! {}).await?.try_collect().await?;
        Ok(docs.into_iter().map(KitDocument::into_kit).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Kit>, StoreError> {
        self.ensure_open()?;
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self.kits.find_one(doc! { "_id": oid }).await?;
        Ok(found.map(KitDocument::into_kit))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.kits.count_documents(doc! {}).await?)
    }

    async fn insert_many(&self, kits: Vec<NewKit>) -> Result<usize, StoreError> {
        self.ensure_open()?;
        if kits.is_empty() {
            return Ok(0);
        }
        let docs = kits.into_iter().map(|k| KitDocument { id: None, name: k.name, parts: k.parts });
        let result = self.kits.insert_many(docs).await?;
        Ok(result.inserted_ids.len())
    }

    async fn health(&self) -> StoreHealth {
        if self.closed.load(Ordering::Acquire) {
            return StoreHealth::Disconnected;
        }
        match self.client.database("admin").run_command(doc! { "ping": 1 }).await {
            Ok(_) => StoreHealth::Connected,
            Err(e) => {
                warn!("MongoDB ping failed: {}", e);
                StoreHealth::Error
            }
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.client.clone().shutdown().await;
            info!("MongoDB connection closed");
        }
    }
}

// --- In-memory ---

#[derive(Default)]
pub struct MemoryKitStore {
    kits: RwLock<Vec<Kit>>,
    closed: AtomicBool,
}

impl MemoryKitStore {
    pub fn new() -> Self { Self::default() }

    /// Store preloaded with kits whose ids are already chosen.
    pub fn with_kits(kits: Vec<Kit>) -> Self {
        Self { kits: RwLock::new(kits), closed: AtomicBool::new(false) }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) { Err(StoreError::Closed) } else { Ok(()) }
    }
}

#[async_trait]
impl KitStore for MemoryKitStore {
    async fn list(&self) -> Result<Vec<Kit>, StoreError> {
        self.ensure_open()?;
        Ok(self.kits.read().clone())
    }

    async fn find(&self, id: &str) -> Result<Option<Kit>, StoreError> {
        self.ensure_open()?;
        Ok(self.kits.read().iter().find(|k| k.id == id).cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.kits.read().len() as u64)
    }

    async fn insert_many(&self, kits: Vec<NewKit>) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let n = kits.len();
        let mut guard = self.kits.write();
        guard.extend(kits.into_iter().map(|k| Kit { id: Uuid::new_v4().to_string(), name: k.name, parts: k.parts }));
        Ok(n)
    }

    async fn health(&self) -> StoreHealth {
        if self.closed.load(Ordering::Acquire) { StoreHealth::Disconnected } else { StoreHealth::Connected }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
