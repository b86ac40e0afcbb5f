use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use dashmap::DashMap;

use crate::limits::{MAX_SERVICE_NAME_LEN, MIN_SERVICE_DURATION_MIN};
use crate::model::{Service, ServiceCategory};

/// Read side the scheduling engine needs from the catalog.
pub trait Catalog: Send + Sync {
    /// Resolve an entry that can actually be booked: present, active, and
    /// category `service`.
    fn get_active_service(&self, id: &str) -> Option<Service>;

    /// Resolve any entry, active or not. Used for duration fallback and read
    /// enrichment, where a deactivated service is still better than nothing.
    fn get_service(&self, id: &str) -> Option<Service>;
}

#[derive(Debug)]
pub enum CatalogError {
    NotFound(String),
    /// Service-category entries must declare a duration of at least
    /// fifteen minutes.
    InvalidDuration,
    NegativePrice,
    LimitExceeded(&'static str),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "service not found: {id}"),
            CatalogError::InvalidDuration => write!(
                f,
                "services need a duration of at least {MIN_SERVICE_DURATION_MIN} minutes"
            ),
            CatalogError::NegativePrice => write!(f, "price and material cost must be non-negative"),
            CatalogError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            CatalogError::Io(e) => write!(f, "catalog persistence error: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub material_cost: f64,
    pub category: ServiceCategory,
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub material_cost: Option<f64>,
    pub category: Option<ServiceCategory>,
    pub duration_min: Option<u32>,
    pub image: Option<String>,
    pub active: Option<bool>,
}

/// Products must not carry a duration (it is stripped); services must carry
/// one of at least [`MIN_SERVICE_DURATION_MIN`].
fn normalize_duration(
    category: ServiceCategory,
    duration_min: Option<u32>,
) -> Result<Option<u32>, CatalogError> {
    match category {
        ServiceCategory::Product => Ok(None),
        ServiceCategory::Service => match duration_min {
            Some(d) if d >= MIN_SERVICE_DURATION_MIN => Ok(Some(d)),
            _ => Err(CatalogError::InvalidDuration),
        },
    }
}

/// In-memory catalog with optional JSON-file persistence (a flat array of
/// entries, human-editable). Writes are serialized; identifiers are numeric
/// strings assigned as max(existing)+1 and stay stable across reloads.
pub struct MemoryCatalog {
    entries: DashMap<String, Service>,
    file: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            file: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Open a file-backed catalog. A missing file starts empty; it is created
    /// on the first write.
    pub fn open(path: &Path) -> io::Result<Self> {
        let entries = DashMap::new();
        match std::fs::read(path) {
            Ok(data) => {
                let loaded: Vec<Service> = serde_json::from_slice(&data)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                tracing::info!("catalog loaded: {} entries from {}", loaded.len(), path.display());
                for service in loaded {
                    entries.insert(service.id.clone(), service);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(Self {
            entries,
            file: Some(path.to_path_buf()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn insert(&self, new: NewService, now: NaiveDateTime) -> Result<Service, CatalogError> {
        if new.name.len() > MAX_SERVICE_NAME_LEN {
            return Err(CatalogError::LimitExceeded("service name too long"));
        }
        if new.price < 0.0 || new.material_cost < 0.0 {
            return Err(CatalogError::NegativePrice);
        }
        let duration_min = normalize_duration(new.category, new.duration_min)?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let service = Service {
            id: self.next_id(),
            name: new.name,
            description: new.description,
            price: new.price,
            material_cost: new.material_cost,
            category: new.category,
            duration_min,
            image: new.image,
            active: new.active,
            created_at: now,
            updated_at: now,
        };
        self.entries.insert(service.id.clone(), service.clone());
        self.persist()?;
        Ok(service)
    }

    pub fn update(
        &self,
        id: &str,
        patch: ServicePatch,
        now: NaiveDateTime,
    ) -> Result<Service, CatalogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut service = self
            .entries
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            if name.len() > MAX_SERVICE_NAME_LEN {
                return Err(CatalogError::LimitExceeded("service name too long"));
            }
            service.name = name;
        }
        if let Some(description) = patch.description {
            service.description = description;
        }
        if let Some(price) = patch.price {
            if price < 0.0 {
                return Err(CatalogError::NegativePrice);
            }
            service.price = price;
        }
        if let Some(material_cost) = patch.material_cost {
            if material_cost < 0.0 {
                return Err(CatalogError::NegativePrice);
            }
            service.material_cost = material_cost;
        }
        if let Some(category) = patch.category {
            service.category = category;
        }
        if let Some(duration) = patch.duration_min {
            service.duration_min = Some(duration);
        }
        // Re-check the category/duration invariant against the merged result.
        service.duration_min = normalize_duration(service.category, service.duration_min)?;
        if let Some(image) = patch.image {
            service.image = image;
        }
        if let Some(active) = patch.active {
            service.active = active;
        }
        service.updated_at = now;

        self.entries.insert(service.id.clone(), service.clone());
        self.persist()?;
        Ok(service)
    }

    pub fn remove(&self, id: &str) -> Result<bool, CatalogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let removed = self.entries.remove(id).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Entries sorted newest-first.
    pub fn list(&self, active_only: bool) -> Vec<Service> {
        let mut all: Vec<Service> = self
            .entries
            .iter()
            .map(|e| e.value().clone())
            .filter(|s| !active_only || s.active)
            .collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| numeric_id(&b.id).cmp(&numeric_id(&a.id)))
        });
        all
    }

    /// Caller holds `write_lock`.
    fn next_id(&self) -> String {
        let max = self.entries.iter().map(|e| numeric_id(e.key())).max().unwrap_or(0);
        (max + 1).to_string()
    }

    /// Whole-file atomic rewrite: temp file, fsync, rename. Caller holds
    /// `write_lock`, so snapshots are monotonic.
    fn persist(&self) -> Result<(), CatalogError> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let mut all: Vec<Service> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| numeric_id(&s.id));

        let write = || -> io::Result<()> {
            use std::io::Write;
            let data = serde_json::to_vec_pretty(&all)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let tmp = path.with_extension("json.tmp");
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(&data)?;
            f.sync_all()?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        };
        write().map_err(|e| {
            tracing::error!("catalog save failed for {}: {e}", path.display());
            CatalogError::Io(e.to_string())
        })
    }
}

fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}

impl Catalog for MemoryCatalog {
    fn get_active_service(&self, id: &str) -> Option<Service> {
        self.entries
            .get(id)
            .map(|e| e.value().clone())
            .filter(Service::is_bookable)
    }

    fn get_service(&self, id: &str) -> Option<Service> {
        self.entries.get(id).map(|e| e.value().clone())
    }
}
