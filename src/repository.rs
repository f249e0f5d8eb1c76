//! Typed CRUD over the document store.
//!
//! Reads never fail: a store error is logged and surfaces as an empty result,
//! so a list screen shows nothing rather than an error. Writes propagate a
//! [`RepositoryError`] carrying the underlying message.

use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::database::{DatabaseError, DocumentFilter, DocumentStore, StoredDocument};
use crate::models::{FuelLog, MaintenanceRecord, PasswordReset, Reminder, Session, User, Vehicle};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{collection}: {source}")]
    Store {
        collection: &'static str,
        #[source]
        source: DatabaseError,
    },
    #[error("Failed to encode {collection} record: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot update a {0} record without an id")]
    MissingId(&'static str),
}

/// A record that lives in a named document collection
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Owning record, used for per-parent listings
    fn parent_id(&self) -> Option<&str> {
        None
    }

    /// Secondary key used for narrowing listings
    fn category(&self) -> Option<&str> {
        None
    }
}

pub struct Repository<T: Document> {
    store: Rc<dyn DocumentStore>,
    _record: PhantomData<T>,
}

impl<T: Document> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn decode(doc: StoredDocument) -> Option<T> {
        match serde_json::from_value::<T>(doc.body) {
            Ok(mut record) => {
                record.set_id(doc.id);
                Some(record)
            }
            Err(e) => {
                tracing::warn!(collection = T::COLLECTION, id = %doc.id, error = %e, "skipping undecodable document");
                None
            }
        }
    }

    fn encode(record: &T) -> Result<StoredDocument, RepositoryError> {
        let body = serde_json::to_value(record).map_err(|source| RepositoryError::Encode {
            collection: T::COLLECTION,
            source,
        })?;
        Ok(StoredDocument {
            id: record.id().to_string(),
            parent_id: record.parent_id().map(str::to_string),
            category: record.category().map(str::to_string),
            body,
        })
    }

    fn store_error(source: DatabaseError) -> RepositoryError {
        RepositoryError::Store {
            collection: T::COLLECTION,
            source,
        }
    }

    /// All documents matching `filter`; empty on failure
    pub fn list(&self, filter: &DocumentFilter) -> Vec<T> {
        match self.store.list(T::COLLECTION, filter) {
            Ok(docs) => docs.into_iter().filter_map(Self::decode).collect(),
            Err(e) => {
                tracing::warn!(collection = T::COLLECTION, error = %e, "list failed");
                Vec::new()
            }
        }
    }

    pub fn list_for(&self, parent_id: &str) -> Vec<T> {
        self.list(&DocumentFilter::by_parent(parent_id))
    }

    /// Single record by id; `None` when absent or on failure
    pub fn get(&self, id: &str) -> Option<T> {
        match self.store.get(T::COLLECTION, id) {
            Ok(doc) => doc.and_then(Self::decode),
            Err(e) => {
                tracing::warn!(collection = T::COLLECTION, id, error = %e, "get failed");
                None
            }
        }
    }

    /// Store a new record, generating an id when it has none. Returns the id.
    pub fn add(&self, record: &T) -> Result<String, RepositoryError> {
        let mut doc = Self::encode(record)?;
        if doc.id.is_empty() {
            doc.id = uuid::Uuid::new_v4().to_string();
        }
        self.store.put(T::COLLECTION, &doc).map_err(Self::store_error)?;
        tracing::debug!(collection = T::COLLECTION, id = %doc.id, "added");
        Ok(doc.id)
    }

    /// Overwrite an existing record in place
    pub fn update(&self, record: &T) -> Result<(), RepositoryError> {
        if record.id().is_empty() {
            return Err(RepositoryError::MissingId(T::COLLECTION));
        }
        let doc = Self::encode(record)?;
        self.store.put(T::COLLECTION, &doc).map_err(Self::store_error)?;
        tracing::debug!(collection = T::COLLECTION, id = %doc.id, "updated");
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = self.store.delete(T::COLLECTION, id).map_err(Self::store_error)?;
        if !removed {
            tracing::debug!(collection = T::COLLECTION, id, "delete of missing document");
        }
        Ok(())
    }
}

pub type VehicleRepository = Repository<Vehicle>;
pub type MaintenanceRepository = Repository<MaintenanceRecord>;
pub type FuelLogRepository = Repository<FuelLog>;
pub type ReminderRepository = Repository<Reminder>;
pub type UserRepository = Repository<User>;

impl Document for Vehicle {
    const COLLECTION: &'static str = "vehicles";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
}

impl Document for MaintenanceRecord {
    const COLLECTION: &'static str = "maintenance";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.vehicle_id.as_str())
    }
    fn category(&self) -> Option<&str> {
        Some(self.record_type.as_str())
    }
}

impl Document for FuelLog {
    const COLLECTION: &'static str = "fuel_logs";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.vehicle_id.as_str())
    }
}

impl Document for Reminder {
    const COLLECTION: &'static str = "reminders";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
    // Reminders are narrowed per vehicle
    fn category(&self) -> Option<&str> {
        Some(self.vehicle_id.as_str())
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    // Lookup key for sign-in
    fn category(&self) -> Option<&str> {
        Some(self.email.as_str())
    }
}

impl Document for Session {
    const COLLECTION: &'static str = "sessions";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
}

impl Document for PasswordReset {
    const COLLECTION: &'static str = "password_resets";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn parent_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
}

/// All repositories over one shared store
#[derive(Clone)]
pub struct Repositories {
    pub vehicles: VehicleRepository,
    pub maintenance: MaintenanceRepository,
    pub fuel_logs: FuelLogRepository,
    pub reminders: ReminderRepository,
}

impl Repositories {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self {
            vehicles: Repository::new(Rc::clone(&store)),
            maintenance: Repository::new(Rc::clone(&store)),
            fuel_logs: Repository::new(Rc::clone(&store)),
            reminders: Repository::new(store),
        }
    }

    /// Delete a vehicle together with everything recorded against it
    pub fn delete_vehicle_cascade(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        for record in self.maintenance.list_for(&vehicle.id) {
            self.maintenance.delete(&record.id)?;
        }
        for log in self.fuel_logs.list_for(&vehicle.id) {
            self.fuel_logs.delete(&log.id)?;
        }
        let reminders = self.reminders.list(
            &DocumentFilter::by_parent(vehicle.user_id.as_str()).with_category(vehicle.id.as_str()),
        );
        for reminder in reminders {
            self.reminders.delete(&reminder.id)?;
        }
        self.vehicles.delete(&vehicle.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    /// A store whose every call fails
    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn put(&self, _collection: &str, _doc: &StoredDocument) -> Result<(), DatabaseError> {
            Err(DatabaseError::DirectoryError("disk gone".to_string()))
        }
        fn get(&self, _collection: &str, _id: &str) -> Result<Option<StoredDocument>, DatabaseError> {
            Err(DatabaseError::DirectoryError("disk gone".to_string()))
        }
        fn list(&self, _collection: &str, _filter: &DocumentFilter) -> Result<Vec<StoredDocument>, DatabaseError> {
            Err(DatabaseError::DirectoryError("disk gone".to_string()))
        }
        fn delete(&self, _collection: &str, _id: &str) -> Result<bool, DatabaseError> {
            Err(DatabaseError::DirectoryError("disk gone".to_string()))
        }
    }

    fn store() -> Rc<dyn DocumentStore> {
        Rc::new(Database::in_memory().unwrap())
    }

    fn vehicle(name: &str, user_id: &str) -> Vehicle {
        Vehicle {
            id: String::new(),
            name: name.to_string(),
            make: "Volvo".to_string(),
            model: "240".to_string(),
            year: Some(1990),
            license_plate: String::new(),
            mileage: 250_000,
            user_id: user_id.to_string(),
        }
    }

    #[test]
    fn add_assigns_id_and_get_restores_it() {
        let repos = Repositories::new(store());
        let id = repos.vehicles.add(&vehicle("Brick", "u1")).unwrap();
        assert!(!id.is_empty());
        let loaded = repos.vehicles.get(&id).unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Brick");
    }

    #[test]
    fn list_for_scopes_by_owner() {
        let repos = Repositories::new(store());
        repos.vehicles.add(&vehicle("Brick", "u1")).unwrap();
        repos.vehicles.add(&vehicle("Wagon", "u2")).unwrap();
        let mine = repos.vehicles.list_for("u1");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Brick");
    }

    #[test]
    fn update_requires_id() {
        let repos = Repositories::new(store());
        let err = repos.vehicles.update(&vehicle("Brick", "u1")).unwrap_err();
        assert!(matches!(err, RepositoryError::MissingId("vehicles")));
    }

    #[test]
    fn update_overwrites_in_place() {
        let repos = Repositories::new(store());
        let id = repos.vehicles.add(&vehicle("Brick", "u1")).unwrap();
        let mut v = repos.vehicles.get(&id).unwrap();
        v.mileage = 260_000;
        repos.vehicles.update(&v).unwrap();
        assert_eq!(repos.vehicles.list_for("u1").len(), 1);
        assert_eq!(repos.vehicles.get(&id).unwrap().mileage, 260_000);
    }

    #[test]
    fn reads_swallow_store_errors() {
        let repos = Repositories::new(Rc::new(BrokenStore));
        assert!(repos.vehicles.list_for("u1").is_empty());
        assert!(repos.vehicles.get("anything").is_none());
    }

    #[test]
    fn writes_report_store_errors() {
        let repos = Repositories::new(Rc::new(BrokenStore));
        let err = repos.vehicles.add(&vehicle("Brick", "u1")).unwrap_err();
        assert_eq!(err.to_string(), "vehicles: Failed to create database directory: disk gone");
        assert!(repos.vehicles.delete("x").is_err());
    }

    #[test]
    fn cascade_removes_everything_for_the_vehicle() {
        let repos = Repositories::new(store());
        let id = repos.vehicles.add(&vehicle("Brick", "u1")).unwrap();
        let other = repos.vehicles.add(&vehicle("Wagon", "u1")).unwrap();
        for vehicle_id in [&id, &other] {
            repos
                .maintenance
                .add(&MaintenanceRecord {
                    id: String::new(),
                    record_type: "Oil change".to_string(),
                    date: "2024-01-01".to_string(),
                    mileage: 1,
                    cost: 50.0,
                    notes: String::new(),
                    vehicle_id: vehicle_id.clone(),
                })
                .unwrap();
        }

        let brick = repos.vehicles.get(&id).unwrap();
        repos.delete_vehicle_cascade(&brick).unwrap();

        assert!(repos.vehicles.get(&id).is_none());
        assert!(repos.maintenance.list_for(&id).is_empty());
        assert_eq!(repos.maintenance.list_for(&other).len(), 1);
    }
}
