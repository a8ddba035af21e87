//! Waives to the station and high fives between users

use crate::{
    access::{Session, Uid},
    api::{self, LatLon},
    units::Timestamp,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tracing::debug;

pub type WaiveId = u64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SocialError {
    #[error(transparent)]
    InvalidLocation(#[from] crate::Error),

    #[error("Waive {0} does not exist")]
    UnknownWaive(WaiveId),

    #[error("Cannot high five your own waive")]
    OwnWaive,

    #[error("Waive {0} was already high fived by this user")]
    AlreadyHighFived(WaiveId),
}

impl SocialError {
    pub fn http_status(&self) -> u16 {
        match self {
            SocialError::InvalidLocation(e) => e.http_status(),
            SocialError::UnknownWaive(_) => 404,
            SocialError::OwnWaive => 400,
            SocialError::AlreadyHighFived(_) => 409,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waive {
    pub id: WaiveId,
    pub uid: Uid,
    pub location: LatLon,
    pub at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighFive {
    pub waive_id: WaiveId,
    pub uid: Uid,
    pub at: Timestamp,
}

/// Persistence for waives and high fives, backed by an external store
pub trait WaiveStore: Send + Sync {
    /// Stores a new waive and returns it with its assigned id
    fn insert_waive(&self, uid: &str, location: LatLon, at: Timestamp) -> Waive;
    fn waive(&self, id: WaiveId) -> Option<Waive>;
    fn recent_waives(&self, limit: usize) -> Vec<Waive>;
    fn high_fives(&self, waive_id: WaiveId) -> Vec<HighFive>;
    fn insert_high_five(&self, high_five: HighFive);
}

#[derive(Clone)]
pub struct Social {
    store: Arc<dyn WaiveStore>,
}

impl Social {
    pub fn new(store: Arc<dyn WaiveStore>) -> Self {
        Social { store }
    }

    pub fn waive(
        &self,
        session: &Session,
        latitude: f64,
        longitude: f64,
        at: Timestamp,
    ) -> Result<Waive, SocialError> {
        let location = api::coordinates(latitude, longitude)?;
        let waive = self.store.insert_waive(session.uid(), location, at);
        debug!(id = waive.id, uid = %waive.uid, ?location, "Waive");
        Ok(waive)
    }

    pub fn high_five(
        &self,
        session: &Session,
        waive_id: WaiveId,
        at: Timestamp,
    ) -> Result<HighFive, SocialError> {
        let waive = self
            .store
            .waive(waive_id)
            .ok_or(SocialError::UnknownWaive(waive_id))?;
        if waive.uid == session.uid() {
            return Err(SocialError::OwnWaive);
        }
        if self
            .store
            .high_fives(waive_id)
            .iter()
            .any(|h| h.uid == session.uid())
        {
            return Err(SocialError::AlreadyHighFived(waive_id));
        }
        let high_five = HighFive {
            waive_id,
            uid: session.uid().to_owned(),
            at,
        };
        self.store.insert_high_five(high_five.clone());
        debug!(waive_id, uid = %high_five.uid, "High five");
        Ok(high_five)
    }

    pub fn high_fives(&self, waive_id: WaiveId) -> Result<Vec<HighFive>, SocialError> {
        self.store
            .waive(waive_id)
            .ok_or(SocialError::UnknownWaive(waive_id))?;
        Ok(self.store.high_fives(waive_id))
    }

    /// Newest first
    pub fn recent_waives(&self, limit: usize) -> Vec<Waive> {
        self.store.recent_waives(limit)
    }
}

#[derive(Debug, Default)]
struct WaiveTables {
    next_id: WaiveId,
    waives: BTreeMap<WaiveId, Waive>,
    high_fives: BTreeMap<WaiveId, Vec<HighFive>>,
}

#[derive(Debug, Default)]
pub struct InMemoryWaiveStore {
    tables: Mutex<WaiveTables>,
}

impl WaiveStore for InMemoryWaiveStore {
    fn insert_waive(&self, uid: &str, location: LatLon, at: Timestamp) -> Waive {
        let mut t = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        t.next_id += 1;
        let waive = Waive {
            id: t.next_id,
            uid: uid.to_owned(),
            location,
            at,
        };
        t.waives.insert(waive.id, waive.clone());
        waive
    }

    fn waive(&self, id: WaiveId) -> Option<Waive> {
        let t = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        t.waives.get(&id).cloned()
    }

    fn recent_waives(&self, limit: usize) -> Vec<Waive> {
        let t = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut waives: Vec<Waive> = t.waives.values().cloned().collect();
        // Ids break ties between waives made at the same instant
        waives.sort_by(|a, b| b.at.cmp(&a.at).then(b.id.cmp(&a.id)));
        waives.truncate(limit);
        waives
    }

    fn high_fives(&self, waive_id: WaiveId) -> Vec<HighFive> {
        let t = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        t.high_fives.get(&waive_id).cloned().unwrap_or_default()
    }

    fn insert_high_five(&self, high_five: HighFive) {
        let mut t = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        t.high_fives
            .entry(high_five.waive_id)
            .or_default()
            .push(high_five);
    }
}
