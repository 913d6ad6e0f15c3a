use anyhow::{Context, Result};
use tracing::warn;

use crate::storage::{FAVORITES_KEY, SharedStorage};

/// Ordered, duplicate-free list of city names, persisted after every change.
///
/// Names are compared verbatim (case and diacritics included), exactly as the
/// provider spelled them.
#[derive(Debug)]
pub struct FavoritesStore {
    storage: SharedStorage,
    cities: Vec<String>,
}

impl FavoritesStore {
    /// Read the persisted list. Absent or malformed data yields an empty list.
    pub fn load(storage: SharedStorage) -> Self {
        let cities = match storage.get(FAVORITES_KEY) {
            None => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|err| {
                warn!(%err, "ignoring malformed favorites");
                Vec::new()
            }),
        };

        let mut store = Self {
            storage,
            cities: Vec::with_capacity(cities.len()),
        };
        for city in cities {
            if !store.contains(&city) {
                store.cities.push(city);
            }
        }
        store
    }

    pub fn list(&self) -> &[String] {
        &self.cities
    }

    pub fn contains(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Append `city` unless already present. Returns whether the list changed.
    pub fn add(&mut self, city: &str) -> Result<bool> {
        if self.contains(city) {
            return Ok(false);
        }
        let mut cities = self.cities.clone();
        cities.push(city.to_string());
        self.commit(cities)?;
        Ok(true)
    }

    /// Remove the first exact match. Returns whether the list changed.
    pub fn remove(&mut self, city: &str) -> Result<bool> {
        let Some(idx) = self.cities.iter().position(|c| c == city) else {
            return Ok(false);
        };
        let mut cities = self.cities.clone();
        cities.remove(idx);
        self.commit(cities)?;
        Ok(true)
    }

    /// Add or remove `city`; returns `true` when it is a favorite afterwards.
    pub fn toggle(&mut self, city: &str) -> Result<bool> {
        if self.remove(city)? {
            Ok(false)
        } else {
            self.add(city)?;
            Ok(true)
        }
    }

    /// Persist `cities`, then adopt them. A failed write keeps the old list.
    fn commit(&mut self, cities: Vec<String>) -> Result<()> {
        let json = serde_json::to_string(&cities).context("Failed to serialize favorites")?;
        self.storage.set(FAVORITES_KEY, json)?;
        self.cities = cities;
        Ok(())
    }
}
