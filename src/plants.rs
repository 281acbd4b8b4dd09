//! The plant list and its per-day care flags.
//!
//! The list is shared as an immutable snapshot; every mutation builds a new
//! list and swaps it in, so readers holding an older snapshot never observe
//! a half-applied change.

use crate::errors::PlantError;
use crate::models::{AppData, Plant, PlantStatus, StatusField};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlantStore {
    plants: Arc<Vec<Plant>>,
}

impl PlantStore {
    pub fn new(plants: Vec<Plant>) -> Self {
        Self {
            plants: Arc::new(plants),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Plant>> {
        Arc::clone(&self.plants)
    }

    pub fn set(&mut self, plants: Vec<Plant>) {
        self.plants = Arc::new(plants);
    }

    pub fn get(&self, id: u64) -> Option<&Plant> {
        self.plants.iter().find(|plant| plant.id == id)
    }

    pub fn add(
        &mut self,
        name: &str,
        kind: &str,
        image: Option<String>,
        today: NaiveDate,
    ) -> Result<Plant, PlantError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlantError::BlankName);
        }

        let id = match self.plants.iter().map(|plant| plant.id).max() {
            Some(max) => max.checked_add(1).ok_or(PlantError::IdsExhausted)?,
            None => 1,
        };
        let plant = new_plant(id, name, kind.trim(), image, today);

        let mut next = Vec::with_capacity(self.plants.len() + 1);
        next.extend(self.plants.iter().cloned());
        next.push(plant.clone());
        self.set(next);

        Ok(plant)
    }

    /// Flips one flag of `today`'s entry for the plant, returning the new entry.
    pub fn toggle_status(
        &mut self,
        id: u64,
        field: StatusField,
        today: NaiveDate,
    ) -> Result<PlantStatus, PlantError> {
        if self.get(id).is_none() {
            return Err(PlantError::NotFound(id));
        }

        let key = date_key(today);
        let mut updated = PlantStatus::default();
        let next = self
            .plants
            .iter()
            .map(|plant| {
                if plant.id != id {
                    return plant.clone();
                }
                updated = status_on(plant, today).flipped(field);
                let mut status = plant.status.clone();
                status.insert(key.clone(), updated);
                Plant {
                    status,
                    ..plant.clone()
                }
            })
            .collect();
        self.set(next);

        Ok(updated)
    }

    pub fn to_data(&self) -> AppData {
        AppData {
            plants: self.plants.as_ref().clone(),
        }
    }
}

pub fn new_plant(
    id: u64,
    name: &str,
    kind: &str,
    image: Option<String>,
    today: NaiveDate,
) -> Plant {
    let mut status = BTreeMap::new();
    status.insert(date_key(today), PlantStatus::default());

    Plant {
        id,
        name: name.to_string(),
        kind: kind.to_string(),
        age: 0,
        planted_date: today,
        image: image.filter(|value| !value.trim().is_empty()),
        status,
    }
}

/// A missing entry reads as nothing done yet.
pub fn status_on(plant: &Plant, day: NaiveDate) -> PlantStatus {
    plant
        .status
        .get(&date_key(day))
        .copied()
        .unwrap_or_default()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
