//! Emergency station directory.
//!
//! Auxiliary lookup data: categories (fire, police, hospital, ...) each
//! holding stations with a phone number and a location. Read by listing the
//! whole directory or searching station locations.

use serde::{Deserialize, Serialize};

use crate::db::{next_id, Database};
use crate::error::{Error, Result};
use crate::model::required_text;
use crate::query::matches_terms;

pub type CategoryId = u64;
pub type StationId = u64;

const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCategory {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub category_id: CategoryId,
    pub name: String,
    pub phone: String,
    pub station_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDraft {
    pub name: String,
    pub phone: String,
    pub station_location: String,
}

/// A category with its stations, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub stations: Vec<Station>,
}

pub fn add_category(db: &mut Database, name: &str) -> Result<StationCategory> {
    let name = required_text("category name", name, MAX_NAME_CHARS)?;
    if db
        .station_categories
        .iter()
        .any(|category| category.name.eq_ignore_ascii_case(&name))
    {
        return Err(Error::UniqueViolation {
            table: "station_categories",
            key: name,
        });
    }

    let category = StationCategory {
        id: next_id(&mut db.sequences.station_categories),
        name,
    };
    db.station_categories.push(category.clone());
    Ok(category)
}

/// Look a category up by id or, failing that, by case-insensitive name.
pub fn find_category<'a>(db: &'a Database, key: &str) -> Option<&'a StationCategory> {
    let key = key.trim();
    if let Ok(id) = key.parse::<CategoryId>() {
        if let Some(category) = db.station_categories.iter().find(|c| c.id == id) {
            return Some(category);
        }
    }
    db.station_categories
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(key))
}

pub fn add_station(db: &mut Database, category: &str, draft: StationDraft) -> Result<Station> {
    let category_id = find_category(db, category)
        .map(|category| category.id)
        .ok_or_else(|| Error::not_found("station category", category))?;

    let name = required_text("station name", &draft.name, MAX_NAME_CHARS)?;
    let phone = required_text("phone", &draft.phone, MAX_NAME_CHARS)?;
    let station_location = required_text("station location", &draft.station_location, 500)?;

    let station = Station {
        id: next_id(&mut db.sequences.stations),
        category_id,
        name,
        phone,
        station_location,
    };
    db.stations.push(station.clone());
    Ok(station)
}

/// Every category (by id) with its stations (by id).
pub fn list(db: &Database) -> Vec<CategoryView> {
    let mut categories: Vec<&StationCategory> = db.station_categories.iter().collect();
    categories.sort_by_key(|category| category.id);

    categories
        .into_iter()
        .map(|category| {
            let mut stations: Vec<Station> = db
                .stations
                .iter()
                .filter(|station| station.category_id == category.id)
                .cloned()
                .collect();
            stations.sort_by_key(|station| station.id);
            CategoryView {
                id: category.id,
                name: category.name.clone(),
                stations,
            }
        })
        .collect()
}

/// Stations whose location contains every whitespace-separated term.
pub fn search(db: &Database, query: &str) -> Vec<Station> {
    let mut stations: Vec<Station> = db
        .stations
        .iter()
        .filter(|station| matches_terms(&station.station_location, query))
        .cloned()
        .collect();
    stations.sort_by_key(|station| station.id);
    stations
}
