//! helpline station command implementation

use serde::Serialize;

use crate::cli::{GlobalOptions, Session};
use crate::error::Result;
use crate::events::EventKind;
use crate::output::{emit_success, HumanOutput};
use crate::stations::{CategoryView, Station, StationDraft};

pub struct AddCategoryOptions {
    pub name: String,
    pub global: GlobalOptions,
}

pub struct AddOptions {
    pub category: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    pub global: GlobalOptions,
}

pub struct SearchOptions {
    pub query: String,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct StationListReport {
    categories: Vec<CategoryView>,
}

#[derive(Serialize)]
struct StationSearchReport {
    query: String,
    total: usize,
    stations: Vec<Station>,
}

pub fn run_add_category(options: AddCategoryOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let category = session.desk.add_station_category(&options.name)?;

    let mut human = HumanOutput::new(format!("Category added: {}", category.name));
    human.push_summary("id", category.id.to_string());
    human.push_next_step(format!(
        "helpline station add {} --name <name> --phone <phone> --location <location>",
        category.id
    ));

    emit_success(session.output, "station add-category", &category, Some(&human))
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let station = session.desk.add_station(
        &options.category,
        StationDraft {
            name: options.name,
            phone: options.phone,
            station_location: options.location,
        },
    )?;

    let actor = session.actor_name().ok();
    let warning = session.emit(EventKind::StationAdded, actor.as_deref(), &station);

    let mut human = HumanOutput::new(format!("Station added: {}", station.name));
    human.push_summary("id", station.id.to_string());
    human.push_summary("phone", station.phone.clone());
    human.push_summary("location", station.station_location.clone());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "station add", &station, Some(&human))
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let session = Session::open(&global)?;
    let categories = session.desk.list_stations()?;

    let mut human = HumanOutput::new(format!("Station categories ({})", categories.len()));
    for category in &categories {
        human.push_detail(format!("{} {}", category.id, category.name));
        for station in &category.stations {
            human.push_detail(format!(
                "  {} {} ({}) {}",
                station.id, station.name, station.phone, station.station_location
            ));
        }
    }

    let report = StationListReport { categories };
    emit_success(session.output, "station list", &report, Some(&human))
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let stations = session.desk.search_stations(&options.query)?;

    let mut human = HumanOutput::new(format!(
        "Stations matching '{}' ({})",
        options.query,
        stations.len()
    ));
    for station in &stations {
        human.push_detail(format!(
            "{} {} ({}) {}",
            station.id, station.name, station.phone, station.station_location
        ));
    }

    let report = StationSearchReport {
        query: options.query,
        total: stations.len(),
        stations,
    };
    emit_success(session.output, "station search", &report, Some(&human))
}
