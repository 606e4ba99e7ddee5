//! Show command - print a unit's stored location record.

use std::path::Path;

use fleettrack::host::{DocumentStore, JsonDirStore, StoreError};
use fleettrack::tracking::LocationRecord;

use super::common::{load_config, new_runtime};
use crate::error::CliError;

/// Run the show command.
pub fn run(unit: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let reporter_config = config.reporter_config();
    let key = reporter_config.document_key(unit);
    let store = JsonDirStore::new(config.store.directory.clone());

    let runtime = new_runtime()?;
    let fields = runtime
        .block_on(store.get(&reporter_config.collection, &key))?
        .ok_or_else(|| CliError::NotFound {
            unit: unit.to_string(),
            key: key.clone(),
        })?;

    match LocationRecord::from_fields(fields.clone()) {
        Ok(record) => print_summary(&record),
        Err(e) => println!("(record does not match the expected shape: {e})"),
    }

    println!();
    let json = serde_json::to_string_pretty(&fields).map_err(StoreError::from)?;
    println!("{json}");

    Ok(())
}

fn print_summary(record: &LocationRecord) {
    let state = if record.is_at_site {
        format!("at {}", record.site_name.as_deref().unwrap_or("site"))
    } else if record.is_active {
        "in transit".to_string()
    } else {
        "stopped".to_string()
    };

    println!("Unit:     {} ({})", record.unit_id, record.plate);
    println!("Driver:   {}", record.driver_name);
    println!("Sector:   {}", record.sector);
    println!("State:    {}", state);
    println!("Position: {:.6}, {:.6}", record.lat, record.lng);
    match record.captured_at {
        Some(at) => println!("Written:  {}", at.to_rfc3339()),
        None => println!("Written:  {} (device clock)", record.client_captured_at.to_rfc3339()),
    }
}
