//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::defaults::SITE_SECTION_PREFIX;
use super::file::ConfigFileError;
use super::settings::{ConfigFile, SiteSettings};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = section.get("poll_interval_secs") {
            config.tracking.poll_interval_secs =
                parse_positive_secs("tracking", "poll_interval_secs", v)?;
        }
        if let Some(v) = section.get("initial_timeout_secs") {
            config.tracking.initial_timeout_secs =
                parse_positive_secs("tracking", "initial_timeout_secs", v)?;
        }
        if let Some(v) = section.get("watch_timeout_secs") {
            config.tracking.watch_timeout_secs =
                parse_positive_secs("tracking", "watch_timeout_secs", v)?;
        }
        if let Some(v) = section.get("geofence_radius_m") {
            config.tracking.geofence_radius_m = match v.trim().parse::<f64>() {
                Ok(radius) if radius.is_finite() && radius > 0.0 => radius,
                _ => {
                    return Err(invalid(
                        "tracking",
                        "geofence_radius_m",
                        v,
                        "must be a positive number (meters)",
                    ))
                }
            };
        }
        if let Some(v) = section.get("collection") {
            config.tracking.collection = parse_name("tracking", "collection", v)?;
        }
        if let Some(v) = section.get("key_prefix") {
            config.tracking.key_prefix = parse_name("tracking", "key_prefix", v)?;
        }
    }

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.store.directory = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    // [site.<id>] sections
    for (name, properties) in ini.iter() {
        let Some(id) = name.and_then(|n| n.strip_prefix(SITE_SECTION_PREFIX)) else {
            continue;
        };
        config.sites.push(parse_site(id, properties)?);
    }

    Ok(config)
}

fn parse_site(id: &str, properties: &Properties) -> Result<SiteSettings, ConfigFileError> {
    let section = format!("{SITE_SECTION_PREFIX}{id}");
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid(&section, "id", id, "site id must not be empty"));
    }

    let lat = parse_coordinate(&section, "lat", properties.get("lat"), 90.0)?;
    let lng = parse_coordinate(&section, "lng", properties.get("lng"), 180.0)?;
    let name = properties
        .get("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(id)
        .to_string();

    Ok(SiteSettings {
        id: id.to_string(),
        name,
        lat,
        lng,
    })
}

fn parse_coordinate(
    section: &str,
    key: &str,
    value: Option<&str>,
    limit: f64,
) -> Result<f64, ConfigFileError> {
    let Some(v) = value else {
        return Err(invalid(section, key, "", "required"));
    };
    match v.trim().parse::<f64>() {
        Ok(degrees) if degrees.is_finite() && degrees.abs() <= limit => Ok(degrees),
        _ => Err(invalid(
            section,
            key,
            v,
            &format!("must be a number between -{limit} and {limit} (degrees)"),
        )),
    }
}

fn parse_positive_secs(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(invalid(
            section,
            key,
            value,
            "must be a positive integer (seconds)",
        )),
    }
}

/// Collection names and key prefixes become store path segments.
fn parse_name(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if v.is_empty() || v.contains(&['/', '\\'][..]) {
        return Err(invalid(
            section,
            key,
            value,
            "must be non-empty and contain no path separators",
        ));
    }
    Ok(v.to_string())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use crate::tracking::DEFAULT_POLL_INTERVAL_SECS;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.tracking.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_tracking_section() {
        let config = parse(
            r#"
[tracking]
poll_interval_secs = 30
initial_timeout_secs = 5
watch_timeout_secs = 20
geofence_radius_m = 150.5
collection = fleet
key_prefix = EXT
"#,
        )
        .unwrap();

        assert_eq!(config.tracking.poll_interval_secs, 30);
        assert_eq!(config.tracking.initial_timeout_secs, 5);
        assert_eq!(config.tracking.watch_timeout_secs, 20);
        assert_eq!(config.tracking.geofence_radius_m, 150.5);
        assert_eq!(config.tracking.collection, "fleet");
        assert_eq!(config.tracking.key_prefix, "EXT");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = parse("[tracking]\npoll_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("tracking.poll_interval_secs"));
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_negative_radius_rejected() {
        assert!(parse("[tracking]\ngeofence_radius_m = -5\n").is_err());
        assert!(parse("[tracking]\ngeofence_radius_m = abc\n").is_err());
    }

    #[test]
    fn test_key_prefix_with_separator_rejected() {
        assert!(parse("[tracking]\nkey_prefix = a/b\n").is_err());
    }

    #[test]
    fn test_store_and_logging_paths() {
        let config = parse(
            r#"
[store]
directory = /var/lib/fleettrack

[logging]
directory = /var/log/fleettrack
file = tracker.log
"#,
        )
        .unwrap();

        assert_eq!(config.store.directory, PathBuf::from("/var/lib/fleettrack"));
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/fleettrack"));
        assert_eq!(config.logging.file, "tracker.log");
    }

    #[test]
    fn test_site_sections() {
        let config = parse(
            r#"
[site.north]
name = North Depot
lat = -34.1
lng = -58.9

[site.south]
lat = -35.0
lng = -59.0
"#,
        )
        .unwrap();

        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[0].id, "north");
        assert_eq!(config.sites[0].name, "North Depot");
        assert_eq!(config.sites[0].lat, -34.1);
        // Name falls back to the id
        assert_eq!(config.sites[1].name, "south");
    }

    #[test]
    fn test_site_missing_coordinate() {
        let err = parse("[site.x]\nname = X\nlat = -34.0\n").unwrap_err();
        assert!(err.to_string().contains("site.x.lng"));
    }

    #[test]
    fn test_site_out_of_range() {
        let err = parse("[site.x]\nlat = -95.0\nlng = 0\n").unwrap_err();
        assert!(err.to_string().contains("between -90 and 90"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/store");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("store"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    fn test_default_store_directory_name() {
        let config = parse("").unwrap();
        assert!(config.store.directory.ends_with(DEFAULT_STORE_DIR_NAME));
    }
}
