//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::fmt::Write as _;
use std::path::Path;

use super::defaults::SITE_SECTION_PREFIX;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
///
/// Sites are always written out, so a saved file pins the current table.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let tracking = &config.tracking;

    let mut out = format!(
        r#"[tracking]
; Seconds between polled position requests (default: 15)
poll_interval_secs = {}
; Timeout in seconds for the first and each polled position request (default: 10)
initial_timeout_secs = {}
; Timeout in seconds handed to the continuous position watch (default: 15)
watch_timeout_secs = {}
; Distance in meters from a site at which the unit counts as arrived (default: 100)
geofence_radius_m = {}
; Store collection holding one record per unit (default: locations)
collection = {}
; Record key is <key_prefix>-<unit id> (default: INT)
key_prefix = {}

[store]
; Root directory of the local JSON document store
; Records live in <directory>/<collection>/<key>.json
directory = {}

[logging]
; Log directory and file name. The file is cleared at every start.
directory = {}
file = {}

; Sites a unit can arrive at. Each [site.<id>] needs lat and lng;
; name defaults to the id. If any site is listed, the builtin table is
; replaced entirely.
"#,
        tracking.poll_interval_secs,
        tracking.initial_timeout_secs,
        tracking.watch_timeout_secs,
        tracking.geofence_radius_m,
        tracking.collection,
        tracking.key_prefix,
        path_to_string(&config.store.directory),
        path_to_string(&config.logging.directory),
        config.logging.file,
    );

    for site in config.site_table().sites() {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\n[{SITE_SECTION_PREFIX}{}]\nname = {}\nlat = {}\nlng = {}\n",
            site.id, site.name, site.lat, site.lng
        );
    }

    out
}

/// Render a path, abbreviating the home directory as `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::SiteSettings;
    use crate::geo::SiteTable;
    use ini::Ini;

    #[test]
    fn test_written_config_parses_back() {
        let mut config = ConfigFile::default();
        config.tracking.poll_interval_secs = 20;
        config.tracking.geofence_radius_m = 75.5;
        config.tracking.key_prefix = "EXT".to_string();

        let content = to_config_string(&config);
        let ini = Ini::load_from_str(&content).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();

        assert_eq!(parsed.tracking, config.tracking);
        assert_eq!(parsed.store, config.store);
        assert_eq!(parsed.logging, config.logging);
        // The builtin table is written out explicitly
        assert_eq!(parsed.site_table(), SiteTable::builtin());
    }

    #[test]
    fn test_configured_sites_are_written() {
        let mut config = ConfigFile::default();
        config.sites.push(SiteSettings {
            id: "north".to_string(),
            name: "North Depot".to_string(),
            lat: -34.1,
            lng: -58.9,
        });

        let content = to_config_string(&config);

        assert!(content.contains("[site.north]"));
        assert!(content.contains("name = North Depot"));
        assert!(!content.contains("[site.los-cardales]"));
    }

    #[test]
    fn test_path_to_string_abbreviates_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("x")), "~/x");
        }
        assert_eq!(path_to_string(Path::new("/tmp/x")), "/tmp/x");
    }
}
