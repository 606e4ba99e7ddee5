//! Sites command - list the sites a unit can arrive at.

use std::path::Path;

use clap::Args;
use fleettrack::geo::{distance_m, SiteTable};

use super::common::{load_config, parse_position};
use crate::error::CliError;

/// Arguments for the sites command.
#[derive(Debug, Args)]
pub struct SitesArgs {
    /// Also print each site's distance from this position
    #[arg(
        long,
        value_name = "LAT,LNG",
        value_parser = parse_position,
        allow_hyphen_values = true
    )]
    pub from: Option<(f64, f64)>,
}

/// Run the sites command.
pub fn run(args: SitesArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let sites = config.site_table();
    let radius = config.tracking.geofence_radius_m;

    let source = if config.sites.is_empty() {
        "builtin"
    } else {
        "config"
    };
    println!("Sites ({}, geofence radius {} m)", source, radius);
    println!();

    for line in site_lines(&sites, radius, args.from) {
        println!("{line}");
    }

    Ok(())
}

/// One formatted line per site, with distance and an arrival marker when a
/// position is given.
fn site_lines(sites: &SiteTable, radius_m: f64, from: Option<(f64, f64)>) -> Vec<String> {
    sites
        .sites()
        .iter()
        .map(|site| {
            let base = format!(
                "  {:<16} {:<24} {:>12.6} {:>12.6}",
                site.id, site.name, site.lat, site.lng
            );
            match from {
                Some(position) => {
                    let distance = distance_m(position, site.position());
                    let marker = if distance <= radius_m { "  <- inside" } else { "" };
                    format!("{base} {:>10.0} m{marker}", distance)
                }
                None => base,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleettrack::geo::Site;

    fn table() -> SiteTable {
        SiteTable::new(vec![Site::new("depot", -34.3601, -59.0099, "Depot")])
    }

    #[test]
    fn test_lines_without_position() {
        let lines = site_lines(&table(), 100.0, None);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("depot"));
        assert!(!lines[0].contains(" m"));
    }

    #[test]
    fn test_lines_mark_inside() {
        let lines = site_lines(&table(), 100.0, Some((-34.3602, -59.0100)));
        assert!(lines[0].ends_with("<- inside"));

        let lines = site_lines(&table(), 100.0, Some((-34.0, -58.0)));
        assert!(!lines[0].contains("inside"));
    }
}
