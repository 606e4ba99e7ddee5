//! Track command - replay a recorded trip through the geofenced reporter.
//!
//! The trip file drives both the one-shot poll and the position watch. The
//! session ends when the unit arrives at a site, when the trip runs out of
//! fixes, or on Ctrl+C.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use fleettrack::host::ReplaySource;
use fleettrack::tracking::{GeofencedReporter, Sector, TrackedUnit, TrackingStatus};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Trip file with one `lat,lng[,accuracy_m]` fix per line
    #[arg(long, value_name = "FILE")]
    pub trip: PathBuf,

    /// Unit identifier
    #[arg(long)]
    pub unit: String,

    /// License plate
    #[arg(long)]
    pub plate: String,

    /// Driver name
    #[arg(long)]
    pub driver: String,

    /// Business sector: bulk, distribution or medical-gas
    #[arg(long)]
    pub sector: Option<Sector>,

    /// Route document (distribution units only)
    #[arg(long, value_name = "ID")]
    pub route: Option<String>,

    /// Checklist the trip was started from
    #[arg(long, value_name = "ID")]
    pub checklist: Option<String>,

    /// Delay between replayed fixes on the watch, in milliseconds
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub step_ms: u64,
}

impl TrackArgs {
    fn tracked_unit(&self) -> TrackedUnit {
        let mut unit = TrackedUnit::new(&self.unit, &self.plate, &self.driver);
        if let Some(sector) = self.sector {
            unit = unit.with_sector(sector);
        }
        if let Some(route) = &self.route {
            unit = unit.with_route_document(route);
        }
        if let Some(checklist) = &self.checklist {
            unit = unit.with_checklist(checklist);
        }
        unit
    }
}

/// How the replay loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Arrived,
    TripEnded,
    Interrupted,
}

/// Run the track command.
pub fn run(args: TrackArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("track");

    let step = Duration::from_millis(args.step_ms.max(1));
    let source = ReplaySource::from_file(&args.trip, step)?;
    let config = runner.config();
    let reporter_config = config.reporter_config();
    let key = reporter_config.document_key(&args.unit);

    println!("Trip:  {} ({} fixes)", args.trip.display(), source.remaining());
    println!("Store: {} [{}/{}]", config.store.directory.display(), reporter_config.collection, key);
    println!();

    let mut reporter = GeofencedReporter::new(
        Arc::new(source.clone()),
        Arc::new(runner.store()),
        config.site_table(),
    )
    .with_config(reporter_config);

    let unit = args.tracked_unit();
    let runtime = runner.runtime()?;

    let (ending, status) = runtime.block_on(async move {
        reporter.start(unit).await?;
        println!("Tracking started. Press Ctrl+C to stop.");

        let ending = wait_for_end(&reporter, &source, step).await;
        reporter.stop().await;
        Ok::<_, CliError>((ending, reporter.status()))
    })?;

    info!(?ending, "Track command finished");
    print_summary(ending, &status);
    Ok(())
}

async fn wait_for_end<P, S>(
    reporter: &GeofencedReporter<P, S>,
    source: &ReplaySource,
    step: Duration,
) -> Ending
where
    P: fleettrack::host::PositionSource,
    S: fleettrack::host::DocumentStore,
{
    let mut status = reporter.subscribe();
    if !status.borrow_and_update().is_tracking {
        return Ending::Arrived;
    }

    let mut ticker = tokio::time::interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping session");
                return Ending::Interrupted;
            }

            changed = status.changed() => {
                if changed.is_err() {
                    warn!("Status channel closed");
                    return Ending::TripEnded;
                }
                if !status.borrow_and_update().is_tracking {
                    return Ending::Arrived;
                }
            }

            _ = ticker.tick() => {
                if source.is_exhausted() {
                    // Give the last fix time to reach the store.
                    tokio::time::sleep(step).await;
                    if !reporter.is_tracking() {
                        return Ending::Arrived;
                    }
                    return Ending::TripEnded;
                }
            }
        }
    }
}

fn print_summary(ending: Ending, status: &TrackingStatus) {
    println!();
    match (ending, status.arrived_at_site.as_deref()) {
        (_, Some(site)) => println!("Arrived at {site}."),
        (Ending::Interrupted, None) => println!("Stopped by user."),
        _ => println!("Trip ended before reaching a site."),
    }

    if let Some(at) = status.last_update {
        println!("Last update: {}", at.to_rfc3339());
    }
    if let Some(error) = &status.error {
        println!("Last error:  {error}");
    }
}
