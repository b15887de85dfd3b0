#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI entry point for the RTCC geo index.
//!
//! Provides subcommands for distance checks, nearest-zone assignment
//! against embedded or file-based zone tables, radius searches over a
//! JSON file of located records, and sector lookups against `GeoJSON`
//! boundaries.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rtcc_geo::registry::{self, DEFAULT_TABLE_ID};
use rtcc_geo::{GeoError, ZoneTable};
use rtcc_geo_models::{Coordinate, LocatedRecord};
use rtcc_spatial::{RecordIndex, SectorIndex};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Zone assignment and proximity queries for located records.
#[derive(Parser)]
#[command(name = "rtcc_geo")]
#[command(about = "Zone assignment and proximity queries for located records")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points, in kilometers.
    Distance {
        #[command(flatten)]
        from: PointArgs,

        /// Second latitude.
        #[arg(allow_negative_numbers = true)]
        to_lat: f64,

        /// Second longitude.
        #[arg(allow_negative_numbers = true)]
        to_lon: f64,
    },

    /// Nearest zone for a point.
    Zone {
        #[command(flatten)]
        point: PointArgs,

        #[command(flatten)]
        table: TableArgs,
    },

    /// List the zones of a table, or the registered tables.
    Zones {
        #[command(flatten)]
        table: TableArgs,

        /// List registered table ids instead of zones.
        #[arg(long)]
        registered: bool,
    },

    /// Records within a radius of a point, nearest first.
    Nearby {
        #[command(flatten)]
        point: PointArgs,

        /// Search radius in kilometers.
        #[arg(long)]
        radius_km: f64,

        /// JSON file containing an array of located records.
        #[arg(long)]
        records: PathBuf,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Stamp the nearest zone onto every record and print the result.
    Assign {
        /// JSON file containing an array of located records.
        #[arg(long)]
        records: PathBuf,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Sector containing a point.
    Sector {
        #[command(flatten)]
        point: PointArgs,

        /// `GeoJSON` file of sector boundary features.
        #[arg(long)]
        sectors: PathBuf,

        /// Feature property holding the sector name.
        #[arg(long, default_value = "name")]
        name_property: String,
    },
}

/// A latitude/longitude pair given positionally.
#[derive(Args)]
struct PointArgs {
    /// Latitude in decimal degrees.
    #[arg(allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in decimal degrees.
    #[arg(allow_negative_numbers = true)]
    lon: f64,
}

impl PointArgs {
    fn coordinate(&self) -> Result<Coordinate, rtcc_geo_models::InvalidCoordinateError> {
        Coordinate::try_new(self.lat, self.lon)
    }
}

/// Which zone table to use.
#[derive(Args)]
struct TableArgs {
    /// Id of an embedded zone table.
    #[arg(long, default_value = DEFAULT_TABLE_ID)]
    table: String,

    /// Path to a zone table TOML file (overrides `--table`).
    #[arg(long, conflicts_with = "table")]
    table_file: Option<PathBuf>,
}

impl TableArgs {
    fn load(&self) -> Result<ZoneTable, GeoError> {
        if let Some(path) = &self.table_file {
            return ZoneTable::load(path);
        }

        registry::zone_table(&self.table).ok_or_else(|| {
            GeoError::configuration(format!(
                "unknown zone table '{}' (registered: {})",
                self.table,
                registry::table_ids().join(", ")
            ))
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Distance {
            from,
            to_lat,
            to_lon,
        } => cmd_distance(&from, to_lat, to_lon, &mut out),
        Commands::Zone { point, table } => cmd_zone(&point, &table, &mut out),
        Commands::Zones { table, registered } => cmd_zones(&table, registered, &mut out),
        Commands::Nearby {
            point,
            radius_km,
            records,
            limit,
        } => cmd_nearby(&point, radius_km, &records, limit, &mut out),
        Commands::Assign { records, table } => cmd_assign(&records, &table, &mut out),
        Commands::Sector {
            point,
            sectors,
            name_property,
        } => cmd_sector(&point, &sectors, &name_property, &mut out),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_distance(
    from: &PointArgs,
    to_lat: f64,
    to_lon: f64,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let a = from.coordinate()?;
    let b = Coordinate::try_new(to_lat, to_lon)?;
    writeln!(out, "{:.3}", rtcc_geo::haversine_distance_km(&a, &b))?;
    Ok(())
}

fn cmd_zone(
    point: &PointArgs,
    table: &TableArgs,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let point = point.coordinate()?;
    let table = table.load()?;
    let (zone, distance) = rtcc_geo::zone::nearest_zone_with_distance(&point, table.zones())?;
    writeln!(out, "{zone} ({distance:.3} km from center)")?;
    Ok(())
}

fn cmd_zones(
    table: &TableArgs,
    registered: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    if registered {
        for id in registry::table_ids() {
            writeln!(out, "{id}")?;
        }
        return Ok(());
    }

    let table = table.load()?;
    writeln!(out, "=== {} ({}) ===", table.name(), table.id())?;
    for zone in table.zones() {
        writeln!(
            out,
            "  {:<20} {:>10.5} {:>11.5}",
            zone.name, zone.center.latitude, zone.center.longitude
        )?;
    }
    Ok(())
}

fn cmd_nearby(
    point: &PointArgs,
    radius_km: f64,
    records_path: &Path,
    limit: Option<usize>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let center = point.coordinate()?;
    let index = RecordIndex::new(read_records(records_path)?);

    let mut matches = index.radius_search(&center, radius_km)?;
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    log::info!(
        "{} of {} records within {radius_km} km",
        matches.len(),
        index.len()
    );
    writeln!(out, "{}", serde_json::to_string_pretty(&matches)?)?;
    Ok(())
}

fn cmd_assign(
    records_path: &Path,
    table: &TableArgs,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = table.load()?;
    let mut records = read_records(records_path)?;

    let changed = table.assign_all(&mut records)?;
    log::info!(
        "Assigned zones from '{}': {changed} of {} records changed",
        table.id(),
        records.len()
    );

    writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
    Ok(())
}

fn cmd_sector(
    point: &PointArgs,
    sectors_path: &Path,
    name_property: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let point = point.coordinate()?;
    let geojson = std::fs::read_to_string(sectors_path)?;
    let index = SectorIndex::from_geojson(&geojson, name_property)?;

    match index.lookup(&point) {
        Some(name) => writeln!(out, "{name}")?,
        None => writeln!(out, "(no sector)")?,
    }
    Ok(())
}

/// Reads a JSON array of located records.
fn read_records(path: &Path) -> Result<Vec<LocatedRecord>, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<LocatedRecord> = serde_json::from_str(&contents)?;
    log::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}
