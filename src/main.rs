use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use krishi::{
    calendar::{Language, NepaliMonth, Region},
    config::Config,
    store::AgroDataStore,
    units::{self, Unit},
};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "krishi", about = "Crop calendar, fertilizer and soil lookups for Nepali farms")]
struct Cli {
    /// Output language (en, ne); defaults to the configured one
    #[arg(short, long, global = true)]
    lang: Option<Language>,

    /// Region (high, mid, terai); defaults to the configured one
    #[arg(short, long, global = true)]
    region: Option<Region>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// All crops, one record per crop
    Crops {
        /// Sort by name instead of source order
        #[arg(long)]
        sorted: bool,
    },
    /// Crops sown in a Nepali month
    Month { month: NepaliMonth },
    /// Search crop names, varieties and remarks
    Search { query: String },
    /// Fertilizer per ropani, optionally totalled for a field
    Fertilizer {
        crop: String,
        #[arg(long, requires = "unit")]
        area: Option<f64>,
        #[arg(long)]
        unit: Option<Unit>,
    },
    /// Optimal soil pH for a crop
    Ph { crop: String },
    /// Agricultural lime for an acidic soil
    Lime { ph: f64, texture: String },
    /// Per-plant doses for a fruit tree
    Fruit { tree: String },
    /// Convert between area, volume or mass units
    Convert { value: f64, from: String, to: String },
    /// Sowing windows as calendar dates
    SowingDates {
        crop: Option<String>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,krishi=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config & arguments ───────────────────────────────────────
    let cli = Cli::parse();
    let config = Config::load()?;
    let lang = cli.lang.unwrap_or(config.language);
    let region = cli.region.unwrap_or(config.region);

    // ─── 3) load tables (conversion needs none) ──────────────────────
    let store = AgroDataStore::from_boxed(config.table_source()?);
    if !matches!(cli.command, Command::Convert { .. }) {
        store
            .initialize()
            .await
            .context("loading agronomic tables")?;
        info!(state = ?store.state(), "store ready");
    }

    // ─── 4) run the query ────────────────────────────────────────────
    match cli.command {
        Command::Crops { sorted } => {
            let crops = if sorted {
                store.all_crops(lang)?
            } else {
                store.crops_data(lang)?
            };
            print_json(&crops)
        }
        Command::Month { month } => print_json(&store.crops_by_month(month, region, lang)?),
        Command::Search { query } => print_json(&store.search_crops(&query, lang)?),
        Command::Fertilizer { crop, area, unit } => {
            let matched = store.fertilizer_match(&crop, region)?;
            let per_ropani = matched.quantities();
            let field = match (area, unit) {
                (Some(area), Some(unit)) => Some(per_ropani.for_area(area, unit)?),
                _ => None,
            };
            let products = store.fertilizer_products(field.as_ref().unwrap_or(&per_ropani), lang)?;
            print_json(&json!({
                "crop": crop,
                "region": region.label(lang),
                "perRopani": matched,
                "field": field,
                "products": products,
            }))
        }
        Command::Ph { crop } => print_json(&store.ph_info(&crop, lang)?),
        Command::Lime { ph, texture } => print_json(&store.lime_requirement(ph, &texture)?),
        Command::Fruit { tree } => print_json(&store.fruit_tree_rates(&tree)?),
        Command::SowingDates { crop, today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let needle = crop.map(|c| c.to_lowercase());
            let entries: Vec<_> = store
                .sowing_calendar(region, lang, today)?
                .into_iter()
                .filter(|e| {
                    needle
                        .as_deref()
                        .map_or(true, |n| e.name.to_lowercase().contains(n))
                })
                .collect();
            print_json(&entries)
        }
        Command::Convert { value, from, to } => {
            let result = units::convert_unit(value, &from, &to)?;
            print_json(&json!({
                "value": value,
                "from": from,
                "to": to,
                "result": result,
                "rounded": units::round_to(result, 4),
            }))
        }
    }
}
