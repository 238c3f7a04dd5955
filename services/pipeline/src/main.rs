//! Weather DataHub processing pipeline.
//!
//! Downloads the latest files for a set of DataHub orders, merges them into
//! one dataset on the fixed 2 km easting/northing grid, and publishes Zarr
//! and NetCDF archives (a timestamped copy plus an optional `latest` copy).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use datahub_client::DataHubClient;
use pipeline::{notify, print_runs, run_pipeline, RunOptions};
use zarr_out::{Format, LocalArtifactStore, ObjectArtifactStore, ObjectStoreConfig};

#[derive(Parser, Debug)]
#[command(name = "datahub-pipeline")]
#[command(about = "Downloads the latest Weather DataHub order files and publishes Zarr/NetCDF archives")]
struct Args {
    /// DataHub API client id
    #[arg(long, env = "API_KEY")]
    api_key: String,

    /// DataHub API client secret
    #[arg(long, env = "API_SECRET")]
    api_secret: String,

    /// Order to process (repeatable; default: every order on the account)
    #[arg(long = "order-id")]
    order_ids: Vec<String>,

    /// Directory raw GRIB files are cached in
    #[arg(long, env = "RAW_DIR", default_value = "./temp_datahub")]
    raw_dir: PathBuf,

    /// Directory local artifacts are written to
    #[arg(long, env = "SAVE_DIR", default_value = "./data")]
    save_dir: PathBuf,

    /// Where artifacts are published
    #[arg(long, value_enum, default_value_t = Destination::Local)]
    destination: Destination,

    /// Artifact format (repeatable)
    #[arg(long = "format", value_enum, default_values_t = [OutputFormat::Zarr, OutputFormat::Netcdf])]
    formats: Vec<OutputFormat>,

    /// Only write the timestamped artifacts, skip the latest.* copies
    #[arg(long)]
    no_save_latest: bool,

    /// URL to POST a refresh notification to after a successful run
    #[arg(long, env = "NOTIFY_URL")]
    notify_url: Option<String>,

    /// Print the completed runs for every model and exit
    #[arg(long)]
    print_runs: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Destination {
    Local,
    ObjectStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Zarr,
    Netcdf,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Zarr => Format::Zarr,
            OutputFormat::Netcdf => Format::NetCdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let client = DataHubClient::new(args.api_key.clone(), args.api_secret.clone())?;

    if args.print_runs {
        return print_runs(&client).await;
    }

    let mut formats: Vec<Format> = args.formats.iter().map(|&f| f.into()).collect();
    formats.dedup();

    let options = RunOptions {
        order_ids: if args.order_ids.is_empty() {
            None
        } else {
            Some(args.order_ids.clone())
        },
        cache_dir: args.raw_dir.clone(),
        formats,
        save_latest: !args.no_save_latest,
    };

    let written = match args.destination {
        Destination::Local => {
            let store = LocalArtifactStore::new(&args.save_dir);
            run_pipeline(&client, &store, &options).await?
        }
        Destination::ObjectStore => {
            let store = ObjectArtifactStore::new(ObjectStoreConfig::from_env());
            run_pipeline(&client, &store, &options).await?
        }
    };

    if !written.is_empty() {
        if let Some(url) = &args.notify_url {
            notify(url).await;
        }
    }

    Ok(())
}
