mod request;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kronos::aspects::AspectPriority;
use kronos::events::DetectionInput;
use serde::Serialize;
use std::path::PathBuf;

use request::{read_json, AspectsRequest, LifecycleRequest, LunarReturnRequest};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Override file (otherwise configs/kronos.toml, then built-in tables).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect planetary returns and major transits and build the life timeline.
    Lifecycle {
        /// JSON file with birth, now, natal, transit, optional samples and progressed.
        request: PathBuf,

        /// Print per-body detection results instead of the assembled timeline.
        #[arg(long)]
        events: bool,
    },
    /// Find the Moon's return to its natal degree within one calendar month.
    LunarReturn {
        /// JSON file with natal, year, month and either Moon samples or transit + at.
        request: PathBuf,
    },
    /// Triage an aspect list into orb tiers and return one budgeted page.
    Aspects {
        /// JSON file with either `aspects` or `natal` + `transit` snapshots.
        request: PathBuf,

        /// tight, moderate, loose or all.
        #[arg(long, default_value = "tight")]
        priority: String,
    },
}

/// Per-body outcome as printed by `lifecycle --events`.
#[derive(Serialize)]
#[serde(untagged)]
enum BodyOutcome {
    Events(kronos::BodyEvents),
    Skipped { body: String, error: String },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = kronos_config::load_config(args.config.as_deref())?;

    let output = match args.command {
        Command::Lifecycle { request, events } => {
            let request: LifecycleRequest = read_json(&request)?;
            let now = request.now();
            if now < request.birth {
                anyhow::bail!("`now` ({now}) is before `birth` ({})", request.birth);
            }
            let ephemeris = request.ephemeris(&config);
            let input = DetectionInput {
                birth: request.birth,
                now,
                natal: &request.natal,
                transit: &request.transit,
                progressed: request.progressed.as_ref(),
            };

            if events {
                let outcomes: Vec<BodyOutcome> =
                    kronos::detect_lifecycle_events(&config, ephemeris.as_ref(), &input)
                        .into_iter()
                        .map(|r| match r {
                            Ok(body) => BodyOutcome::Events(body),
                            Err(e) => BodyOutcome::Skipped {
                                body: e.body().to_string(),
                                error: e.to_string(),
                            },
                        })
                        .collect();
                to_json(&outcomes, args.pretty)?
            } else {
                let timeline = kronos::build_timeline(&config, ephemeris.as_ref(), &input);
                to_json(&timeline, args.pretty)?
            }
        }
        Command::LunarReturn { request } => {
            let request: LunarReturnRequest = read_json(&request)?;
            let moon = request.moon_source(&config)?;
            let found = kronos::lunar_return(
                moon.as_ref(),
                request.natal_moon()?,
                request.year,
                request.month,
                &config.solver,
            )?;
            let Some(found) = found else {
                anyhow::bail!("No lunar return found in {}-{:02}", request.year, request.month);
            };
            to_json(&found, args.pretty)?
        }
        Command::Aspects { request, priority } => {
            let priority: AspectPriority = priority
                .parse()
                .with_context(|| format!("Invalid --priority {priority:?}"))?;
            let request: AspectsRequest = read_json(&request)?;
            let aspects = request.into_aspects();
            log::info!("Paginating {} aspects from tier {}", aspects.len(), priority);
            let page = kronos::paginate_aspects(&config, &aspects, priority);
            to_json(&page, args.pretty)?
        }
    };

    println!("{output}");
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.context("Failed to serialize output")
}
