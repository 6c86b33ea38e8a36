use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use foundation::AttributeKey;
use serde::Serialize;
use tools::{ConfigOverrides, Dataset, Selection, ToolError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Proportional-symbol summaries for city population GeoJSON"
)]
struct Args {
    /// JSON config file (default: $PROPSYM_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scaling preset: linear, cubic or flannery (default: $PROPSYM_POLICY)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Override the policy's scale factor
    #[arg(long, global = true)]
    scale_factor: Option<f64>,

    /// Override the linear policy's exponent
    #[arg(long, global = true)]
    exponent: Option<f64>,

    /// Fail on non-numeric population values instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SelectionArgs {
    /// Attribute key, e.g. Pop_2015
    #[arg(long, conflicts_with = "index")]
    attribute: Option<String>,

    /// Slider position into the discovered attribute keys
    #[arg(long)]
    index: Option<usize>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection {
            attribute: args.attribute,
            index: args.index,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DirectionArg {
    Forward,
    Reverse,
}

impl From<DirectionArg> for layers::Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Forward => layers::Direction::Forward,
            DirectionArg::Reverse => layers::Direction::Reverse,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the population attribute keys found in a dataset
    Attributes { input: PathBuf },

    /// Min, max and midpoint for one attribute or the whole dataset
    Summarize {
        input: PathBuf,

        #[arg(long)]
        attribute: Option<String>,
    },

    /// Radius for a single value under the configured policy
    Radius {
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Dataset-wide minimum (required for flannery)
        #[arg(long)]
        dataset_min: Option<f64>,
    },

    /// Sized symbols with popups for every city
    Symbols {
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Max/mean/min legend circles
    Legend {
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Move the year slider one step
    Step {
        input: PathBuf,

        #[arg(long)]
        index: usize,

        #[arg(long, value_enum)]
        direction: DirectionArg,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), ToolError> {
    let args = Args::parse();

    let config_path = args
        .config
        .or_else(|| env::var("PROPSYM_CONFIG").ok().map(PathBuf::from));
    let overrides = ConfigOverrides {
        policy: args.policy.or_else(|| env::var("PROPSYM_POLICY").ok()),
        scale_factor: args.scale_factor,
        exponent: args.exponent,
        strict: args.strict,
    };
    let config = tools::resolve_config(config_path.as_deref(), &overrides)?;

    match args.command {
        Command::Attributes { input } => {
            let dataset = Dataset::load(&input)?;
            print_json(&tools::attributes(&dataset, &config)?)
        }
        Command::Summarize { input, attribute } => {
            let dataset = Dataset::load(&input)?;
            let attribute = attribute.map(AttributeKey::from);
            print_json(&tools::summarize(&dataset, &config, attribute.as_ref())?)
        }
        Command::Radius { value, dataset_min } => {
            print_json(&tools::radius(value, &config, dataset_min)?)
        }
        Command::Symbols { input, selection } => {
            let dataset = Dataset::load(&input)?;
            print_json(&tools::symbols(&dataset, &config, &selection.into())?)
        }
        Command::Legend { input, selection } => {
            let dataset = Dataset::load(&input)?;
            print_json(&tools::legend(&dataset, &config, &selection.into())?)
        }
        Command::Step {
            input,
            index,
            direction,
        } => {
            let dataset = Dataset::load(&input)?;
            print_json(&tools::step(&dataset, &config, index, direction.into())?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ToolError> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| ToolError::Json(e.to_string()))?;
    println!("{payload}");
    Ok(())
}
