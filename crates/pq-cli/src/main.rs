use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pq_core::{
    CompileOptions, DatasetSearch, FilterParams, UnknownPolicy, compile, periods, regions,
};
use pq_store::{Config, GraphDbClient};

/// Names shown before the list is cut short.
const SHOWN_NAMES: usize = 10;

const RESULTS_FILE: &str = "dataset_names.json";

#[derive(Parser)]
#[command(name = "pq", about = "Search paleoclimate datasets in a LinkedEarth graph store")]
struct Cli {
    /// GraphDB base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// GraphDB repository
    #[arg(long, global = true)]
    repository: Option<String>,

    /// Config file (default: $PQ_CONFIG or ~/.paleo-query/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the query for a set of filters without running it
    Compile {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Find datasets matching every filter
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Save matching names as JSON
        #[arg(long)]
        save_json: bool,

        /// Directory for saved results
        #[arg(long, default_value = "data_query_results")]
        output_dir: PathBuf,
    },

    /// List known time periods
    Periods,

    /// List known regions
    Regions,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Archive type (e.g. Coral, GlacierIce, MarineSediment)
    #[arg(long)]
    archive: Option<String>,

    /// Standard variable names (e.g. d18O Mg/Ca)
    #[arg(long, num_args = 1..)]
    variables: Vec<String>,

    /// Interpretation variable names (e.g. temperature)
    #[arg(long, num_args = 1..)]
    interpretations: Vec<String>,

    /// Resolution terms, '|'-separated (e.g. annual, decadal)
    #[arg(long)]
    resolution: Option<String>,

    /// Named time period (e.g. Holocene, LastGlacialMaximum)
    #[arg(long)]
    time_period: Option<String>,

    /// partial, containing or contained [default: partial]
    #[arg(long)]
    time_overlap: Option<String>,

    /// Named region (e.g. "Pacific Ocean", Greenland)
    #[arg(long)]
    location: Option<String>,

    /// JSON parameter record, or model output containing one. Flags override its fields.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Fail on unknown periods, regions and overlap modes
    #[arg(long)]
    strict: bool,
}

impl FilterArgs {
    fn resolve(&self) -> Result<FilterParams> {
        let flags = FilterParams {
            archive_type: self.archive.clone(),
            variables: self.variables.clone(),
            interpretations: self.interpretations.clone(),
            resolution: self.resolution.clone(),
            time_period: self.time_period.clone(),
            time_overlap: self.time_overlap.clone(),
            location: self.location.clone(),
        };
        let Some(path) = &self.params else {
            return Ok(flags.normalized());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let from_file = FilterParams::from_llm_response(&text)
            .with_context(|| format!("no parameter record in {}", path.display()))?;
        Ok(from_file.overridden_by(flags))
    }

    fn options(&self, config: &Config) -> CompileOptions {
        let mut options = config.compile_options();
        if self.strict {
            options.unknown = UnknownPolicy::Reject;
        }
        options
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    Ok(config.with_overrides(cli.endpoint.clone(), cli.repository.clone()))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Compile { filters } => cmd_compile(&cli, filters),
        Commands::Search {
            filters,
            save_json,
            output_dir,
        } => cmd_search(&cli, filters, *save_json, output_dir),
        Commands::Periods => cmd_periods(),
        Commands::Regions => cmd_regions(),
    }
}

fn cmd_compile(cli: &Cli, filters: &FilterArgs) -> Result<()> {
    let config = load_config(cli)?;
    let params = filters.resolve()?;
    let compiled =
        compile(&params, &filters.options(&config)).context("failed to compile filters")?;
    print!("{}", compiled.render());
    Ok(())
}

fn cmd_search(cli: &Cli, filters: &FilterArgs, save_json: bool, output_dir: &Path) -> Result<()> {
    let config = load_config(cli)?;
    let params = filters.resolve()?;
    let client =
        GraphDbClient::from_config(&config.endpoint).context("failed to build HTTP client")?;
    tracing::info!("querying {}", client.query_url());

    let names = DatasetSearch::new(client)
        .with_options(filters.options(&config))
        .run(&params)
        .context("failed to compile filters")?;

    for line in summary(&names) {
        println!("{line}");
    }

    if save_json && !names.is_empty() {
        let path = save_names(&names, output_dir)?;
        println!("\nDataset names saved to {}", path.display());
    }
    Ok(())
}

fn cmd_periods() -> Result<()> {
    for p in periods::iter() {
        println!("{:<28} {:>12} - {:<12} BP", p.name, p.range.min, p.range.max);
    }
    Ok(())
}

fn cmd_regions() -> Result<()> {
    for r in regions::iter() {
        let b = r.bbox;
        let note = if b.crosses_antimeridian() { "  (crosses 180°)" } else { "" };
        println!(
            "{:<28} lat {:>6} .. {:<6} lon {:>7} .. {:<7}{note}",
            r.name, b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );
    }
    Ok(())
}

/// Result count, then at most `SHOWN_NAMES` names.
fn summary(names: &[String]) -> Vec<String> {
    let mut lines = vec![format!("Found {} datasets matching all criteria.", names.len())];
    if names.is_empty() {
        return lines;
    }
    lines.push(String::new());
    lines.push("Dataset names:".to_string());
    lines.extend(names.iter().take(SHOWN_NAMES).map(|n| format!("  - {n}")));
    if names.len() > SHOWN_NAMES {
        lines.push(format!("  ... and {} more.", names.len() - SHOWN_NAMES));
    }
    lines
}

fn save_names(names: &[String], output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(names).context("failed to serialize names")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
