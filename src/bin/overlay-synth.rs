use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "overlay-synth", version)]
struct Cli {
    /// Log debug details (placement plans, clipping counts).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a random material onto every target PNG.
    Overlay(OverlayArgs),
    /// Insert a suffix before the extension of every PNG in a directory.
    Rename(RenameArgs),
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Directory of material PNGs (alpha is honoured).
    #[arg(long)]
    materials: PathBuf,

    /// Directory of target PNGs with black background.
    #[arg(long)]
    targets: PathBuf,

    /// Output directory; created when missing.
    #[arg(long)]
    out: PathBuf,

    /// Placement preset.
    #[arg(long, value_enum, default_value_t = PlacementChoice::Random)]
    placement: PlacementChoice,

    /// Seed for material choice, scale and position. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run summary as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenameArgs {
    /// Directory whose PNGs are renamed in place.
    #[arg(long)]
    dir: PathBuf,

    /// Text inserted before the extension.
    #[arg(long, default_value = overlay_synth::rename::DEFAULT_SUFFIX)]
    suffix: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlacementChoice {
    Centered,
    Random,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Overlay(args) => cmd_overlay(args),
        Command::Rename(args) => cmd_rename(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let mode = match args.placement {
        PlacementChoice::Centered => overlay_synth::PlacementMode::Centered,
        PlacementChoice::Random => overlay_synth::PlacementMode::Random,
    };
    let config = overlay_synth::BatchConfig {
        material_dir: args.materials,
        target_dir: args.targets,
        output_dir: args.out,
        params: overlay_synth::CompositeParams::for_mode(mode),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let report = overlay_synth::run_batch(&config, &mut rng).context("run overlay batch")?;

    if let Some(path) = &args.report {
        overlay_synth::write_report(&report, path)?;
        eprintln!("wrote {}", path.display());
    }
    eprintln!(
        "done: {} processed, {} skipped, {} failed",
        report.processed,
        report.skipped_no_material + report.skipped_empty_mask,
        report.failed
    );
    Ok(())
}

fn cmd_rename(args: RenameArgs) -> anyhow::Result<()> {
    let report = overlay_synth::rename_pngs(&args.dir, &args.suffix)
        .with_context(|| format!("rename pngs in '{}'", args.dir.display()))?;
    eprintln!(
        "done: {} renamed, {} skipped, {} failed",
        report.renamed, report.skipped, report.failed
    );
    Ok(())
}
