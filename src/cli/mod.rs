//! Command-line front end.

mod tracing_config;

pub use tracing_config::{TracingConfig, TracingFormat};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use crate::config::MaskConfig;
use crate::pipeline::{prepare_person, GuidanceSource, PersonInputs};
use crate::tryon_masks::agnostic::AgnosticPersonExt;
use crate::tryon_masks::guidance::{GuidanceMapExt, GuidanceParams};
use crate::tryon_masks::label_io::{
    load_label_map, load_person_image, save_image, save_label_map, LabelEncoding,
};
use crate::tryon_masks::surface::SurfaceEstimateExt;

/// Agnostic-person and guidance mask generation for virtual try-on
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "tryon-masks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How parsing map files encode labels
    #[arg(long, global = true, value_enum)]
    pub label_encoding: Option<CliLabelEncoding>,

    /// How surface map files encode labels
    #[arg(long, global = true, value_enum)]
    pub surface_encoding: Option<CliLabelEncoding>,

    /// How label map outputs are written
    #[arg(long, global = true, value_enum, default_value_t = CliLabelEncoding::Indexed)]
    pub output_encoding: CliLabelEncoding,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Plain log lines without colours
    #[arg(long, global = true)]
    pub plain: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Erase garment and arm regions from a person image and its parsing map
    Agnostic(AgnosticArgs),
    /// Synthesize a guidance parsing map
    Guidance(GuidanceArgs),
    /// Produce the agnostic outputs and the guidance map in one pass
    Prepare(PrepareArgs),
}

#[derive(Debug, Args)]
pub struct AgnosticArgs {
    /// Person image
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Human-parsing label map of the person
    #[arg(long, value_name = "FILE")]
    pub parse: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Side length of the dilation kernel (positive, odd)
    #[arg(short, long)]
    pub kernel_size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct GuidanceArgs {
    /// Human-parsing label map of the person
    #[arg(long, value_name = "FILE")]
    pub parse: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Target torso and full arms (long-sleeve guidance)
    #[arg(long)]
    pub sleeved: bool,
}

#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Person image
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Human-parsing label map of the person
    #[arg(long, value_name = "FILE")]
    pub parse: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Side length of the dilation kernel (positive, odd)
    #[arg(short, long)]
    pub kernel_size: Option<u32>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Target torso and full arms (long-sleeve guidance)
    #[arg(long)]
    pub sleeved: bool,

    /// Print pixel statistics as JSON on stdout
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct SourceArgs {
    /// DensePose segmentation used as the guidance target
    #[arg(long, value_name = "FILE")]
    pub surface: Option<PathBuf>,

    /// Estimate the body surface from the parsing map
    #[arg(long)]
    pub estimate_surface: bool,

    /// Smooth the worn garment region instead of using a body surface
    #[arg(long)]
    pub from_garment: bool,
}

impl SourceArgs {
    fn guidance_source(&self) -> GuidanceSource {
        match (&self.surface, self.estimate_surface, self.from_garment) {
            (Some(path), _, _) => GuidanceSource::Surface(path.clone()),
            (None, _, true) => GuidanceSource::Garment,
            (None, true, false) => GuidanceSource::EstimatedSurface,
            (None, false, false) => GuidanceSource::Skip,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLabelEncoding {
    Auto,
    Indexed,
    Palette,
}

impl From<CliLabelEncoding> for LabelEncoding {
    fn from(encoding: CliLabelEncoding) -> Self {
        match encoding {
            CliLabelEncoding::Auto => Self::Auto,
            CliLabelEncoding::Indexed => Self::Indexed,
            CliLabelEncoding::Palette => Self::Palette,
        }
    }
}

impl Cli {
    /// Builds the effective configuration: file (or defaults) plus flag overrides.
    fn resolve_config(&self) -> Result<MaskConfig> {
        let mut config = match &self.config {
            Some(path) => MaskConfig::from_json_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => MaskConfig::default(),
        };
        if let Some(encoding) = self.label_encoding {
            config.label_encoding = encoding.into();
        }
        if let Some(encoding) = self.surface_encoding {
            config.surface_encoding = encoding.into();
        }

        let (kernel_size, sleeved) = match &self.command {
            Command::Agnostic(args) => (args.kernel_size, false),
            Command::Guidance(args) => (None, args.sleeved),
            Command::Prepare(args) => (args.kernel_size, args.sleeved),
        };
        if let Some(size) = kernel_size {
            config.agnostic.dilation_kernel_size = size;
        }
        if sleeved {
            config.guidance.surface_labels = GuidanceParams::sleeved().surface_labels;
        }

        config.validate().context("invalid mask parameters")?;
        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "person".to_owned(), |stem| stem.to_string_lossy().into_owned())
}

fn run_agnostic(
    args: &AgnosticArgs,
    config: &MaskConfig,
    output_encoding: LabelEncoding,
) -> Result<()> {
    let image = load_person_image(&args.image)?;
    let parse = load_label_map(&args.parse, config.label_encoding)?;
    let person = image
        .agnostic_person(&parse, &config.agnostic)
        .with_context(|| format!("generating agnostic person for {}", args.image.display()))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let stem = stem_of(&args.image);
    save_image(&person.image, &args.output.join(format!("{stem}_agnostic.png")))?;
    save_label_map(
        &person.label_map,
        &args.output.join(format!("{stem}_agnostic_parse.png")),
        output_encoding,
    )?;
    info!(erased = person.erased_pixels(), "agnostic person written");
    Ok(())
}

fn run_guidance(
    args: &GuidanceArgs,
    config: &MaskConfig,
    output_encoding: LabelEncoding,
) -> Result<()> {
    let parse = load_label_map(&args.parse, config.label_encoding)?;
    let guidance = match args.source.guidance_source() {
        GuidanceSource::Surface(path) => {
            let surface_map = load_label_map(&path, config.surface_encoding)?;
            parse.guidance_from_surface(&surface_map, &config.guidance)
        }
        GuidanceSource::EstimatedSurface => {
            let surface_map = parse.estimate_surface(&config.surface_estimate)?;
            parse.guidance_from_surface(&surface_map, &config.guidance)
        }
        GuidanceSource::Garment => parse.guidance_from_garment(&config.guidance),
        GuidanceSource::Skip => {
            anyhow::bail!("one of --surface, --estimate-surface or --from-garment is required")
        }
    }
    .with_context(|| format!("generating guidance for {}", args.parse.display()))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let path = args
        .output
        .join(format!("{}_guidance.png", stem_of(&args.parse)));
    save_label_map(&guidance.label_map, &path, output_encoding)?;
    info!(target_pixels = guidance.target_pixels(), "guidance map written");
    Ok(())
}

fn run_prepare(
    args: &PrepareArgs,
    config: &MaskConfig,
    output_encoding: LabelEncoding,
) -> Result<()> {
    let inputs = PersonInputs::new(&args.image, &args.parse)
        .with_guidance(args.source.guidance_source());
    let prepared = prepare_person(&inputs, config)
        .with_context(|| format!("preparing {}", args.image.display()))?;
    let paths = prepared.write_to(&args.output, &inputs.stem(), output_encoding)?;
    debug!(?paths, "outputs written");

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&prepared.stats)?);
    }
    Ok(())
}

/// Entry point of the `tryon-masks` binary.
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::new().with_verbosity(cli.verbose);
    if cli.plain {
        tracing_config = tracing_config.with_format(TracingFormat::Compact);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        tracing_config = tracing_config.with_env_filter(filter);
    }
    tracing_config.init()?;

    let config = cli.resolve_config()?;
    let output_encoding = cli.output_encoding.into();
    match &cli.command {
        Command::Agnostic(args) => run_agnostic(args, &config, output_encoding),
        Command::Guidance(args) => run_guidance(args, &config, output_encoding),
        Command::Prepare(args) => run_prepare(args, &config, output_encoding),
    }
}
