use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sdfgen::{
    BackendKind, ChannelMode, ColorSpace, CpuBackendOpts, GeneratorSettings, create_backend,
};

#[derive(Parser, Debug)]
#[command(name = "sdfgen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a distance field PNG from an image.
    Generate(GenerateArgs),
    /// Print the default settings document as JSON.
    Settings,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input image. Repeat to generate a batch; defaults to the settings' `targets`.
    #[arg(long = "in")]
    in_paths: Vec<PathBuf>,

    /// Output PNG path for a single input. Defaults to `<stem>.sdf.png` next to each input.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Settings JSON; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channels to solve, e.g. `a`, `rgb`, `rgba`.
    #[arg(long)]
    mode: Option<ChannelMode>,

    /// Gradient width on each side of an edge, in source pixels.
    #[arg(long)]
    gradient_px: Option<f32>,

    /// Inside/outside threshold in [0, 1].
    #[arg(long)]
    threshold: Option<f32>,

    /// Output width (defaults to the source width).
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the source height).
    #[arg(long)]
    height: Option<u32>,

    /// Treat the source as linear instead of sRGB.
    #[arg(long, default_value_t = false)]
    linear: bool,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Settings => {
            println!("{}", GeneratorSettings::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut settings = match &args.config {
        Some(path) => GeneratorSettings::from_path(path)?,
        None => GeneratorSettings::default(),
    };
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if let Some(px) = args.gradient_px {
        settings.gradient_size_px = px;
    }
    if let Some(t) = args.threshold {
        settings.threshold = t;
    }
    if args.width.is_some() {
        settings.width = args.width;
    }
    if args.height.is_some() {
        settings.height = args.height;
    }
    if args.linear {
        settings.source_color_space = ColorSpace::Linear;
    }
    settings.validate()?;

    let inputs = if args.in_paths.is_empty() {
        std::mem::take(&mut settings.targets)
    } else {
        args.in_paths
    };
    if inputs.is_empty() {
        anyhow::bail!("no input images: pass --in or list `targets` in the settings");
    }
    if args.out.is_some() && inputs.len() > 1 {
        anyhow::bail!("--out needs exactly one input, got {}", inputs.len());
    }

    let kind = match args.backend {
        BackendChoice::Cpu => BackendKind::Cpu,
    };
    let mut backend = create_backend(kind, CpuBackendOpts::default());

    for in_path in &inputs {
        let source = sdfgen::load_image(in_path, settings.source_color_space)
            .with_context(|| format!("load source '{}'", in_path.display()))?;
        let program = settings.program_for(&source);
        let result = sdfgen::generate(
            backend.as_mut(),
            &source,
            &program,
            settings.mode,
            settings.generate_opts(),
        )
        .with_context(|| format!("generate '{}'", in_path.display()))?;

        let out = args
            .out
            .clone()
            .unwrap_or_else(|| sdfgen::sdf_output_path(in_path));
        sdfgen::save_png(&result, &out)?;

        tracing::info!(
            mode = %settings.mode,
            w = result.width,
            h = result.height,
            "wrote {}",
            out.display()
        );
    }
    Ok(())
}
