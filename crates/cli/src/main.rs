//! CLI tool for building, planning and enhancing slide decks.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slidecraft_ai::gemini::{DEFAULT_MODEL, DEFAULT_NOTES_MODEL};
use slidecraft_ai::{GeminiClient, GeminiConfig, PlanGenerator, PlanOptions};
use slidecraft_core::{classify_image, read_plan, PLAN_FILE_NAME};
use slidecraft_pipeline::{build_from_job_dir, build_with, generate_plan_file, list_images};
use slidecraft_pipeline::{EnhanceOptions, Enhancer, DEFAULT_OUTPUT_NAME};
use slidecraft_pptx::{dedup, DedupOptions, Deck, SlideRenderer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Turn documents and images into slide decks, and clean up existing decks.
#[derive(Parser, Debug)]
#[command(name = "slidecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model used for slide plans
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Model used for speaker notes
    #[arg(long, env = "GEMINI_NOTES_MODEL", default_value = DEFAULT_NOTES_MODEL, global = true)]
    notes_model: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plain text of a PDF, DOCX or TXT document
    Extract {
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the size class of each image
    Classify {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Generate a slide plan from a source document and images
    Plan {
        /// Source document (.pdf, .docx or .txt)
        #[arg(short, long)]
        source: PathBuf,

        /// Image files, or a directory of images
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Plan file to write
        #[arg(short, long, default_value = PLAN_FILE_NAME)]
        output: PathBuf,

        /// Images per model call
        #[arg(long, default_value = "5")]
        batch_size: usize,

        /// Seconds to wait between model calls
        #[arg(long, default_value = "2")]
        batch_delay: u64,
    },

    /// Render a slide plan and its images into a new deck
    Build(BuildArgs),

    /// Strip watermarks and repeated images, add branding and speaker notes
    Enhance {
        input: PathBuf,
        output: PathBuf,

        /// Logo image for the top-left corner
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Credit line for the bottom-right corner
        #[arg(long)]
        credits: Option<String>,

        /// Skip speaker note generation
        #[arg(long)]
        no_notes: bool,

        #[command(flatten)]
        dedup: DedupArgs,
    },

    /// Remove images repeated across a deck's masters, layouts and slides
    Dedup {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        dedup: DedupArgs,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Job directory holding slides.json and the images
    #[arg(long, conflicts_with_all = ["plan", "images"])]
    dir: Option<PathBuf>,

    /// Plan file
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Image files, or a directory of images
    images: Vec<PathBuf>,

    /// Deck to write (file name inside --dir when building a job directory)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    output: PathBuf,

    /// Seed for image panel placement
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct DedupArgs {
    /// Pictures that must look alike before all of them are removed
    #[arg(long, default_value = "3")]
    min_occurrences: usize,

    /// Maximum perceptual hash distance, in bits
    #[arg(long, default_value = "5")]
    tolerance: u32,
}

impl DedupArgs {
    fn options(&self) -> DedupOptions {
        DedupOptions::new()
            .with_min_occurrences(self.min_occurrences)
            .with_hash_tolerance(self.tolerance)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &cli.command {
        Command::Extract { input, output } => extract(input, output.as_deref()),
        Command::Classify { images } => {
            for image in images {
                let class = classify_image(Some(image.as_path()))
                    .map(|c| c.as_str())
                    .unwrap_or("unreadable");
                println!("{}\t{}", image.display(), class);
            }
            Ok(())
        }
        Command::Plan {
            source,
            images,
            output,
            batch_size,
            batch_delay,
        } => {
            let images = collect_images(images)?;
            let client = gemini(&cli, &cli.model)?;
            let options = PlanOptions::new()
                .with_batch_size(*batch_size)
                .with_batch_delay(Duration::from_secs(*batch_delay));
            let generator = PlanGenerator::new(client).with_options(options);

            let plan = generate_plan_file(&generator, source, &images, output)
                .with_context(|| format!("Failed to plan slides from {}", source.display()))?;
            eprintln!("Wrote {} slides to {}", plan.len(), output.display());
            Ok(())
        }
        Command::Build(args) => build(args),
        Command::Enhance {
            input,
            output,
            logo,
            credits,
            no_notes,
            dedup,
        } => {
            let options = EnhanceOptions::new().with_dedup(dedup.options());
            let mut enhancer = Enhancer::new(options);
            if !no_notes {
                enhancer = enhancer.with_model(Box::new(gemini(&cli, &cli.notes_model)?));
            }
            let written = enhancer
                .enhance(input, output, logo.as_deref(), credits.as_deref())
                .with_context(|| format!("Failed to enhance {}", input.display()))?;
            eprintln!("Written to: {}", written.display());
            Ok(())
        }
        Command::Dedup {
            input,
            output,
            dedup: args,
        } => {
            let mut deck =
                Deck::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
            let report = dedup(&mut deck, &args.options())?;
            deck.save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!(
                "Removed {} of {} pictures from {}",
                report.shapes_removed,
                report.pictures_hashed,
                output.display()
            );
            Ok(())
        }
    }
}

fn extract(input: &Path, output: Option<&Path>) -> Result<()> {
    let text = slidecraft_document::extract_text(input)
        .with_context(|| format!("Failed to extract text from {}", input.display()))?;
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write to {}", path.display()))?,
        None => println!("{}", text),
    }
    Ok(())
}

fn build(args: &BuildArgs) -> Result<()> {
    let written = match &args.dir {
        Some(dir) => {
            let name = args
                .output
                .to_str()
                .context("Output name is not valid UTF-8")?;
            build_from_job_dir(dir, name)
                .with_context(|| format!("Failed to build from {}", dir.display()))?
        }
        None => {
            let Some(plan_path) = &args.plan else {
                bail!("Either --dir or --plan is required");
            };
            let specs = read_plan(plan_path)
                .with_context(|| format!("Failed to read plan {}", plan_path.display()))?;
            let images = collect_images(&args.images)?;
            let mut renderer = match args.seed {
                Some(seed) => SlideRenderer::seeded(seed),
                None => SlideRenderer::new(),
            };
            build_with(&mut renderer, &specs, &images, &args.output)
                .with_context(|| format!("Failed to build {}", args.output.display()))?
        }
    };
    eprintln!("Written to: {}", written.display());
    Ok(())
}

/// Expand directories into their sorted image files.
fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            images.extend(
                list_images(path)
                    .with_context(|| format!("Failed to list images in {}", path.display()))?,
            );
        } else {
            images.push(path.clone());
        }
    }
    Ok(images)
}

fn gemini(cli: &Cli, model: &str) -> Result<GeminiClient> {
    let Some(key) = cli.api_key.as_deref().filter(|k| !k.is_empty()) else {
        bail!("GOOGLE_API_KEY is not set (use --api-key or the environment)");
    };
    let config = GeminiConfig::new(key).with_model(model);
    Ok(GeminiClient::new(config)?)
}
