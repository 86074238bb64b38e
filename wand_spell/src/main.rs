//! wand — recognize recorded gesture traces and manage model files.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wand_spell::config::{DEFAULT_CODEBOOK_PATH, DEFAULT_ENSEMBLE_PATH};
use wand_spell::{read_trace, ModelSet, Recognizer, RecognizerConfig, Result};

#[derive(Parser)]
#[command(name = "wand")]
#[command(about = "Wand gesture → spell shape recognizer", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TextModelArgs {
    /// Codebook text file
    #[arg(long, env = "WAND_CODEBOOK", default_value = DEFAULT_CODEBOOK_PATH)]
    codebook: PathBuf,

    /// Ensemble text file
    #[arg(long, env = "WAND_MODEL", default_value = DEFAULT_ENSEMBLE_PATH)]
    model: PathBuf,
}

#[derive(Args)]
struct ModelArgs {
    #[command(flatten)]
    text: TextModelArgs,

    /// Binary snapshot; replaces --codebook / --model when given
    #[arg(long, env = "WAND_SNAPSHOT")]
    snapshot: Option<PathBuf>,
}

impl ModelArgs {
    fn config(&self) -> RecognizerConfig {
        match &self.snapshot {
            Some(path) => RecognizerConfig::snapshot(path),
            None       => RecognizerConfig::text(&self.text.codebook, &self.text.model),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize one or more trace files (`x y z` per line)
    Recognize {
        #[command(flatten)]
        models: ModelArgs,

        /// Also print symbols and per-class likelihoods
        #[arg(short, long)]
        detail: bool,

        /// Trace files
        #[arg(required = true)]
        traces: Vec<PathBuf>,
    },

    /// Convert the text model files into one binary snapshot
    Convert {
        #[command(flatten)]
        models: TextModelArgs,

        /// Output snapshot path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Write a snapshot back out in the text formats
    Dump {
        /// Snapshot to read
        snapshot: PathBuf,

        /// Codebook output file (stdout if neither output is given)
        #[arg(long)]
        codebook_out: Option<PathBuf>,

        /// Ensemble output file
        #[arg(long)]
        model_out: Option<PathBuf>,
    },

    /// Load the models and print a summary
    Check {
        #[command(flatten)]
        models: ModelArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Recognize { models, detail, traces } => {
            let recognizer = Recognizer::from_config(&models.config())?;
            for path in traces {
                let samples = read_trace(&path)?;
                let r = recognizer.recognize_detailed(&samples)?;
                println!("{}: {}", path.display(), r.shape);
                if detail {
                    println!("  label       {}", r.result.predicted_label);
                    println!("  symbols     {:?}", r.symbols);
                    println!("  best score  {:.4}", r.result.best_score);
                    for (label, p) in recognizer_labels(&recognizer).iter().zip(&r.result.likelihoods) {
                        println!("  class {:<4} {:.4}", label, p);
                    }
                }
            }
        }

        Commands::Convert { models, out } => {
            let recognizer = Recognizer::new();
            recognizer.initialize(&models.codebook, &models.model)?;
            recognizer.write_snapshot(&out)?;
            println!("  Wrote {}", out.display());
        }

        Commands::Dump { snapshot, codebook_out, model_out } => {
            let snap = wand_models::load_snapshot(&snapshot)?;
            if codebook_out.is_none() && model_out.is_none() {
                print!("{}", wand_models::CodebookText(&snap.codebook));
                println!();
                print!("{}", wand_models::EnsembleText(&snap.ensemble));
            }
            if let Some(path) = codebook_out {
                wand_models::save_codebook(&path, &snap.codebook)?;
                println!("  Wrote {}", path.display());
            }
            if let Some(path) = model_out {
                wand_models::save_ensemble(&path, &snap.ensemble)?;
                println!("  Wrote {}", path.display());
            }
        }

        Commands::Check { models } => {
            let set = match &models.config().source {
                wand_spell::ModelSource::Text { codebook, ensemble } => {
                    ModelSet::from_text_files(codebook, ensemble)?
                }
                wand_spell::ModelSource::Snapshot(path) => ModelSet::from_snapshot_file(path)?,
            };
            let ensemble = set.ensemble();
            println!("  Symbols         {}", set.quantizer().alphabet_size());
            println!("  Classes         {}", ensemble.num_classes());
            println!("  Null rejection  {}", ensemble.use_null_rejection());
            for ((label, model), threshold) in ensemble.classes().zip(ensemble.thresholds()) {
                println!(
                    "  class {:<4} {:<9} states {:<3} threshold {}",
                    label,
                    wand_spell::Shape::from_label(label).name(),
                    model.num_states(),
                    threshold
                );
            }
        }
    }
    Ok(())
}

fn recognizer_labels(recognizer: &Recognizer) -> Vec<u32> {
    recognizer
        .models()
        .map(|m| m.ensemble().class_labels().to_vec())
        .unwrap_or_default()
}
