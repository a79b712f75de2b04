use std::io::{self, Read};
use std::path::PathBuf;

use auracle_core::model::generate_options::{GenerateOptions, Ordering};
use auracle_core::model::generator::Generator;
use auracle_core::text::{orthography, sanitize};
use auracle_core::{FrequencyModel, Session, SessionConfig, build_model};
use clap::{Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "auracle")]
#[command(about = "Build, sample and score character-level word models; input is read from stdin")]
struct Cli {
    /// JSON session configuration (every field optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data folder holding words.txt and corpora/ (overrides the configuration)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Fixed random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a frequency model from raw text and print it as one JSON line
    BuildModel {
        #[arg(short, long, default_value = "2")]
        order: usize,
    },

    /// Sample words from a JSON frequency model
    Generate {
        #[arg(short, long, default_value = "500")]
        attempts: usize,

        /// Words scoring at or below this expectedness are dropped
        #[arg(short, long, default_value = "-1", allow_negative_numbers = true)]
        threshold: f64,

        /// Maximum number of words printed
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print the most typical words first instead of the most surprising
        #[arg(long)]
        typical: bool,
    },

    /// Normalize text to the accented-Latin alphabet
    Sanitize,

    /// Infer a vowel inventory from the text
    Orthography,

    /// Score text against the session's scoring model
    Score,

    /// Rank the session's reference models by fit
    Identify,

    /// Train the session model against the text, then print the accuracy
    /// visualization and generated words
    Improve,
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

fn open_session(cli: &Cli) -> Result<Session, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(Session::open(config)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::BuildModel { order } => {
            let model = build_model(&read_stdin()?, *order)?;
            println!("{}", model.to_json()?);
        }
        Commands::Generate { attempts, threshold, limit, typical } => {
            let model = FrequencyModel::from_json(&read_stdin()?)?;
            info!("Sampling from a model of order {} ({} observations)", model.order(), model.total_observations());
            println!("{}", serde_json::to_string(model.lengths())?);

            let mut options = GenerateOptions::default();
            options.set_attempts(*attempts)?;
            options.set_threshold(*threshold)?;
            options.limit = *limit;
            options.ordering = if *typical { Ordering::MostTypical } else { Ordering::MostSurprising };

            let mut rng = match cli.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for candidate in Generator::new(options).generate(&model, &mut rng)? {
                println!("{}", serde_json::to_string(&(candidate.word, candidate.expectedness))?);
            }
        }
        Commands::Sanitize => println!("{}", sanitize(&read_stdin()?)),
        Commands::Orthography => println!("{}", orthography(&read_stdin()?)),
        Commands::Score => {
            let session = open_session(&cli)?;
            println!("{}", session.score(&read_stdin()?)?);
        }
        Commands::Identify => {
            let session = open_session(&cli)?;
            println!("{}", session.identify(&read_stdin()?)?);
        }
        Commands::Improve => {
            let mut session = open_session(&cli)?;
            println!("{}", session.improve(&read_stdin()?)?);
            println!("{}", session.generate()?);
        }
    }

    Ok(())
}
