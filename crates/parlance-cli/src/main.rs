use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parlance_core::config::Config;
use parlance_core::types::AudioResource;
use parlance_media::MediaGateway;

#[derive(Parser)]
#[command(
    name = "parlance",
    about = "Transcribe, revise, and speak back audio through hosted speech and text models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe an audio file to text
    Transcribe {
        /// Path to the audio file
        path: PathBuf,

        /// Also print word-level timestamps
        #[arg(long)]
        timestamps: bool,
    },

    /// Revise text to sound more natural
    Revise {
        /// Text to revise
        text: String,

        /// Image giving context for the text
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Synthesize speech and save it under the storage root
    Speak {
        /// Text to speak
        text: String,
    },

    /// Score the perceived quality of an audio file
    Assess {
        /// Path to the audio file
        path: PathBuf,
    },

    /// Copy an audio file into the storage root under its own name
    Store {
        /// Path to the audio file
        path: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Validate the configuration
    Check,
}

fn init_logging(verbose: bool, config: &Config) {
    let default_level = if verbose {
        "debug"
    } else {
        config.log_level().unwrap_or("info")
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if config.log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Pick up API_KEY and friends from a local .env before reading config
    dotenvy::dotenv().ok();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);
    let config = Config::load(&config_path)?;

    init_logging(cli.verbose, &config);
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    let gateway = MediaGateway::new(config);
    run(cli.command, &gateway).await
}

fn config_command(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{json}");
        }
        ConfigAction::Check => {
            let (warnings, errors) = config.validate();
            for w in &warnings {
                println!("warning: {w}");
            }
            for e in &errors {
                println!("error: {e}");
            }
            if !errors.is_empty() {
                anyhow::bail!("{} configuration error(s)", errors.len());
            }
            if warnings.is_empty() {
                println!("Configuration OK");
            }
        }
    }
    Ok(())
}

async fn run(command: Commands, gateway: &MediaGateway) -> anyhow::Result<()> {
    match command {
        Commands::Transcribe { path, timestamps } => {
            if timestamps {
                let transcript = gateway.transcribe_with_timestamps(&path).await?;
                println!("{}", transcript.text);
                for word in &transcript.words {
                    println!("{:.2}\t{:.2}\t{}", word.start, word.end, word.word);
                }
            } else {
                println!("{}", gateway.transcribe(&path).await?);
            }
        }
        Commands::Revise { text, image } => {
            let revised = gateway.revise_text(&text, image.as_deref()).await?;
            println!("{revised}");
        }
        Commands::Speak { text } => {
            gateway.synthesize_speech(&text).await?;
        }
        Commands::Assess { path } => {
            let audio = AudioResource::from_path(&path).await?;
            println!("{}", gateway.assess_quality(&audio).await?);
        }
        Commands::Store { path } => {
            let audio = AudioResource::from_path(&path).await?;
            println!("{}", gateway.store_audio(&audio).await?);
        }
        Commands::Config { action } => config_command(action, gateway.config())?,
    }
    Ok(())
}
