mod commands;

use anyhow::Result;
use careerprep_core::interview::InterviewOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "careerprep")]
#[command(about = "Job-preparation tutor - coding-test grading, cover-letter and interview feedback", long_about = None)]
struct Cli {
    /// Config file (defaults to config/careerprep.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Static analysis only: syntax, loop structure, complexity, warnings
    Analyze {
        /// Python source file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Analyze, run test cases, and optionally ask the model for a hint
    Tutor {
        /// JSON submission (source, problem, tests, flags)
        #[arg(short, long, conflicts_with_all = ["source", "tests"])]
        request: Option<PathBuf>,

        /// Python source file
        #[arg(short, long, required_unless_present = "request")]
        source: Option<PathBuf>,

        /// JSON array of test cases: [{"id", "stdin", "expected"}]
        #[arg(short, long)]
        tests: Option<PathBuf>,

        /// Problem statement passed to the model
        #[arg(short, long, default_value = "")]
        problem: String,

        /// Request a language-model hint
        #[arg(long, default_value = "false")]
        model_hint: bool,

        /// Ask the model for a reference solution as well
        #[arg(long, default_value = "false")]
        reference: bool,

        /// Per-test timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Critique a cover letter
    CoverLetter {
        /// Text file with the question and answer
        #[arg(short, long)]
        file: PathBuf,

        /// Role being applied for
        #[arg(short, long)]
        job_title: Option<String>,

        /// Add language-model feedback
        #[arg(long, default_value = "false")]
        model: bool,
    },

    /// Review an interview answer script and/or a WAV recording of it
    Interview {
        /// Text file with the script
        #[arg(short, long, required_unless_present = "audio")]
        file: Option<PathBuf>,

        /// WAV recording of the answer
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Add language-model feedback on the script
        #[arg(long, default_value = "false")]
        model: bool,

        /// Transcribe the recording through the model endpoint
        #[arg(long, default_value = "false", requires = "audio")]
        transcribe: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref()).map_err(|e| {
        tracing::error!("Failed to load configuration: {:#}", e);
        e
    })?;

    match cli.command {
        Commands::Analyze { source } => {
            commands::analyze_file(&source)?;
        }
        Commands::Tutor {
            request,
            source,
            tests,
            problem,
            model_hint,
            reference,
            timeout,
        } => {
            let request = match request {
                Some(path) => commands::load_request(&path)?,
                None => commands::build_request(
                    source.as_deref(),
                    tests.as_deref(),
                    problem,
                    model_hint,
                    reference,
                )?,
            };
            commands::tutor_submission(&config, request, timeout).await?;
        }
        Commands::CoverLetter { file, job_title, model } => {
            commands::cover_letter(&config, &file, job_title.as_deref(), model).await?;
        }
        Commands::Interview {
            file,
            audio,
            model,
            transcribe,
        } => {
            let options = InterviewOptions {
                enable_model: model,
                transcribe,
            };
            commands::interview(&config, file.as_deref(), audio.as_deref(), options).await?;
        }
    }

    Ok(())
}
