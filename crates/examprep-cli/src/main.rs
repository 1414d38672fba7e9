//! examprep CLI: validate, list, grade, shuffle and import question sets from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examprep", version, about = "Certification exam practice engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check question sets for data-quality issues
    Validate {
        /// Path to a question-set file or directory
        #[arg(long)]
        questions: PathBuf,
    },

    /// List the question sets in a directory
    Sets {
        /// Question-set directory (default: from config)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade an answer sheet as a finished exam
    Grade {
        /// Question-set file or directory (default: from config)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// JSON answer sheet mapping question id to a label or list of labels
        #[arg(long)]
        answers: PathBuf,

        /// Set keys to include (comma-separated, default: all)
        #[arg(long)]
        sets: Option<String>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Shuffle a question set's questions and options into a new file
    Shuffle {
        /// Question-set file to shuffle
        #[arg(long)]
        questions: PathBuf,

        /// Output file (.json or .toml)
        #[arg(long)]
        output: PathBuf,

        /// Seed for a repeatable order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Convert a spreadsheet or question file into a question set
    Import {
        /// Spreadsheet (.xlsx, .xls, .xlsm, .ods) or question-set file
        #[arg(long)]
        file: PathBuf,

        /// Output file (.json or .toml)
        #[arg(long)]
        output: PathBuf,

        /// Set key (default: the input file name)
        #[arg(long)]
        key: Option<String>,
    },

    /// Create a starter config and sample question set
    Init,
}

fn main() {
    let directive = match "examprep=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Sets { questions, config } => commands::sets::execute(questions, config),
        Commands::Grade {
            questions,
            answers,
            sets,
            format,
            config,
        } => commands::grade::execute(questions, answers, sets, format, config),
        Commands::Shuffle {
            questions,
            output,
            seed,
        } => commands::shuffle::execute(questions, output, seed),
        Commands::Import { file, output, key } => commands::import::execute(file, output, key),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
