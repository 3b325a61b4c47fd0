// src/main.rs
// CLI entry point for the drover automation engine

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use drover::{analyze, render_prompt, EngineConfig, Orchestrator, SessionOutcome};

#[derive(Parser)]
#[command(name = "drover")]
#[command(about = "Automation engine for menu-driven interactive CLI programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze contract metadata and print the derived menu
    Analyze {
        /// Path to the structured descriptor (JSON)
        #[arg(long)]
        descriptor: Option<PathBuf>,

        /// Path to the contract source text
        #[arg(long)]
        source: Option<PathBuf>,

        /// Emit the model as JSON instead of the rendered menu
        #[arg(long)]
        json: bool,
    },

    /// Execute one operation against the wrapped program
    Run {
        /// Operation name to select from the menu
        operation: String,

        /// Argument values, one per declared parameter, in order
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Command that starts the wrapped program
        #[arg(long, env = "DROVER_PROGRAM")]
        program: String,

        /// Arguments passed to the wrapped program
        #[arg(long = "program-arg")]
        program_args: Vec<String>,

        #[arg(long)]
        descriptor: Option<PathBuf>,

        #[arg(long)]
        source: Option<PathBuf>,

        /// Working directory for the wrapped program
        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// Session bound in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Emit the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the wrapped program, capture its menu, and exit
    Menu {
        #[arg(long, env = "DROVER_PROGRAM")]
        program: String,

        #[arg(long = "program-arg")]
        program_args: Vec<String>,

        #[arg(long)]
        working_dir: Option<PathBuf>,

        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Run the compile command to completion
    Compile {
        /// Compile command
        #[arg(long, env = "DROVER_COMPILE_PROGRAM")]
        program: String,

        /// Arguments passed to the compile command
        #[arg(long = "compile-arg")]
        args: Vec<String>,

        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// Compile bound in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Analyze {
            descriptor,
            source,
            json,
        } => {
            let model = analyze(
                read_opt(descriptor)?.as_deref(),
                read_opt(source)?.as_deref(),
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                let menu = drover::build_menu(&model.operations);
                print!("{}", render_prompt(&menu));
                for decl in &model.state {
                    println!("state: {} {} : {}", decl.kind, decl.name, decl.type_tag.label());
                }
            }
        }

        Commands::Run {
            operation,
            args,
            program,
            program_args,
            descriptor,
            source,
            working_dir,
            timeout,
            json,
        } => {
            let model = analyze(
                read_opt(descriptor)?.as_deref(),
                read_opt(source)?.as_deref(),
            );
            info!(
                operations = model.operations.len(),
                "Analyzed contract model"
            );

            let mut config = EngineConfig::from_env().with_args(program_args);
            config.program = program;
            config.execute_timeout = Duration::from_secs(timeout);
            if let Some(dir) = working_dir {
                config = config.with_working_dir(dir);
            }

            let orchestrator = Orchestrator::new(config, model);
            let outcome = orchestrator.execute(&operation, &args).await?;
            report(&outcome, json)?;
        }

        Commands::Menu {
            program,
            program_args,
            working_dir,
            timeout,
        } => {
            let mut config = EngineConfig::from_env().with_args(program_args);
            config.program = program;
            config.execute_timeout = Duration::from_secs(timeout);
            if let Some(dir) = working_dir {
                config = config.with_working_dir(dir);
            }

            let orchestrator = Orchestrator::new(config, Default::default());
            let outcome = orchestrator.probe().await?;
            print!("{}", outcome.captured_output);
        }

        Commands::Compile {
            program,
            args,
            working_dir,
            timeout,
        } => {
            let mut config = EngineConfig::from_env().with_compile_command(program, args);
            config.compile_timeout = Duration::from_secs(timeout);
            if let Some(dir) = working_dir {
                config = config.with_working_dir(dir);
            }

            let orchestrator = Orchestrator::new(config, Default::default());
            let outcome = orchestrator.compile().await?;
            report(&outcome, false)?;
        }
    }

    Ok(())
}

fn read_opt(path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

fn report(outcome: &SessionOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.success {
        info!("Session completed");
    } else {
        let kind = outcome
            .failure
            .map(|f| f.as_str())
            .unwrap_or("unknown");
        info!(failure = kind, "Session failed");
    }
    if let Some(result) = &outcome.structured_result {
        println!("result: {}", result);
    }
    for error in &outcome.errors {
        eprintln!("error: {}", error);
    }
    print!("{}", outcome.captured_output);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
