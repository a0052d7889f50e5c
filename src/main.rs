//! Command-line entry point: compile a workflow export file to IR JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use flowc::interpret::{HttpInterpreter, HttpInterpreterConfig};
use flowc::pipeline::{Compiler, CompilerOptions};

#[derive(Parser)]
#[command(name = "flowc", about = "Compile a visual workflow export to an IR graph")]
struct Cli {
    /// Path to the workflow export JSON file.
    workflow_file: PathBuf,

    /// Output file for the IR.
    #[arg(long, default_value = "ir_output.json")]
    output: PathBuf,

    /// Upper bound on concurrent node resolutions.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = tokio::fs::read_to_string(&cli.workflow_file).await?;

    let service = Arc::new(HttpInterpreter::new(HttpInterpreterConfig::from_env()?)?);
    let options = CompilerOptions {
        concurrency: cli.concurrency,
        ..CompilerOptions::default()
    };
    let compiler = Compiler::new(service).with_options(options);

    let ir = compiler.compile(&json).await?;
    tokio::fs::write(&cli.output, serde_json::to_string_pretty(&ir)?).await?;

    println!("IR generation successful: {}", cli.output.display());
    println!("Workflow name: {}", ir.name);
    println!("Nodes: {}", ir.nodes.len());
    println!("Edges: {}", ir.edges.len());
    if ir.analysis.dead_nodes.is_empty() {
        println!("No dead nodes found");
    } else {
        println!("Dead nodes: {}", ir.analysis.dead_nodes.join(", "));
    }
    if ir.analysis.cycles.is_empty() {
        println!("No cycles found");
    } else {
        for cycle in &ir.analysis.cycles {
            println!("Cycle: {}", cycle.join(" -> "));
        }
    }
    Ok(())
}
