use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use plansight::commands::{ExportCommand, ServeCommand};
use plansight::compile::{CompiledPlan, compile};
use plansight::output;
use plansight::plan::load_plan;

#[derive(Parser)]
#[command(name = "plansight")]
#[command(about = "Compiles a Terraform/OpenTofu plan into visualization-ready artifacts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a plan and serve the artifacts over HTTP
    Serve {
        /// Path to the plan JSON file (terraform show -json <planfile>)
        #[arg(short, long)]
        plan: PathBuf,

        /// Address to bind (defaults to 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to 9000)
        #[arg(long)]
        port: Option<u16>,

        /// Display sensitive values instead of redacting them
        #[arg(long)]
        show_sensitive: bool,
    },

    /// Compile a plan and write the artifacts to a directory
    Export {
        /// Path to the plan JSON file (terraform show -json <planfile>)
        #[arg(short, long)]
        plan: PathBuf,

        /// Output directory for the artifact files
        #[arg(short, long, default_value = "plansight-out")]
        out: PathBuf,

        /// Display sensitive values instead of redacting them
        #[arg(long)]
        show_sensitive: bool,

        /// Also write data.js with window globals for offline rendering
        #[arg(long)]
        js_globals: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        output::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            plan,
            host,
            port,
            show_sensitive,
        } => {
            let compiled = load_and_compile(&plan, show_sensitive)?;
            ServeCommand::execute(&compiled, host, port)?;
        }
        Commands::Export {
            plan,
            out,
            show_sensitive,
            js_globals,
        } => {
            let compiled = load_and_compile(&plan, show_sensitive)?;
            ExportCommand::execute(&compiled, &out, js_globals)?;
        }
    }

    Ok(())
}

fn load_and_compile(path: &Path, show_sensitive: bool) -> Result<CompiledPlan> {
    let plan = load_plan(path)?;
    let compiled = compile(&plan, show_sensitive)?;

    output::success_with_details(
        "Compiled plan",
        &format!(
            "{} states, {} nodes, {} edges",
            compiled.overview.states.len(),
            compiled.graph.nodes.len(),
            compiled.graph.edges.len()
        ),
    );
    for diagnostic in &compiled.diagnostics.entries {
        output::warning(&diagnostic.to_string());
    }

    Ok(compiled)
}
