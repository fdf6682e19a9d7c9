//! QTI route engine CLI
//!
//! The `qtiroute` command loads a JSON test definition, builds its route and
//! drives it from the command line.
//!
//! ## Commands
//!
//! - `inspect`: List every step with its effective policies
//! - `branch`: Branch from an item occurrence and show where the route lands
//! - `categories`: List item references per category

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use qtiroute_core::{
    load_definition, Route, RouteBuilder, SessionSpan, Step, TestDefinition,
};

#[derive(Parser)]
#[command(name = "qtiroute")]
#[command(author = "Stevedores Org")]
#[command(version = qtiroute_core::VERSION)]
#[command(about = "QTI test navigation and routing engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every step of the route built from a definition
    Inspect {
        /// Path to the test definition (JSON)
        #[arg(env = "QTIROUTE_DEFINITION")]
        definition: PathBuf,

        /// Print the steps as a JSON array
        #[arg(long)]
        as_json: bool,
    },

    /// Branch from an item occurrence to a target
    Branch {
        /// Path to the test definition (JSON)
        #[arg(env = "QTIROUTE_DEFINITION")]
        definition: PathBuf,

        /// Occurrence to branch from, e.g. Q01.0
        #[arg(long)]
        from: String,

        /// Branch target: item, item.N (1-based), section or test part
        target: String,
    },

    /// List item references per category
    Categories {
        /// Path to the test definition (JSON)
        #[arg(env = "QTIROUTE_DEFINITION")]
        definition: PathBuf,

        /// Restrict to these categories (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
}

/// One row of `qtiroute inspect`.
#[derive(Debug, Serialize)]
struct StepSummary {
    position: usize,
    occurrence: String,
    test_part: String,
    sections: Vec<String>,
    navigation_mode: String,
    submission_mode: String,
    /// Identifier of the component whose session control applies.
    session_control: Option<String>,
    max_attempts: Option<u32>,
    /// Identifiers of the components declaring time limits, outermost first.
    time_limits: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    qtiroute_core::init_tracing(cli.json, level);
    let _session = SessionSpan::enter(&format!("qtiroute-{}", std::process::id()));

    match cli.command {
        Commands::Inspect {
            definition,
            as_json,
        } => cmd_inspect(&definition, as_json),
        Commands::Branch {
            definition,
            from,
            target,
        } => cmd_branch(&definition, &from, &target),
        Commands::Categories {
            definition,
            categories,
        } => cmd_categories(&definition, &categories),
    }
}

fn load_route(path: &Path) -> Result<(TestDefinition, Route)> {
    let definition = load_definition(path)
        .with_context(|| format!("Failed to load test definition from {}", path.display()))?;
    let route = RouteBuilder::from_definition(&definition).with_context(|| {
        format!(
            "Failed to build route for test '{}'",
            definition.test().identifier()
        )
    })?;
    info!(steps = route.len(), "route ready");
    Ok((definition, route))
}

fn cmd_inspect(path: &Path, as_json: bool) -> Result<()> {
    let (_definition, route) = load_route(path)?;
    let summaries = summarize(&route);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for s in &summaries {
        let sections = if s.sections.is_empty() {
            "-".to_string()
        } else {
            s.sections.join("/")
        };
        println!(
            "{:>4}  {:<12} {:<10} {:<20} {}/{}",
            s.position, s.occurrence, s.test_part, sections, s.navigation_mode, s.submission_mode
        );
        if let Some(owner) = &s.session_control {
            let attempts = match s.max_attempts {
                Some(0) => "unlimited".to_string(),
                Some(n) => n.to_string(),
                None => "-".to_string(),
            };
            println!("      session control: {owner} (max attempts: {attempts})");
        }
        if !s.time_limits.is_empty() {
            println!("      time limits:     {}", s.time_limits.join(", "));
        }
    }
    Ok(())
}

fn cmd_branch(path: &Path, from: &str, target: &str) -> Result<()> {
    let (_definition, mut route) = load_route(path)?;
    let position = branch_from(&mut route, from, target)?;
    let step = route.get(position)?;
    println!(
        "{from} -> {target}: landed on {} (position {position}, test part {})",
        step.occurrence(),
        step.test_part().identifier()
    );
    Ok(())
}

fn cmd_categories(path: &Path, categories: &[String]) -> Result<()> {
    let (_definition, route) = load_route(path)?;
    let selected: Vec<&str> = if categories.is_empty() {
        route.categories().iter().map(String::as_str).collect()
    } else {
        categories.iter().map(String::as_str).collect()
    };

    if selected.is_empty() {
        println!("No categories in route.");
        return Ok(());
    }
    for category in selected {
        let items: Vec<&str> = route
            .items_by_category([category])
            .iter()
            .map(|item| item.identifier())
            .collect();
        println!("{category}: {}", items.join(", "));
    }
    Ok(())
}

/// Put the cursor on `from`, then branch to `target`.
fn branch_from(route: &mut Route, from: &str, target: &str) -> Result<usize> {
    let start = route
        .position_of(from)
        .with_context(|| format!("Unknown starting occurrence '{from}'"))?;
    route.set_position(start)?;
    route
        .branch(target)
        .with_context(|| format!("Branch from '{from}' to '{target}' refused"))
}

fn summarize(route: &Route) -> Vec<StepSummary> {
    route
        .steps()
        .iter()
        .enumerate()
        .map(|(position, step)| summarize_step(position, step))
        .collect()
}

fn summarize_step(position: usize, step: &Step) -> StepSummary {
    let session_control = step.effective_session_control();
    StepSummary {
        position,
        occurrence: step.occurrence().identifier(),
        test_part: step.test_part().identifier().to_string(),
        sections: step
            .sections()
            .iter()
            .map(|s| s.identifier().to_string())
            .collect(),
        navigation_mode: step.navigation_mode().to_string(),
        submission_mode: step.submission_mode().to_string(),
        session_control: session_control.as_ref().map(|(owner, _)| owner.identifier()),
        max_attempts: session_control.map(|(_, isc)| isc.max_attempts),
        time_limits: step
            .effective_time_limits(false)
            .iter()
            .map(|(owner, _)| owner.identifier())
            .collect(),
    }
}
