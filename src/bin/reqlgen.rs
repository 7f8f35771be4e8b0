//! reqlgen: gorethink tests from the ReQL polyglot corpus
//!
//! # Usage
//!
//! ```bash
//! # Convert the whole corpus
//! reqlgen --test-dir ../rql_test/src --test-output-dir ../reql_tests
//!
//! # Convert a single file, with progress
//! reqlgen --test-file math_logic/add.json --info
//!
//! # Translate one snippet
//! reqlgen -e "r.expr([1, 2, 3])[1:]"
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use colored::*;
use reqlgen::config::GenConfigBuilder;
use reqlgen::prelude::*;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reqlgen")]
#[command(version)]
#[command(about = "Generate gorethink Go tests from the ReQL polyglot corpus", long_about = None)]
#[command(after_help = "EXAMPLES:
    reqlgen --test-dir ../rql_test/src --test-output-dir ../reql_tests
    reqlgen --test-file math_logic/add.json --info
    reqlgen -e 'r.expr([1, 2, 3])[1:]'")]
struct Cli {
    /// Directory holding the exported corpus
    #[arg(long)]
    test_dir: Option<PathBuf>,

    /// Directory to render tests to
    #[arg(long)]
    test_output_dir: Option<PathBuf>,

    /// Only convert this corpus file (relative to the test directory)
    #[arg(long)]
    test_file: Option<String>,

    /// Configuration file (default: reqlgen.toml)
    #[arg(long, env = "REQLGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Go test template replacing the built-in one
    #[arg(long)]
    template: Option<PathBuf>,

    /// Print debug output
    #[arg(long)]
    debug: bool,

    /// Print info level output
    #[arg(long)]
    info: bool,

    /// Convert an inline python ReQL snippet to Go
    #[arg(short = 'e', value_name = "SNIPPET")]
    snippet: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match &cli.snippet {
        Some(snippet) => evaluate_snippet(snippet, &cli),
        None => run(&cli),
    };
    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// `warn` unless asked otherwise; `RUST_LOG` directives apply on top.
fn init_tracing(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::DEBUG
    } else if cli.info {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<GenConfig> {
    let config = match &cli.config {
        Some(path) => GenConfig::load(path)?,
        None => GenConfig::discover()?,
    };

    let mut builder = GenConfigBuilder::from_config(config);
    if let Some(dir) = &cli.test_dir {
        builder = builder.test_dir(dir);
    }
    if let Some(dir) = &cli.test_output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(path) = &cli.template {
        builder = builder.template(path);
    }
    Ok(builder.build())
}

fn evaluate_snippet(snippet: &str, cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let go = reqlgen::translate_snippet(snippet, config.smart_bracket)?;
    println!("{}", go);
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(cli)?;

    println!(
        "{} {} {} {}",
        "Converting".cyan().bold(),
        config.test_dir.display().to_string().white(),
        "→".dimmed(),
        config.output_dir.display().to_string().white()
    );

    let report = generate(&config, cli.test_file.as_deref())?;

    for path in &report.written {
        println!("  {} {}", "✓".green(), path.display());
    }
    println!();
    println!(
        "{} {} file(s) written, {} without tests, {} test(s) skipped in {:.2}s",
        "Done:".green().bold(),
        report.written.len().to_string().cyan(),
        report.empty.to_string().yellow(),
        report.skipped.to_string().yellow(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
