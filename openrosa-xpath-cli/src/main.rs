// OpenRosa XPath CLI
//
// Command-line interface for evaluating OpenRosa XPath expressions with the
// reference host.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::debug;
use openrosa_xpath_core::evaluator::validate_expression;
use openrosa_xpath_core::{to_external_result, Extensions, LocaleTable, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "openrosa-xpath")]
#[command(about = "Command-line interface for OpenRosa XPath expressions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an OpenRosa XPath expression
    Eval {
        /// Expression to evaluate
        expression: String,

        /// JSON file of translated month and weekday names
        #[arg(short, long)]
        locale: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Validate expression syntax
    Validate {
        /// Expression to validate
        expression: String,
    },

    /// List the extension functions and their arities
    Functions,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Eval {
            expression,
            locale,
            format,
        } => {
            let engine = match locale {
                Some(path) => Extensions::with_locale(load_locale(path)?),
                None => Extensions::new(),
            };

            debug!("evaluating '{}'", expression);
            let value = engine
                .evaluate(expression)
                .with_context(|| format!("Failed to evaluate '{}'", expression))?;

            match format {
                OutputFormat::Json => {
                    let json = to_external_result(&value).to_json()?;
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Pretty => {
                    println!("{} {}", "Expression:".green().bold(), expression);
                    println!("{} {}", "Result:".green().bold(), format_as_pretty(&value));
                }
            }

            Ok(())
        }
        Commands::Validate { expression } => {
            println!("{} {}", "Validating:".green().bold(), expression);

            match validate_expression(expression) {
                Ok(_) => {
                    println!("{} Valid expression", "Result:".green().bold());
                    Ok(())
                }
                Err(error) => {
                    println!("{} Invalid: {}", "Result:".red().bold(), error);
                    anyhow::bail!("invalid expression")
                }
            }
        }
        Commands::Functions => {
            let engine = Extensions::new();
            let functions = engine.functions();
            for name in functions.names() {
                if let Some(function) = functions.get(name) {
                    println!("{} ({})", name.cyan(), function.arity.describe());
                }
            }
            Ok(())
        }
    }
}

/// Reads a locale table from a JSON file
fn load_locale(path: &Path) -> Result<LocaleTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read locale file: {}", path.display()))?;
    let table = LocaleTable::from_json(&content)
        .with_context(|| format!("Failed to parse locale file: {}", path.display()))?;
    debug!("loaded {} locale entries from {}", table.len(), path.display());
    Ok(table)
}

/// Formats a value with its kind for display
fn format_as_pretty(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}' {}", s, "(string)".dimmed()),
        other => format!("{} {}", other, format!("({})", other.kind()).dimmed()),
    }
}
