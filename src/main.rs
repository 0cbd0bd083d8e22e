// minic: command-line driver for the front end

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crossterm::style::{style, Stylize};

use minic::compiler::{compile, CompileError, CompileOptions};
use minic::parser::parse::ParseError;
use minic::semantic::{analyze_with, AnalyzerOptions, SemanticWarning};

#[derive(Parser)]
#[command(name = "minic")]
#[command(about = "Front end for a small C-like language: tokens, AST, checks and IR", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log stage progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print diagnostics without colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Do not warn about variables that are never read
    #[arg(long, global = true)]
    no_warn_unused: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream
    Tokens {
        /// Source file
        input: String,
    },

    /// Parse and print the syntax tree
    Ast {
        /// Source file
        input: String,
    },

    /// Run semantic analysis and list the global symbols
    Check {
        /// Source file
        input: String,
    },

    /// Compile to three-address code
    Ir {
        /// Source file
        input: String,

        /// Generate IR without running semantic analysis
        #[arg(long)]
        skip_semantic: bool,
    },
}

/// Diagnostic printer
struct Reporter {
    color: bool,
}

impl Reporter {
    fn error(&self, message: &str) {
        if self.color {
            eprintln!("{}", style(message).red());
        } else {
            eprintln!("{}", message);
        }
    }

    fn warning(&self, message: &str) {
        if self.color {
            eprintln!("{}", style(message).yellow());
        } else {
            eprintln!("{}", message);
        }
    }

    fn heading(&self, text: &str) {
        if self.color {
            println!("{}", style(text).bold());
        } else {
            println!("{}", text);
        }
    }

    fn syntax_errors(&self, errors: &[ParseError]) {
        for err in errors {
            self.error(&err.to_string());
        }
    }

    fn warnings(&self, warnings: &[SemanticWarning]) {
        for warning in warnings {
            self.warning(&warning.to_string());
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let reporter = Reporter {
        color: !cli.no_color,
    };
    let analyzer = AnalyzerOptions {
        warn_unused: !cli.no_warn_unused,
    };

    match cli.command {
        Commands::Tokens { input } => {
            let source = fs::read_to_string(&input)?;
            let (tokens, diagnostics) = minic::tokenize_with_diagnostics(&source);
            for token in tokens {
                println!(
                    "{:>4}:{:<4} {}",
                    token.location.line, token.location.column, token
                );
            }
            for err in &diagnostics {
                reporter.error(&err.to_string());
            }
            if !diagnostics.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Ast { input } => {
            let source = fs::read_to_string(&input)?;
            let outcome = minic::parse(&source);
            if outcome.had_error() {
                reporter.syntax_errors(&outcome.errors);
                return Ok(ExitCode::FAILURE);
            }
            println!("{:#?}", outcome.program);
        }

        Commands::Check { input } => {
            let source = fs::read_to_string(&input)?;
            let outcome = minic::parse(&source);
            if outcome.had_error() {
                reporter.syntax_errors(&outcome.errors);
                return Ok(ExitCode::FAILURE);
            }

            let analysis = analyze_with(&outcome.program, analyzer);
            for err in &analysis.errors {
                reporter.error(&err.to_string());
            }
            reporter.warnings(&analysis.warnings);

            reporter.heading("Global symbols:");
            for symbol in &analysis.globals {
                println!(
                    "  {:<40} line {}",
                    symbol.to_string(),
                    symbol.location.line
                );
            }

            if !analysis.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
            println!("{} OK", input);
        }

        Commands::Ir {
            input,
            skip_semantic,
        } => {
            let source = fs::read_to_string(&input)?;
            let options = CompileOptions {
                analyzer,
                skip_semantic,
            };

            match compile(&source, &options) {
                Ok(compilation) => {
                    reporter.warnings(compilation.warnings());
                    reporter.heading(&format!(
                        "IR instructions ({} total):",
                        compilation.ir.len()
                    ));
                    print!("{}", compilation.ir);
                }
                Err(err) => {
                    for message in err.messages() {
                        reporter.error(&message);
                    }
                    if let CompileError::Semantic { warnings, .. } = &err {
                        reporter.warnings(warnings);
                    }
                    reporter.error(&err.to_string());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
