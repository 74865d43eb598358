use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use statc_core::ir::UntypedProgram;
use statc_core::Compiler;

/// Times the execution of a closure and prints the elapsed time if verbose.
fn time<T, F: FnOnce() -> T>(name: &str, verbose: bool, f: F) -> T {
    let start = Instant::now();
    let result = f();
    if verbose {
        eprintln!("{}: {}ms", name, start.elapsed().as_millis());
    }
    result
}

#[derive(Parser)]
#[command(name = "statc")]
#[command(about = "Compiler driver for a statistical modeling language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a parsed program (JSON AST) to optimized, labeled MIR
    Compile {
        /// Input AST file, as emitted by the parser front end
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output final MIR to a file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip the partial evaluator
        #[arg(long)]
        no_opt: bool,

        /// Print verbose pass timings
        #[arg(short, long)]
        verbose: bool,
    },

    /// Semantically check a parsed program without generating output
    Check {
        /// Input AST file, as emitted by the parser front end
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print verbose pass timings
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed AST input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Compilation(#[from] statc_core::CompilerError),
}

fn read_ast(input: &PathBuf) -> Result<UntypedProgram, DriverError> {
    let source = fs::read_to_string(input)?;
    Ok(serde_json::from_str(&source)?)
}

fn main() -> Result<(), DriverError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            no_opt,
            verbose,
        } => {
            let ast = read_ast(&input)?;
            info!("compiling model '{}'", ast.name);

            let analyzed = time("analyze", verbose, || Compiler::analyze(ast))?;
            let lowered = time("lower", verbose, || analyzed.lower());
            let optimized = if no_opt {
                statc_core::Optimized { mir: lowered.mir }
            } else {
                time("optimize", verbose, || lowered.optimize())
            };
            let labeled = time("label", verbose, || optimized.label());

            let rendered = labeled.program.to_string();
            match output {
                Some(path) => fs::write(path, rendered)?,
                None => print!("{}", rendered),
            }
        }
        Commands::Check { input, verbose } => {
            let ast = read_ast(&input)?;
            info!("checking model '{}'", ast.name);
            time("analyze", verbose, || Compiler::analyze(ast))?;
            eprintln!("OK");
        }
    }
    Ok(())
}
