use std::fs;
use std::process::ExitCode;

use clap::Parser;

use nanoc::CompileError;

mod cli;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    let source = match fs::read_to_string(&args.input_file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not open {}: {err}", args.input_file.display());
            return ExitCode::FAILURE;
        }
    };

    match run(args.mode, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render(&source));
            ExitCode::FAILURE
        }
    }
}

fn run(mode: cli::Mode, source: &str) -> Result<(), CompileError> {
    match mode {
        cli::Mode::Ast => {
            let program = nanoc::parse(source).map_err(CompileError::from_parse_errors)?;
            if let Err(err) = program.pretty_print() {
                eprintln!("Could not render the tree: {err}");
            }
        }

        cli::Mode::Check => {
            nanoc::analyze(source)?;
        }

        cli::Mode::Emit => {
            let program = nanoc::compile(source)?;
            print!("{program}");
        }
    }

    Ok(())
}
