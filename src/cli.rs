use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = "Compiler for the Nano language", long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Source code input file
    pub input_file: PathBuf,

    /// Execution mode
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Emit)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Run the whole pipeline and print the CPS IR
    Emit,

    /// Stop after scope resolution and type checking
    Check,

    /// Inspect the AST of the parsed source code
    Ast,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Emit => write!(f, "emit"),
            Mode::Check => write!(f, "check"),
            Mode::Ast => write!(f, "ast"),
        }
    }
}
