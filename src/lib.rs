#![deny(rust_2018_idioms)]

mod list;
pub use error::Error;
pub use program::{parse_program, Config, FileLoader, FsLoader, MemoryLoader};
pub use sema::{analyze, Analysis, Phase};

pub mod bind;
pub mod check;
pub mod cyclic;
pub mod diag;
pub mod enter;
pub mod error;
pub mod lex;
pub mod parse;
pub mod print;
pub mod program;
pub mod sema;
pub mod source;
pub mod syntax;
pub mod unused;

use std::path::Path;
use tracing::debug;

pub struct CompileResult {
    /// `None` when parsing or include resolution failed.
    pub program: Option<program::Program>,
    pub analysis: Analysis,
    pub diagnostics: Vec<diag::Diagnostic>,
}

impl CompileResult {
    pub fn succeeded(&self) -> bool {
        self.program.is_some() && self.analysis.succeeded()
    }
}

/// Parse `path` with its includes and run every analysis phase.
pub fn compile(path: &Path, config: &Config, loader: &dyn FileLoader) -> Result<CompileResult, Error> {
    let mut context = diag::CompileContext::new();
    let program = parse_program(path, config, loader, &mut context)?;
    let analysis = match &program {
        Some(program) => analyze(program, &mut context),
        None => Analysis::default(),
    };
    debug!(
        path = %path.display(),
        completed = ?analysis.completed,
        errors = context.error_count(),
        "compiled"
    );
    Ok(CompileResult {
        program,
        analysis,
        diagnostics: context.into_diagnostics(),
    })
}

#[cfg(test)]
mod tests;
