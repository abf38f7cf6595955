#![deny(rust_2018_idioms)]

use clap::{Parser, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tidl::print::TreeWriter;
use tidl::{Config, Error, FsLoader};
use tracing::{debug, Level};

/// Check schema files and everything they include.
#[derive(Parser, Debug)]
#[command(name = "tidl", version)]
struct Args {
    /// Schema files to check, each with its own includes
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory to search for includes, after the including file's own
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Print the parse tree of every file that compiles
    #[arg(long)]
    dump: bool,

    /// More logging; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            Self::Auto => io::stderr().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let config = Config {
        include_paths: args.include_paths.clone(),
    };
    for path in &args.files {
        debug!(path = %path.display(), "compiling");
        let result = tidl::compile(path, &config, &FsLoader)?;
        if args.dump {
            if let Some(program) = &result.program {
                let mut stdout = io::stdout().lock();
                for id in program.flatten() {
                    let tree = &program[id];
                    writeln!(stdout, "# {}", tree.path().display())?;
                    let writer = TreeWriter::new(&tree.source, &tree.syntax, tree.document.0);
                    write!(stdout, "{writer}")?;
                }
            }
        }
        if !result.succeeded() {
            let mut stderr = io::stderr().lock();
            tidl::diag::print_diagnostics(&result.diagnostics, &mut stderr, args.color.enabled())?;
            let count = result
                .diagnostics
                .iter()
                .filter(|diagnostic| diagnostic.kind == tidl::diag::ReportKind::Error)
                .count();
            return Err(Error::Failed { count });
        }
    }
    Ok(())
}
