use std::{fs::File, io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser as CParser;
use dungeontalk::interpreter::{Interpreter, RuntimeError};
use log::error;

#[derive(CParser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The DungeonTalk source file to run.
    #[arg(short, long)]
    file: PathBuf,

    /// Write one JSON snapshot of the interpreter state per step.
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn")]
    log_level: log::Level,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    simple_logger::init_with_level(args.log_level)?;

    let mut interpreter = Interpreter::new();

    if let Err(parse_error) = interpreter.read(&args.file.to_string_lossy(), true) {
        error!("{parse_error}");
        std::process::exit(-1);
    }

    let mut trace = match &args.trace {
        Some(path) => {
            Some(File::create(path).with_context(|| format!("could not create {path:?}"))?)
        }
        None => None,
    };

    loop {
        if let Some(out) = &mut trace {
            let snapshot = serde_json::to_string(&interpreter.snapshot())?;
            writeln!(out, "{snapshot}")?;
        }

        match interpreter.exec_next() {
            Ok(_) => {}
            Err(RuntimeError::Eof) => break,
            Err(runtime_error) => {
                error!("{runtime_error}");
                std::process::exit(-1);
            }
        }
    }

    Ok(())
}
