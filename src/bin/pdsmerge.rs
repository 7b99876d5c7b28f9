use std::fs::File;
use std::io::{self, Write};
use std::process::exit;

use clap::Parser;
use env_logger::Target;
use log::LevelFilter;

use pdsmerge::cmd;
use pdsmerge::cmd::opts::PdsMergeArgs;
use pdsmerge::config;

/// Duplicates log output to a file alongside the usual stderr stream.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn main() {
    let args = PdsMergeArgs::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            exit(1);
        }
    }
    .merge_cli_overrides(args.jaxa, args.dry, None);

    init_logging(&args, config.log_level.as_deref());

    match cmd::exec_command(&args, &config) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            exit(1);
        }
    }
}

fn init_logging(args: &PdsMergeArgs, configured_level: Option<&str>) {
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        configured_level
            .and_then(|l| l.parse().ok())
            .unwrap_or(LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp_secs();

    if let Some(logfile) = &args.logfile {
        match File::create(logfile) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(Tee { file })));
            }
            Err(e) => {
                eprintln!("failed to open logfile {}: {e}", logfile.display());
            }
        }
    }

    builder.init();
}
