use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use lhe::{LheSplitter, output_path_for};
use log::Level;

struct LheSplit {
    input: PathBuf,
    verbosity_level: Level,
    confirm_overwrite: bool,
}

impl LheSplit {
    pub fn from_cli_matches(matches: &ArgMatches) -> Self {
        let input = PathBuf::from(
            matches
                .get_one::<String>("INPUT")
                .expect("This is a required argument"),
        );

        let verbosity_level = match matches.get_count("verbose") {
            0 => Level::Info,
            1 => Level::Debug,
            _ => Level::Trace,
        };

        let confirm_overwrite = !matches.get_flag("no-confirm-overwrite");

        LheSplit {
            input,
            verbosity_level,
            confirm_overwrite,
        }
    }

    /// Main entry point for `LheSplit`.
    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        log::info!("preparing to read {}", self.input.display());
        let splitter = LheSplitter::from_path(&self.input)
            .with_context(|| format!("failed to scan `{}`", self.input.display()))?;

        if splitter.catalog().is_empty() {
            log::info!(
                "{} declares no weight groups, nothing to split",
                self.input.display()
            );
            return Ok(());
        }

        self.check_output_paths(&splitter)?;

        splitter
            .split()
            .with_context(|| format!("failed to split `{}`", self.input.display()))?;
        Ok(())
    }

    /// Refuses to clobber directories, and unless overridden asks before
    /// overwriting existing output files.
    fn check_output_paths(&self, splitter: &LheSplitter) -> Result<()> {
        for id in splitter.catalog().ids() {
            let path = output_path_for(&self.input, id);

            if path.is_dir() {
                bail!(
                    "there is a directory at {}, refusing to overwrite",
                    path.display()
                );
            }

            if path.exists() && self.confirm_overwrite {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        path.display()
                    ))
                    .default(false)
                    .interact()
                    .context("failed to write confirmation prompt to term")?;

                if !confirmed {
                    bail!("Cancelled");
                }
            }
        }
        Ok(())
    }

    fn try_to_initialize_logging(&self) {
        use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

        if let Err(e) = TermLogger::init(
            self.verbosity_level.to_level_filter(),
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ) {
            eprintln!("Failed to initialize logging: {e}");
        }
    }
}

fn main() {
    let matches = Command::new("LHE Splitter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Split an LHE file with multiple weights into multiple single-weight files")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .value_name("file_name")
                .help("an input LHE file with multiple weights"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(
                    "-v - debug, -vv - trace. Progress is logged at info level by default.\n\
                     trace output is only available in debug builds, as it is extremely verbose",
                ),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help(
                    "When set, will not ask for confirmation before overwriting existing \
                     output files, useful for automation",
                ),
        )
        .get_matches();

    let app = LheSplit::from_cli_matches(&matches);
    if let Err(e) = app.run() {
        eprintln!("{e:#}");
        exit(1);
    }
}
