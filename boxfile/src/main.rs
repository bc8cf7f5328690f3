use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::{crate_description, crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing_subscriber::EnvFilter;

use boxfile::ext::relative_to;
use boxfile::{append, extract, list};

/// A parsed subcommand, resolved once before any work starts
#[derive(Debug)]
enum Command {
    Append {
        container: PathBuf,
        sources: Vec<PathBuf>,
    },
    Extract {
        container: PathBuf,
        destination: PathBuf,
    },
    List {
        container: PathBuf,
    },
}

impl Command {
    fn from_matches(matches: &ArgMatches) -> anyhow::Result<Command> {
        let path_of = |matches: &ArgMatches, name: &str| {
            matches
                .value_of_os(name)
                .map(PathBuf::from)
                .with_context(|| format!("{} is not specified", name))
        };

        match matches.subcommand() {
            ("append", Some(matches)) => {
                let cwd = env::current_dir().context("Reading current directory")?;
                let sources = matches
                    .values_of_os("files")
                    .map(|files| {
                        files
                            .map(|file| relative_to(&PathBuf::from(file), &cwd))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                if sources.is_empty() {
                    anyhow::bail!("the source files are not specified");
                }
                Ok(Command::Append {
                    container: path_of(matches, "boxfile")?,
                    sources,
                })
            }
            ("extract", Some(matches)) => Ok(Command::Extract {
                container: path_of(matches, "boxfile")?,
                destination: path_of(matches, "destination")?,
            }),
            ("list", Some(matches)) => Ok(Command::List {
                container: path_of(matches, "boxfile")?,
            }),
            (name, _) => anyhow::bail!("unknown command {:?}", name),
        }
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Append { container, sources } => append(container, &sources)?,
            Command::Extract {
                container,
                destination,
            } => extract(destination, container)?,
            Command::List { container } => {
                for entry in list(container)? {
                    println!("{}\t{}", entry.size(), entry.path());
                }
            }
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let arg_boxfile = Arg::with_name("boxfile")
        .help("Path to the .box container")
        .required(true)
        .value_name("BOX");

    let matches = App::new("box")
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("append")
                .about("Append files into a box (box append destination.box file1 file2 ...)")
                .arg(&arg_boxfile)
                .arg(
                    Arg::with_name("files")
                        .help("Files to append, recorded under their relative path")
                        .required(true)
                        .multiple(true)
                        .value_name("FILE"),
                ),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extract files from a box (box extract source.box destination_directory)")
                .arg(&arg_boxfile)
                .arg(
                    Arg::with_name("destination")
                        .help("Directory to extract into")
                        .required(true)
                        .value_name("DIR"),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List the entries of a box")
                .arg(&arg_boxfile),
        )
        .get_matches();

    Command::from_matches(&matches)?.run()
}
