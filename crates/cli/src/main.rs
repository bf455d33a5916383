use anyhow::Context;
use clap::{CommandFactory, Parser, ValueEnum};
use importblocks_core::{
    config, format_report, ConfigSource, ImportFormatter, Ordering, OutputFormat, RunConfig,
    Target,
};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOOKUP_HELP: &str = "File name to look up, NOT a path to a file.

The lookup starts in the current working directory and goes up to the
filesystem root. Blocks are appended from the topmost file down to the one
closest to the working directory. When no file is found the default config
is used:

importblocks:
  - [\"!std\"]
  - [\"*\"]
  - [\"!mod\"]

Example: with workdir /a/b/c and name importblocks.yaml, the files
/a/b/c/importblocks.yaml, /a/b/importblocks.yaml, /a/importblocks.yaml and
/importblocks.yaml are tried. If /a/importblocks.yaml contains

importblocks:
  - [\"*\"]

and /a/b/c/importblocks.yaml contains

importblocks:
  - [\"github.com/a/b/c\"]

the resulting config is

importblocks:
  - [\"*\"]
  - [\"github.com/a/b/c\"]";

/// First positional arguments that only ask for usage
const HELP_TOKENS: [&str; 6] = ["h", "-h", "--h", "help", "-help", "--help"];

/// Long flags that are also accepted with a single dash
const SINGLE_DASH_FLAGS: [&str; 7] = [
    "config", "lookup", "verbose", "exclude", "threads", "format", "help",
];

#[derive(Parser, Debug)]
#[command(name = "importblocks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Regroup and sort the import blocks of Go source files")]
#[command(long_about = "Rewrites the import header of Go files into a single `import ( ... )` \
    declaration. Imports are grouped into the blocks of the config, sorted by path inside each \
    block, and the blocks are separated by one blank line.\n\n\
    Paths ending with `...` are walked recursively, directories are processed one level deep, \
    and files are processed as given.")]
pub struct Args {
    /// Files, directories, or `dir/...` trees to rewrite
    pub paths: Vec<String>,

    /// Config file path
    #[arg(short, long, conflicts_with = "lookup")]
    pub config: Option<PathBuf>,

    /// Config file name to look up from the working directory upwards
    #[arg(short, long, long_help = LOOKUP_HELP)]
    pub lookup: Option<String>,

    /// Verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Glob of files or directories to leave alone (relative to the working directory)
    #[arg(long, action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Parallel threads (0 = auto)
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Text)]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Text,
    Json,
    Yaml,
    Summary,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Summary => OutputFormat::Summary,
        }
    }
}

impl Args {
    fn config_source(&self) -> ConfigSource {
        match (&self.config, &self.lookup) {
            (Some(path), _) => ConfigSource::Explicit(path.clone()),
            (None, Some(name)) => ConfigSource::Lookup(name.clone()),
            (None, None) => ConfigSource::Default,
        }
    }
}

/// Rewrite `-config x` / `-config=x` style flags into their `--` form.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for arg in args {
        if passthrough {
            normalized.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }
        if arg == "--h" {
            normalized.push("--help".to_string());
            continue;
        }

        let single_dash = arg
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split('=').next().unwrap_or(rest);
                SINGLE_DASH_FLAGS.contains(&name)
            });

        match single_dash {
            Some(rest) => normalized.push(format!("--{}", rest)),
            None => normalized.push(arg),
        }
    }

    normalized
}

fn is_help(arg: &str) -> bool {
    HELP_TOKENS.contains(&arg)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("importblocks=info,importblocks_core=info,warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .compact(),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse_from(normalize_args(std::env::args()));

    match args.paths.first() {
        None => {
            eprintln!("{}", Args::command().render_help());
            process::exit(1);
        }
        Some(first) if is_help(first) => {
            println!("{}", Args::command().render_help());
            process::exit(0);
        }
        Some(_) => {}
    }

    init_logging(args.verbose);

    let work_dir = std::env::current_dir().context("cannot determine working directory")?;

    let resolved = config::resolve(&args.config_source(), &work_dir)?;
    debug!(
        "config sources: {:?} (default: {})",
        resolved.sources, resolved.is_default
    );
    let ordering = Ordering::from_toolchain(&resolved.config, &work_dir)
        .context("cannot build import ordering")?;

    let targets: Vec<Target> = args
        .paths
        .iter()
        .map(|arg| Target::parse(arg, &work_dir))
        .collect();

    let run_config = RunConfig::new(work_dir)
        .with_exclude_patterns(args.exclude.clone())
        .with_threads(args.threads);

    let formatter = ImportFormatter::new(&ordering, run_config)?;
    let report = formatter.run(&targets)?;
    info!(
        "{} file(s) processed, {} rewritten, {} skipped in {}ms",
        report.stats.total_files,
        report.stats.changed,
        report.stats.skipped,
        report.metadata.duration_ms
    );

    let output = format_report(&report, args.format.into(), args.verbose)?;
    print!("{}", output);

    Ok(())
}
