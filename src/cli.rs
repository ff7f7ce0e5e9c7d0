//! Command-line interface for rbeautify.
//!
//! Flags are declared with the clap builder API and collected into [`CliArgs`].

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// Everything the binary needs from its command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to reindent
    pub inputs: Vec<PathBuf>,

    /// Spaces per nesting level
    pub indent: Option<usize>,

    /// Indent with tabs
    pub tabs: bool,

    /// Disable indentation (copy input unchanged)
    pub no_indent: bool,

    /// Print results instead of rewriting files
    pub stdout: bool,

    /// Show changed lines without modifying files
    pub diff: bool,

    /// Report files that would change; modify nothing
    pub check: bool,

    /// Explicit TOML file; disables discovery
    pub config: Option<PathBuf>,

    /// Descend into directories
    pub recursive: bool,

    /// Suppress progress and error messages
    pub silent: bool,

    /// Worker count for file-level parallelism; 0 picks one per core
    pub jobs: Option<usize>,

    /// Glob patterns for paths to skip
    pub exclude: Vec<String>,

    /// Custom Ruby file extensions (in addition to defaults)
    pub ruby_extensions: Vec<String>,

    /// Skip files longer than this
    pub exclude_max_lines: Option<usize>,

    /// Enable debug output
    pub debug: bool,
}

/// The `rbeautify` command definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("rbeautify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reindents Ruby source by keywords and brackets")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to reindent ('-' reads stdin)")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("indent")
                .short('i')
                .long("indent")
                .help("Number of spaces per indent level [default: 2]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("tabs")
                .short('t')
                .long("tabs")
                .help("Indent with one tab per level")
                .conflicts_with("indent")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-indent")
                .long("no-indent")
                .help("Do not reindent; copy input unchanged")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Write reindented text to stdout; leave files untouched")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("diff")
                .short('d')
                .long("diff")
                .help("Show changed lines without modifying files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Exit with status 1 if any file would be reindented; modify nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Read settings from this TOML file instead of searching for rbeautify.toml")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively reindent directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Skip paths matching this glob (repeatable)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("ext")
                .short('x')
                .long("ext")
                .help("Additional Ruby file extension (can be repeated, e.g., -x rbi -x podspec)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("exclude-max-lines")
                .short('m')
                .long("exclude-max-lines")
                .help("Skip files longer than NUM lines")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug logging (config, directives, parse statistics)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Print nothing; rely on the exit status")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Files reindented in parallel (0 = one per core, 1 = in order)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
}

/// Parse `std::env::args`, exiting with usage on error
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse an explicit argument list
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        indent: matches.get_one::<usize>("indent").copied(),
        tabs: matches.get_flag("tabs"),
        no_indent: matches.get_flag("no-indent"),
        stdout: matches.get_flag("stdout"),
        diff: matches.get_flag("diff"),
        check: matches.get_flag("check"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        ruby_extensions: matches
            .get_many::<String>("ext")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        exclude_max_lines: matches.get_one::<usize>("exclude-max-lines").copied(),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
        jobs: matches.get_one::<usize>("jobs").copied(),
    }
}
