//! rbeautify - keyword and bracket driven reindenter for Ruby source

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, BufRead, BufReader, Cursor, IsTerminal, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use glob::Pattern;
use rayon::prelude::*;
use rbeautify::process::{changed_lines, format_file};
use rbeautify::{build_cli, effective_config, parse_args, CliArgs, Config, Result};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Ruby file extensions to process
const RUBY_EXTENSIONS: &[&str] = &["rb", "rake", "gemspec", "ru", "thor", "builder", "jbuilder"];

/// Extensionless file names that hold Ruby
const RUBY_FILE_NAMES: &[&str] = &["Rakefile", "Gemfile", "Guardfile", "Capfile", "Vagrantfile"];

/// Inputs above this many bytes are refused rather than read into memory
const SIZE_LIMIT: u64 = 100 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Outcome counts of one run
#[derive(Debug, Default)]
struct RunSummary {
    processed: AtomicUsize,
    changed: AtomicUsize,
    errors: AtomicUsize,
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(&args);

    let from_stdin = match args.inputs.as_slice() {
        [] => true,
        [only] => only.as_os_str() == "-",
        _ => false,
    };

    if args.inputs.is_empty() && io::stdin().is_terminal() {
        // Nothing piped in and nothing named
        build_cli().print_help()?;
        return Ok(());
    }

    if from_stdin {
        let config = build_config(&args, None)?;
        if reindent_stdin(&config, &args)? && args.check {
            std::process::exit(1);
        }
        return Ok(());
    }

    // With `--config` every file shares one configuration; without it each
    // file discovers its own from its directory
    let shared_config = match &args.config {
        Some(_) => Some(build_config(&args, None)?),
        None => None,
    };

    if let Some(jobs) = args.jobs.filter(|&n| n > 0) {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
        {
            warn!("could not size the worker pool to {jobs}: {e}");
        }
    }

    let files = collect_files(&args);
    if files.is_empty() {
        if !args.silent {
            eprintln!("No Ruby files found to reindent.");
        }
        return Ok(());
    }

    let summary = RunSummary::default();
    let visit = |path: &PathBuf| visit_file(path, shared_config.as_ref(), &args, &summary);
    if args.stdout || args.diff || args.jobs == Some(1) {
        // Printed output must follow input order
        files.iter().for_each(visit);
    } else {
        files.par_iter().for_each(visit);
    }

    let processed = summary.processed.load(Ordering::Relaxed);
    let changed = summary.changed.load(Ordering::Relaxed);
    let errors = summary.errors.load(Ordering::Relaxed);

    if !args.silent {
        if args.check {
            eprintln!("{changed} of {processed} files would be reindented, {errors} errors.");
        } else if errors == 0 {
            eprintln!("Reindented {processed} files successfully.");
        } else {
            eprintln!("Reindented {processed} files, {errors} errors.");
        }
    }

    if errors > 0 || (args.check && changed > 0) {
        std::process::exit(1);
    }
    Ok(())
}

/// Route `tracing` output to stderr; `RUST_LOG` wins over `--debug`
fn init_logging(args: &CliArgs) {
    let default_level = if args.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolve the configuration for one input
///
/// Sources, weakest first: discovered `rbeautify.toml` files around
/// `for_path` (or the working directory), or the `--config` file instead of
/// them; then the command-line flags.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = match &args.config {
        Some(explicit) => {
            debug!("using explicit config file: {}", explicit.display());
            Config::from_toml_file(explicit)?
        }
        None => {
            let start = for_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            for found in Config::discover_config_files(&start) {
                debug!("discovered config file: {}", found.display());
            }
            Config::from_discovered_files(&start)
        }
    };

    if let Some(width) = args.indent {
        config.set_indent_width(width);
    }
    if args.tabs {
        config.set_tabs();
    }
    if args.no_indent {
        config.impose_indent = false;
    }

    debug!(
        indent_unit = ?config.indent_unit,
        impose_indent = config.impose_indent,
        "configuration"
    );

    match config.validate() {
        Some(problem) => anyhow::bail!("Invalid configuration: {problem}"),
        None => Ok(config),
    }
}

/// Expand the command-line inputs into the list of files to reindent
///
/// Named files are taken as given; directories contribute their Ruby files,
/// one level deep unless `--recursive`.
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    let excludes: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring exclude pattern {p:?}: {e}");
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_file() {
            if !is_excluded(input, &excludes) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            let depth = if args.recursive { 256 } else { 1 };
            // Unreadable entries and symlink loops are skipped
            files.extend(
                WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(depth)
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                    .map(walkdir::DirEntry::into_path)
                    .filter(|path| {
                        path.is_file()
                            && is_ruby_file(path, &args.ruby_extensions)
                            && !is_excluded(path, &excludes)
                    }),
            );
        } else {
            warn!("no such file or directory: {}", input.display());
        }
    }
    files
}

/// A pattern excludes a path when it matches the whole path or any single
/// component of it (so `vendor` skips everything under a `vendor` directory)
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let whole = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        pattern.matches(&whole)
            || path.components().any(|component| match component {
                Component::Normal(part) => pattern.matches(&part.to_string_lossy()),
                _ => false,
            })
    })
}

/// Ruby by extension, by an extra `--ext`, or by a well-known file name
fn is_ruby_file(path: &Path, extra_extensions: &[String]) -> bool {
    let by_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| RUBY_FILE_NAMES.contains(&name));
    by_name
        || path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                RUBY_EXTENSIONS.contains(&ext)
                    || extra_extensions
                        .iter()
                        .any(|extra| extra.strip_prefix('.').unwrap_or(extra) == ext)
            })
}

/// Reindent one file and record the outcome in `summary`
fn visit_file(path: &Path, shared: Option<&Config>, args: &CliArgs, summary: &RunSummary) {
    let outcome = match shared {
        Some(config) => reindent_path(path, config, args),
        None => build_config(args, Some(path)).and_then(|c| reindent_path(path, &c, args)),
    };

    match outcome {
        Ok(Some(changed)) => {
            summary.processed.fetch_add(1, Ordering::Relaxed);
            if changed {
                summary.changed.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(None) => {}
        Err(e) => {
            summary.errors.fetch_add(1, Ordering::Relaxed);
            if !args.silent {
                eprintln!("Error reindenting {}: {e}", path.display());
            }
        }
    }
}

/// Reindent `contents` under `config` as adjusted by any in-file directive
fn reindent_bytes(contents: &[u8], config: &Config, name: &str) -> Result<Vec<u8>> {
    let effective = effective_config(config, contents, name)?;
    let mut output = Vec::with_capacity(contents.len());
    format_file(BufReader::new(Cursor::new(contents)), &mut output, &effective, name)?;
    Ok(output)
}

/// Reindent one file according to the output mode
///
/// Returns whether the file's text changed, or `None` when it was skipped.
fn reindent_path(path: &Path, config: &Config, args: &CliArgs) -> Result<Option<bool>> {
    let size = std::fs::metadata(path)?.len();
    if size > SIZE_LIMIT {
        if !args.silent {
            eprintln!(
                "Skipping {}: {} MiB is over the {} MiB limit",
                path.display(),
                size / MIB,
                SIZE_LIMIT / MIB
            );
        }
        return Ok(None);
    }

    let contents = std::fs::read(path)?;

    if let Some(max_lines) = args.exclude_max_lines {
        let lines = contents.as_slice().lines().count();
        if lines > max_lines {
            if !args.silent {
                eprintln!("Skipping {}: {lines} lines is over the limit of {max_lines}", path.display());
            }
            return Ok(None);
        }
    }

    if !args.silent && !args.stdout && !args.check {
        eprintln!("Reindenting: {}", path.display());
    }

    let name = path.to_string_lossy();
    let output = reindent_bytes(&contents, config, &name)?;
    let changed = output != contents;

    if args.check {
        if changed && !args.silent {
            println!("would reindent: {}", path.display());
        }
    } else if args.stdout {
        io::stdout().write_all(&output)?;
    } else if args.diff {
        print_changes(&name, &contents, &output, args.silent);
    } else if changed {
        std::fs::write(path, &output)?;
    }

    Ok(Some(changed))
}

/// Print the lines whose indentation changed
fn print_changes(name: &str, before: &[u8], after: &[u8], silent: bool) {
    let before = String::from_utf8_lossy(before);
    let after = String::from_utf8_lossy(after);
    let changes = changed_lines(&before, &after);
    if changes.is_empty() {
        return;
    }
    if !silent {
        println!("=== {name} ===");
    }
    for change in changes {
        println!("{}:", change.line);
        println!("- {}", change.before);
        println!("+ {}", change.after);
    }
}

/// Reindent standard input to standard output
///
/// Returns whether the text changed.
fn reindent_stdin(config: &Config, args: &CliArgs) -> Result<bool> {
    let mut contents = Vec::new();
    io::stdin()
        .take(SIZE_LIMIT + 1)
        .read_to_end(&mut contents)?;
    if contents.len() as u64 > SIZE_LIMIT {
        anyhow::bail!("stdin is over the {} MiB limit", SIZE_LIMIT / MIB);
    }

    let output = reindent_bytes(&contents, config, "stdin")?;
    let changed = output != contents;

    if args.check {
        if changed && !args.silent {
            println!("would reindent: stdin");
        }
    } else if args.diff {
        print_changes("stdin", &contents, &output, args.silent);
    } else {
        io::stdout().write_all(&output)?;
    }

    Ok(changed)
}
