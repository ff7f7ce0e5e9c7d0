//! rbeautify - keyword and bracket driven reindenter for Ruby source
//!
//! Lines are classified by a memoizing backtracking matcher; string literals,
//! interpolation and heredoc bodies pass through untouched while block
//! keywords and brackets move the indentation depth.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod format;
pub mod grammar;
pub mod parser;
pub mod process;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use directive::{effective_config, find_directive, parse_directive, DirectiveOverrides};
pub use error::{ParseError, Result};
pub use format::Indenter;
pub use grammar::{classify, LineShape};
pub use process::{format_file, reindent};
