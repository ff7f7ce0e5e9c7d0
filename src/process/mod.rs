//! Document processing pipeline.
//!
//! A document is reindented in a single pass over the line grammar:
//!
//! - Leading whitespace of each line is discarded
//! - The line is classified by the first matching shape (block keyword,
//!   `end`, dual keyword, bracket, block opener, heredoc, plain)
//! - The shape's action renders the line at the current depth and moves the
//!   depth
//!
//! The main entry points are [`reindent`] for in-memory text and
//! [`format_file`], which reads a buffered reader and writes the result to
//! any `Write` implementation.

pub mod pipeline;

pub use pipeline::{changed_lines, format_file, reindent, LineChange};
