//! Indentation tracking and output rendering.
//!
//! - [`indenter`]: Depth counter, indent-prefix rendering and the output buffer
//!   that the line grammar's actions drive

pub mod indenter;

pub use indenter::Indenter;
