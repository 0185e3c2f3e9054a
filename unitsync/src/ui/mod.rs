//! Terminal output of the CLI.

pub mod table;
