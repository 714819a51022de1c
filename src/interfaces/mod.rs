//! Presentation-side adapters: the command script format and its CSV
//! input and output.

pub mod command;
pub mod csv;
