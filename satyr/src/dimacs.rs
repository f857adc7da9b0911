//! DIMACS CNF input and output.
pub use satyr_dimacs::{write_dimacs, DimacsHeader, DimacsParser, ParserError};
