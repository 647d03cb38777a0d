//! Command-line interface of the inspection binary

mod args;

pub use args::{parse_address, Args, Command};
