//! Interactive channels that feed conversations into the decision engine.

pub mod cli;

pub use cli::CliChannel;
