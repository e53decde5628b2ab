//! CLI subcommands

pub mod describe;
pub mod inspect;
pub mod run;
