//! CLI subcommand implementations.

pub mod breadcrumb;
pub mod report;
pub mod reset;
pub mod status;
pub mod total;
pub mod watch;
