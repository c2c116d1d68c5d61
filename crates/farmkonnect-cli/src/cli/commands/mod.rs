//! CLI command handlers, one per file.

mod backoff;
mod call;
mod config;

pub use backoff::run_backoff;
pub use call::run_call;
pub use config::run_config;

#[cfg(test)]
pub(crate) use backoff::schedule;
#[cfg(test)]
pub(crate) use call::parse_params;
