//! Command implementations behind the CLI.
//!
//! Most commands take an already built [`Resolver`](crate::application::Resolver)
//! and write their report to the given output. Partial failures are logged as
//! warnings; a command fails only when it cannot do what was asked.

pub mod config;
mod install;
mod list;
mod search;
mod services;
mod uninstall;
mod update;

use log::warn;

use crate::error::MultiError;

pub use config::{Config, ConfigOverrides};
pub use install::{GoInstaller, Installer, install};
pub use list::list;
pub use search::search;
pub use services::{USER_AGENT, build_http_client, build_resolver};
pub use uninstall::uninstall;
pub use update::update;

#[cfg(test)]
pub use install::MockInstaller;

/// Log every non-fatal error collected along the way.
fn report(errors: &MultiError) {
    for error in errors.iter() {
        warn!("{:#}", error);
    }
}
