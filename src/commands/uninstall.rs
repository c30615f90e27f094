//! Remove an installed command.

use std::env::consts::EXE_SUFFIX;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;

use crate::error::is_not_found;
use crate::package::base;
use crate::runtime::Runtime;

/// Delete the executable for `name` from `gobin`.
///
/// `name` is a command name or a full package path; only its last segment
/// names the file.
#[tracing::instrument(skip(runtime, out))]
pub fn uninstall<R: Runtime>(
    runtime: &R,
    gobin: &Path,
    name: &str,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let command = base(name);
    if command.is_empty() || command == "." || command == ".." || command.contains('\\') {
        bail!("Invalid command name {:?}", name);
    }

    let file = gobin.join(format!("{}{}", command, EXE_SUFFIX));
    if let Err(e) = runtime.remove(&file) {
        if is_not_found(&e) {
            bail!("{} is not installed in {}", command, gobin.display());
        }
        return Err(e).with_context(|| format!("Failed to uninstall {}", command));
    }

    info!("Removed {}", file.display());
    writeln!(out, "Removed {}", file.display())?;
    Ok(())
}
