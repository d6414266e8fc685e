//! Add command

use anyhow::{Context, Result};

use vend_schema::{Package, Pkgfile};

use crate::context::Project;
use crate::ui::ConsoleReporter;

/// Declare `coordinates` in `vend.pkg`, creating it if needed.
pub fn add(project: &Project, coordinates: &[String], output: &ConsoleReporter) -> Result<()> {
    let packages = coordinates
        .iter()
        .map(|c| {
            c.parse::<Package>()
                .with_context(|| format!("Invalid coordinate '{c}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut pkgfile = if project.pkgfile_path().exists() {
        project.load_pkgfile()?
    } else {
        Pkgfile::new()
    };

    for pkg in &packages {
        if pkgfile.insert(pkg).is_some() {
            output.info(&format!("{pkg} is already declared"));
        } else {
            output.info(&format!("Added {pkg}"));
        }
    }

    project.save_pkgfile(&pkgfile)
}
