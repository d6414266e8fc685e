//! Init command

use anyhow::Result;

use vend_schema::Pkgfile;

use crate::context::Project;
use crate::ui::ConsoleReporter;

/// Create an empty `vend.pkg` unless one exists.
pub fn init(project: &Project, output: &ConsoleReporter) -> Result<()> {
    let path = project.pkgfile_path();
    if path.exists() {
        output.info(&format!("{} already exists", path.display()));
        return Ok(());
    }

    std::fs::create_dir_all(project.root())?;
    project.save_pkgfile(&Pkgfile::new())?;
    output.info(&format!("Created {}", path.display()));
    Ok(())
}
