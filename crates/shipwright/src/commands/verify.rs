//! `ship verify-archive`

use colored::Colorize;
use shipwright_deploy::verify_archive;
use std::path::Path;

pub fn handle(path: &Path) -> anyhow::Result<()> {
    let summary = verify_archive(path)?;
    println!(
        "{} {} looks usable: {} entries under '{}'",
        "✓".green(),
        path.display(),
        summary.entries,
        summary.root.cyan()
    );
    for sql in &summary.sql_files {
        println!("  dump: {sql}");
    }
    Ok(())
}
