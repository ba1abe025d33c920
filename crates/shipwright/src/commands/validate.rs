//! `ship validate`

use colored::Colorize;
use shipwright_core::EnvironmentRegistry;
use std::path::Path;

pub fn handle(config_root: &Path, registry: &EnvironmentRegistry) {
    println!(
        "{} {}",
        "✓".green(),
        format!(
            "{} parsed, {} environment(s)",
            config_root.join(shipwright_core::CONFIG_FILENAME).display(),
            registry.len()
        )
        .bold()
    );
    for name in registry.names() {
        println!("  • {}", name.cyan());
    }
}
