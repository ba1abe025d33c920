//! `ship envs`

use colored::Colorize;
use shipwright_core::EnvironmentRegistry;

pub fn handle(registry: &EnvironmentRegistry) {
    if registry.is_empty() {
        println!("{}", "No environments registered in ship.kdl".yellow());
        return;
    }

    for name in registry.names() {
        // names() only returns registered keys, so resolve cannot fail here.
        let Ok(config) = registry.resolve(name) else {
            continue;
        };
        println!(
            "{}  host={} project={} branch={}",
            name.cyan().bold(),
            config.host,
            config.project,
            config.branch(),
        );
    }
}
