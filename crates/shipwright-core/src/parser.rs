//! ship.kdl parser
//!
//! Parses environment declarations into an [`EnvironmentRegistry`].
//! Validation happens at parse time; a file that names the same
//! environment twice or omits required fields fails the load.

use crate::environment::{DatabaseConfig, EnvironmentConfig, EnvironmentRegistry};
use crate::error::{CoreError, Result};
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// Parse a ship.kdl file into a registry.
pub fn parse_config_file(path: &Path) -> Result<EnvironmentRegistry> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse ship.kdl content into a registry.
pub fn parse_config(content: &str) -> Result<EnvironmentRegistry> {
    let doc: KdlDocument = content.parse()?;

    let mut registry = EnvironmentRegistry::new();
    for node in doc.nodes() {
        match node.name().value() {
            "environment" => {
                let config = parse_environment(node)?;
                registry.register(config)?;
            }
            _ => {
                // Unknown top level nodes are ignored for forward compatibility.
            }
        }
    }

    Ok(registry)
}

fn parse_environment(node: &KdlNode) -> Result<EnvironmentConfig> {
    let name = node
        .entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| CoreError::InvalidConfig("environment requires a name".to_string()))?
        .to_string();

    let mut config = EnvironmentConfig {
        name: name.clone(),
        ..Default::default()
    };

    let Some(children) = node.children() else {
        return Err(CoreError::InvalidConfig(format!(
            "environment '{name}' has no body"
        )));
    };

    for child in children.nodes() {
        match child.name().value() {
            "host" => config.host = required_string(child, &name)?,
            "user" => config.user = Some(required_string(child, &name)?),
            "workon" => config.workon = required_string(child, &name)?,
            "virtualenv" => config.virtualenv = Some(required_string(child, &name)?),
            "project" => config.project = required_string(child, &name)?,
            "settings" => config.settings = required_string(child, &name)?,
            "repository" => config.repository = required_string(child, &name)?,
            "branch" => config.branch = Some(required_string(child, &name)?),
            "host-aliases" => config.host_aliases = Some(required_string(child, &name)?),
            "django-variant" => config.django_variant = Some(required_string(child, &name)?),
            "extra-command" => config.extra_commands.push(required_string(child, &name)?),
            "backup-path" => config.backup_paths.push(required_string(child, &name)?),
            "backup-dir" => config.backup_dir = Some(required_string(child, &name)?),
            "database" => config.database = Some(parse_database(child, &name)?),
            other => {
                return Err(CoreError::InvalidConfig(format!(
                    "environment '{name}': unknown field '{other}'"
                )));
            }
        }
    }

    for (field, value) in [
        ("workon", &config.workon),
        ("project", &config.project),
        ("settings", &config.settings),
        ("repository", &config.repository),
    ] {
        if value.trim().is_empty() {
            return Err(CoreError::MissingRequiredField {
                environment: name,
                field: field.to_string(),
            });
        }
    }

    Ok(config)
}

fn parse_database(node: &KdlNode, environment: &str) -> Result<DatabaseConfig> {
    let mut database = DatabaseConfig::default();

    let Some(children) = node.children() else {
        return Err(CoreError::InvalidConfig(format!(
            "environment '{environment}': database block has no body"
        )));
    };

    for child in children.nodes() {
        match child.name().value() {
            "host" => database.host = required_string(child, environment)?,
            "name" => database.name = required_string(child, environment)?,
            "user" => database.user = required_string(child, environment)?,
            "password" => database.password = required_string(child, environment)?,
            "charset" => database.charset = Some(required_string(child, environment)?),
            "admin-user" => database.admin_user = Some(required_string(child, environment)?),
            "admin-password" => {
                database.admin_password = Some(required_string(child, environment)?)
            }
            other => {
                return Err(CoreError::InvalidConfig(format!(
                    "environment '{environment}': unknown database field '{other}'"
                )));
            }
        }
    }

    if database.name.trim().is_empty() {
        return Err(CoreError::MissingRequiredField {
            environment: environment.to_string(),
            field: "database.name".to_string(),
        });
    }

    Ok(database)
}

fn required_string(node: &KdlNode, environment: &str) -> Result<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "environment '{}': field '{}' requires a string value",
                environment,
                node.name().value()
            ))
        })
}
