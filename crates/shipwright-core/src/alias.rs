//! Symbolic command aliases
//!
//! Short names expanded to full command lines before remote execution,
//! validated at registration time rather than resolved by ad hoc string
//! splitting.

use crate::error::{CoreError, Result};
use std::collections::HashMap;

/// Validated mapping from symbolic command names to command templates.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock alias set for day-to-day project maintenance.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (name, expansion) in [
            ("gs", "git status"),
            ("gd", "git diff"),
            ("gl", "git pull"),
            ("gp", "git push"),
            ("gb", "git branch"),
            ("gk", "git checkout"),
            ("gm", "git checkout master"),
            ("glog", "git log --oneline --decorate"),
            ("glogg", "git log --oneline --decorate --graph"),
            ("mng", "django-admin.py"),
        ] {
            table
                .register(name, expansion)
                .expect("default aliases are valid");
        }
        table
    }

    /// Register an alias. The name must be a single alphanumeric word and
    /// the expansion non-empty.
    pub fn register(&mut self, name: &str, expansion: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidAlias {
                name: name.to_string(),
                reason: "name must be a single alphanumeric word".to_string(),
            });
        }
        if expansion.trim().is_empty() {
            return Err(CoreError::InvalidAlias {
                name: name.to_string(),
                reason: "expansion must not be empty".to_string(),
            });
        }
        self.aliases.insert(name.to_string(), expansion.to_string());
        Ok(())
    }

    /// Expand the leading word of `command` if it names an alias.
    /// Unknown leading words pass through unchanged.
    pub fn expand(&self, command: &str) -> String {
        let mut words = command.split_whitespace();
        let Some(first) = words.next() else {
            return command.to_string();
        };
        match self.aliases.get(first) {
            None => command.to_string(),
            Some(expansion) => {
                let rest: Vec<&str> = words.collect();
                if rest.is_empty() {
                    expansion.clone()
                } else {
                    format!("{} {}", expansion, rest.join(" "))
                }
            }
        }
    }
}
