use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_ship_kdl(&self, content: &str) {
        let path = self.root.path().join("ship.kdl");
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

pub const TWO_ENVIRONMENTS: &str = r#"
environment "beta" {
    host "beta.example.com"
    user "deploy"
    workon "/opt/envs"
    project "demo"
    settings "settings_beta"
    repository "git@example.com:demo.git"
    database {
        host "localhost"
        name "demo_beta"
        user "demo"
        password "secret"
    }
}

environment "production" {
    host "www.example.com"
    workon "/opt/envs"
    project "demo"
    settings "settings_production"
    repository "git@example.com:demo.git"
}
"#;
