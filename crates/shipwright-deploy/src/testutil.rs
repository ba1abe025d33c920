//! Scripted remote host used by this crate's tests.

use async_trait::async_trait;
use shipwright_remote::{CommandOutput, ExecOptions, RemoteExecutor, Result as RemoteResult};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// In-memory stand-in for a target host.
///
/// Existence probes (`test -e '...'`) answer from a scripted path set and
/// are not counted as executed work, so tests can assert on the commands a
/// pipeline actually invoked.
#[derive(Default)]
pub struct ScriptedHost {
    pub existing_paths: Mutex<HashSet<String>>,
    /// Commands containing any of these markers fail.
    pub failing: Vec<String>,
    /// Fixed stdout for commands containing the marker.
    pub outputs: Vec<(String, String)>,
    pub executed: Mutex<Vec<String>>,
    pub written: Mutex<Vec<(String, String)>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let host = Self::new();
        {
            let mut existing = host.existing_paths.lock().unwrap();
            for path in paths {
                existing.insert(path.as_ref().to_string());
            }
        }
        host
    }

    pub fn fail_on(mut self, marker: &str) -> Self {
        self.failing.push(marker.to_string());
        self
    }

    pub fn output_for(mut self, marker: &str, output: &str) -> Self {
        self.outputs.push((marker.to_string(), output.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn written(&self) -> Vec<(String, String)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedHost {
    async fn execute(&self, command: &str, _options: &ExecOptions) -> RemoteResult<CommandOutput> {
        if let Some(path) = command
            .strip_prefix("test -e '")
            .and_then(|rest| rest.strip_suffix('\''))
        {
            if self.existing_paths.lock().unwrap().contains(path) {
                return Ok(CommandOutput::ok(""));
            }
            return Ok(CommandOutput::failed(""));
        }

        self.executed.lock().unwrap().push(command.to_string());

        if self.failing.iter().any(|marker| command.contains(marker)) {
            return Ok(CommandOutput::failed("scripted failure"));
        }
        if let Some((_, output)) = self
            .outputs
            .iter()
            .find(|(marker, _)| command.contains(marker))
        {
            return Ok(CommandOutput::ok(output.clone()));
        }
        Ok(CommandOutput::ok(""))
    }

    async fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        self.executed
            .lock()
            .unwrap()
            .push(format!("upload {} {remote}", local.display()));
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> RemoteResult<()> {
        self.executed
            .lock()
            .unwrap()
            .push(format!("download {remote} {}", local.display()));
        Ok(())
    }

    async fn write_file(&self, remote_path: &str, content: &str) -> RemoteResult<()> {
        self.written
            .lock()
            .unwrap()
            .push((remote_path.to_string(), content.to_string()));
        Ok(())
    }
}
