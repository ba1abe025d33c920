//! Remote execution for Shipwright: the executor capability trait, the
//! ssh/scp implementation and idempotency probes.

pub mod error;
pub mod executor;
pub mod probe;

pub use error::{RemoteError, Result};
pub use executor::{CommandOutput, ExecOptions, RemoteExecutor, SshExecutor, shell_escape};
pub use probe::{Probe, ProbeOutcome, check};
