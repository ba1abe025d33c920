//! Shipwright core: environment registry, configuration, templates and
//! confirmation gates.

pub mod alias;
pub mod confirm;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod parser;
pub mod template;

pub use alias::AliasTable;
pub use confirm::{AssumeYes, ConfirmationGate, NonInteractive, TerminalGate};
pub use discovery::{CONFIG_FILENAME, find_config_root, find_config_root_from};
pub use environment::{
    ActiveEnvironment, DatabaseConfig, EnvironmentConfig, EnvironmentRegistry,
};
pub use error::{CoreError, Result};
pub use parser::{parse_config, parse_config_file};
pub use template::{
    EmbeddedTemplates, RenderDisposition, TemplateContext, TemplateRenderer, TemplateSource,
    render_str,
};
