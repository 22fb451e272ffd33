//! Application configuration management.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Workflow steps used when a scholarship does not declare its own.
pub const DEFAULT_WORKFLOW_STEPS: [&str; 3] = ["coordinator", "committee", "finance"];

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Approval workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Notification and audit dispatch configuration.
    #[serde(default)]
    pub side_effects: SideEffectConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Ordered steps applied to scholarships that declare no workflow.
    #[serde(default = "default_steps")]
    pub default_steps: Vec<String>,
    /// Role that holds each step, keyed by step name.
    #[serde(default = "default_step_roles")]
    pub step_roles: BTreeMap<String, String>,
    /// Whether administrators may act on any step.
    #[serde(default = "default_admin_override")]
    pub admin_override: bool,
}

fn default_steps() -> Vec<String> {
    DEFAULT_WORKFLOW_STEPS.iter().map(ToString::to_string).collect()
}

fn default_step_roles() -> BTreeMap<String, String> {
    DEFAULT_WORKFLOW_STEPS
        .iter()
        .map(|step| ((*step).to_string(), (*step).to_string()))
        .collect()
}

fn default_admin_override() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_steps: default_steps(),
            step_roles: default_step_roles(),
            admin_override: default_admin_override(),
        }
    }
}

/// Notification and audit dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SideEffectConfig {
    /// When false, notifications and audit entries are dropped.
    #[serde(default = "default_side_effects_enabled")]
    pub enabled: bool,
}

fn default_side_effects_enabled() -> bool {
    true
}

impl Default for SideEffectConfig {
    fn default() -> Self {
        Self {
            enabled: default_side_effects_enabled(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "scholarflow=info,simulator=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SCHOLARFLOW")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("workflow.default_steps")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
