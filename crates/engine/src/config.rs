use anet_core::state_machine::WorkflowRules;

/// Error raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a boolean (true/false, 1/0, yes/no), got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

/// Workflow behavior loaded from environment variables.
///
/// | Env Var                        | Default |
/// |--------------------------------|---------|
/// | `ANET_REQUIRE_ENGAGEMENT_DATE` | `true`  |
/// | `ANET_NOTIFY_ON_EDIT`          | `true`  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Refuse to submit a report that has no engagement date.
    pub require_engagement_date: bool,
    /// Notify authors when an approver edits their report back to draft.
    pub notify_on_edit: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_engagement_date: true,
            notify_on_edit: true,
        }
    }
}

impl WorkflowConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            require_engagement_date: read_bool(
                &lookup,
                "ANET_REQUIRE_ENGAGEMENT_DATE",
                defaults.require_engagement_date,
            )?,
            notify_on_edit: read_bool(&lookup, "ANET_NOTIFY_ON_EDIT", defaults.notify_on_edit)?,
        })
    }

    pub fn rules(&self) -> WorkflowRules {
        WorkflowRules {
            require_engagement_date: self.require_engagement_date,
            notify_on_edit: self.notify_on_edit,
        }
    }
}

fn read_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value: raw }),
    }
}
