//! Pre-flight whitelist check over a pipeline config.

use std::collections::BTreeSet;

use crate::error::{PipelineError, PipelineResult};

use super::dispatch::Action;
use super::instruction::PipelineConfig;

/// Set of action names a config may use.
///
/// Names are matched exactly as written in the config, so aliases must be listed explicitly
/// when building a custom set; [`ActionWhitelist::all`] and [`ActionWhitelist::without`] take
/// care of aliases for supported actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionWhitelist {
    names: BTreeSet<String>,
}

impl ActionWhitelist {
    /// Every supported action, aliases included.
    pub fn all() -> Self {
        Self::new(Action::ALL.iter().flat_map(|action| action.names().iter().copied()))
    }

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Remove `name`, and every other name of the same action.
    pub fn without(mut self, name: &str) -> Self {
        match Action::from_name(name) {
            Some(action) => {
                for alias in action.names() {
                    self.names.remove(*alias);
                }
            }
            None => {
                self.names.remove(name);
            }
        }
        self
    }

    pub fn allows(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ActionWhitelist {
    fn default() -> Self {
        Self::all()
    }
}

/// Check every instruction's `action` against `whitelist`, in order.
///
/// Nothing is executed. Fails at the first instruction without a string `action`
/// ([`PipelineError::Config`]) or with an action outside the whitelist
/// ([`PipelineError::UnknownAction`] carrying the action and its zero-based position).
pub fn validate_config(config: &PipelineConfig, whitelist: &ActionWhitelist) -> PipelineResult<()> {
    for (step, instruction) in config.iter().enumerate() {
        let name = instruction.action().map_err(|e| match e {
            PipelineError::Config { message } => {
                PipelineError::config(format!("instruction {step}: {message}"))
            }
            other => other,
        })?;
        if !whitelist.allows(name) {
            return Err(PipelineError::UnknownAction {
                action: name.to_owned(),
                step: Some(step),
            });
        }
    }
    Ok(())
}
