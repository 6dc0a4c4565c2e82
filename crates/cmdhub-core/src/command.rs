use thiserror::Error;

pub mod program;

pub use program::ProgramCallable;

/// Failure raised while executing or completing a command.
///
/// Dispatchers and the command service pass these through untouched.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid usage: {message}")]
    InvalidUsage { message: String, usage: String },
    #[error("'{source_name}' lacks permission '{permission}'")]
    PermissionDenied {
        source_name: String,
        permission: String,
    },
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl CommandError {
    pub fn invalid_usage(message: impl Into<String>, usage: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
            usage: usage.into(),
        }
    }

    pub fn permission_denied(source: &dyn CommandSource, permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            source_name: source.name().to_string(),
            permission: permission.into(),
        }
    }
}

/// Whoever issued a command: the console, a player, a remote client.
pub trait CommandSource: Send + Sync {
    fn name(&self) -> &str;

    /// Checks a permission node. Sources without a permission model allow
    /// everything.
    fn has_permission(&self, _permission: &str) -> bool {
        true
    }

    fn send_message(&self, message: &str);
}

/// A command handler, opaque to the dispatcher and the command service.
pub trait CommandCallable: std::fmt::Debug + Send + Sync {
    /// Executes the command with the argument string that followed its alias.
    ///
    /// `parents` holds the aliases used to reach this command, outermost first.
    /// Returns `Ok(false)` when the handler declined to process the input.
    ///
    /// # Errors
    /// Returns an error on bad arguments, missing permission or handler failure.
    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        parents: &[String],
    ) -> Result<bool, CommandError>;

    /// Completions for a partial argument string.
    ///
    /// # Errors
    /// Returns an error if the handler cannot interpret the partial input.
    fn suggestions(
        &self,
        _source: &dyn CommandSource,
        _arguments: &str,
    ) -> Result<Vec<String>, CommandError> {
        Ok(Vec::new())
    }

    fn test_permission(&self, _source: &dyn CommandSource) -> bool {
        true
    }

    fn short_description(&self) -> Option<String> {
        None
    }

    fn help(&self) -> Option<String> {
        None
    }

    fn usage(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Console;

    impl CommandSource for Console {
        fn name(&self) -> &str {
            "console"
        }

        fn send_message(&self, _message: &str) {}
    }

    #[test]
    fn permission_denied_names_source_and_node() {
        let err = CommandError::permission_denied(&Console, "medkit.heal");
        assert_eq!(err.to_string(), "'console' lacks permission 'medkit.heal'");
    }

    #[test]
    fn handler_errors_display_transparently() {
        let err = CommandError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn invalid_usage_carries_usage_text() {
        let err = CommandError::invalid_usage("missing target", "<player>");
        match err {
            CommandError::InvalidUsage { message, usage } => {
                assert_eq!(message, "missing target");
                assert_eq!(usage, "<player>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
