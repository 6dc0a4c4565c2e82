use std::process::{Command, Stdio};

use anyhow::anyhow;
use tracing::{debug, error};

use crate::command::{CommandCallable, CommandError, CommandSource};

/// A command handler that runs an external program.
///
/// The program receives its configured arguments followed by the
/// whitespace-separated tokens the user typed after the alias. Every line the
/// program writes to stdout is relayed to the command source.
#[derive(Debug, Clone)]
pub struct ProgramCallable {
    program: String,
    args: Vec<String>,
    description: Option<String>,
    permission: Option<String>,
}

impl ProgramCallable {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            description: None,
            permission: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Requires sources to hold `permission` before the program is started.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }
}

impl CommandCallable for ProgramCallable {
    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        parents: &[String],
    ) -> Result<bool, CommandError> {
        if let Some(permission) = &self.permission {
            if !source.has_permission(permission) {
                return Err(CommandError::permission_denied(source, permission));
            }
        }

        debug!(
            "running '{}' for {} (via {})",
            self.program,
            source.name(),
            parents.join(" ")
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(arguments.split_whitespace())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| {
                error!("failed to spawn '{}': {}", self.program, e);
                anyhow!("failed to start '{}': {e}", self.program)
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            source.send_message(line);
        }

        if !output.status.success() {
            let err = anyhow!("'{}' exited with status {}", self.program, output.status);
            return Err(err.into());
        }

        Ok(true)
    }

    fn test_permission(&self, source: &dyn CommandSource) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |permission| source.has_permission(permission))
    }

    fn short_description(&self) -> Option<String> {
        self.description.clone()
    }

    fn usage(&self) -> String {
        "[arguments...]".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        granted: Vec<String>,
        messages: Mutex<Vec<String>>,
    }

    impl CommandSource for RecordingSource {
        fn name(&self) -> &str {
            "tester"
        }

        fn has_permission(&self, permission: &str) -> bool {
            self.granted.iter().any(|p| p == permission)
        }

        fn send_message(&self, message: &str) {
            self.messages.lock().push(message.to_string());
        }
    }

    #[test]
    fn relays_program_output_to_source() {
        let callable = ProgramCallable::new("echo", vec!["healing".to_string()]);
        let source = RecordingSource::default();

        let handled = callable
            .call(&source, "alice  bob", &["heal".to_string()])
            .expect("echo should run");

        assert!(handled);
        assert_eq!(*source.messages.lock(), vec!["healing alice bob"]);
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let script = vec!["-c".to_string(), "echo partial; exit 3".to_string()];
        let callable = ProgramCallable::new("sh", script);
        let source = RecordingSource::default();

        let err = callable.call(&source, "", &[]).expect_err("must fail");
        assert!(matches!(err, CommandError::Failed(_)));
        assert_eq!(*source.messages.lock(), vec!["partial"]);
    }

    #[test]
    fn missing_program_is_a_failure() {
        let callable = ProgramCallable::new("cmdhub-definitely-not-installed", Vec::new());
        let err = callable
            .call(&RecordingSource::default(), "", &[])
            .expect_err("spawn must fail");
        assert!(matches!(err, CommandError::Failed(_)));
    }

    #[test]
    fn permission_is_checked_before_spawning() {
        let callable = ProgramCallable::new("echo", Vec::new()).with_permission("medkit.heal");
        let denied = RecordingSource::default();
        let granted = RecordingSource {
            granted: vec!["medkit.heal".to_string()],
            ..Default::default()
        };

        assert!(!callable.test_permission(&denied));
        assert!(callable.test_permission(&granted));

        let err = callable.call(&denied, "", &[]).expect_err("must be denied");
        assert!(matches!(err, CommandError::PermissionDenied { .. }));
        assert!(denied.messages.lock().is_empty());
    }
}
