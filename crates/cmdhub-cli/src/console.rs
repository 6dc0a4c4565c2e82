use parking_lot::Mutex;

use cmdhub_core::CommandSource;

/// The terminal the binary runs in.
///
/// With no granted permissions the console may use every command; otherwise
/// it holds exactly the granted nodes.
#[derive(Debug)]
pub struct ConsoleSource {
    name: String,
    granted: Vec<String>,
    transcript: Option<Mutex<Vec<String>>>,
}

impl ConsoleSource {
    pub fn new(name: &str, granted: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            granted,
            transcript: None,
        }
    }

    /// A console that records messages instead of printing them.
    #[cfg(test)]
    pub fn recording(name: &str, granted: Vec<String>) -> Self {
        Self {
            transcript: Some(Mutex::new(Vec::new())),
            ..Self::new(name, granted)
        }
    }

    #[cfg(test)]
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .as_ref()
            .map(|lines| lines.lock().clone())
            .unwrap_or_default()
    }
}

impl CommandSource for ConsoleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.granted.is_empty() || self.granted.iter().any(|granted| granted == permission)
    }

    fn send_message(&self, message: &str) {
        match &self.transcript {
            Some(lines) => lines.lock().push(message.to_string()),
            None => println!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_console_has_every_permission() {
        let console = ConsoleSource::new("console", Vec::new());
        assert!(console.has_permission("medkit.heal"));
    }

    #[test]
    fn restricted_console_holds_only_granted_nodes() {
        let console = ConsoleSource::new("console", vec!["medkit.heal".to_string()]);
        assert!(console.has_permission("medkit.heal"));
        assert!(!console.has_permission("core.stop"));
    }

    #[test]
    fn recording_console_keeps_transcript() {
        let console = ConsoleSource::recording("console", Vec::new());
        console.send_message("hello");
        assert_eq!(console.transcript(), vec!["hello"]);
    }
}
