//! The per-invocation identity a host hands to the gates.

/// What the host knows about one inbound event.
///
/// `command` is set when the host has already parsed the message as a command
/// invocation; such triggers go through the command gate and are skipped by the
/// middleware gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    user_id: Option<String>,
    channel_id: Option<String>,
    content: Option<String>,
    command: Option<String>,
}

impl Trigger {
    /// An empty trigger with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the actor id.
    pub fn user(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Set the channel id.
    pub fn channel(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    /// Set the free-text content.
    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Mark this trigger as an invocation of `name`.
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// True when the host recognised this trigger as a command.
    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }
}
