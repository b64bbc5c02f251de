use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageType {
    Error,
    Warning,
    Success,
    Info,
}

impl MessageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Success => "success",
            MessageType::Info => "info",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a field's message list. Both parts are optional: a rule may flag a
/// field without text, and a custom message may carry no type.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Message {
    pub message: Option<String>,
    pub kind: Option<MessageType>,
}

impl Message {
    pub fn new(message: Option<String>, kind: Option<MessageType>) -> Self {
        Self { message, kind }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), Some(MessageType::Error))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), Some(MessageType::Warning))
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), Some(MessageType::Success))
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), Some(MessageType::Info))
    }

    pub fn is_error(&self) -> bool {
        self.kind == Some(MessageType::Error)
    }

    pub fn is_warning(&self) -> bool {
        self.kind == Some(MessageType::Warning)
    }
}
