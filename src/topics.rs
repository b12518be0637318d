//! Bus subject formatting and parsing. One dispatch key per (category, action) pair,
//! with `history.request` / `history.response` as the sole compound actions (the
//! latter carries a trailing user segment).

/// A parsed topic: everything a handler needs to route and act on a message
/// without re-splitting the raw subject string itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    pub category: String,
    pub action: String,
    pub room_id: String,
    pub user_id: Option<String>,
}

#[derive(Clone)]
pub struct TopicFormatter {
    prefix: String,
}

impl TopicFormatter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn format(&self, category: &str, action: &str, room_id: &str) -> String {
        format!("{}.{}.{}.{}", self.prefix, category, action, room_id)
    }

    pub fn message_new(&self, room_id: &str) -> String {
        self.format("message", "new", room_id)
    }

    pub fn message_broadcast(&self, room_id: &str) -> String {
        self.format("message", "broadcast", room_id)
    }

    pub fn presence(&self, room_id: &str) -> String {
        self.format("user", "presence", room_id)
    }

    pub fn system_message(&self, room_id: &str) -> String {
        self.format("system", "message", room_id)
    }

    pub fn user_joined(&self, room_id: &str) -> String {
        self.format("user", "joined", room_id)
    }

    pub fn user_left(&self, room_id: &str) -> String {
        self.format("user", "left", room_id)
    }

    pub fn connection_event(&self, room_id: &str) -> String {
        self.format("connection", "event", room_id)
    }

    pub fn history_request(&self, room_id: &str) -> String {
        self.format("message", "history.request", room_id)
    }

    pub fn history_response(&self, room_id: &str, user_id: &str) -> String {
        format!("{}.{}", self.format("message", "history.response", room_id), user_id)
    }

    pub fn ai_command(&self, room_id: &str) -> String {
        self.format("ai", "command", room_id)
    }

    /// Parse a subject back into its logical parts. Recognizes the compound
    /// `history.request` / `history.response` actions as a special case; every
    /// other subject is `{prefix}.{category}.{action}.{room}`.
    pub fn parse(&self, subject: &str) -> Option<ParsedTopic> {
        let rest = subject.strip_prefix(&self.prefix)?.strip_prefix('.')?;
        let parts: Vec<&str> = rest.split('.').collect();

        if parts.len() >= 4 && parts[0] == "message" && parts[1] == "history" {
            let action = format!("history.{}", parts[2]);
            return match action.as_str() {
                "history.request" if parts.len() == 4 => Some(ParsedTopic {
                    category: "message".to_string(),
                    action,
                    room_id: parts[3].to_string(),
                    user_id: None,
                }),
                "history.response" if parts.len() == 5 => Some(ParsedTopic {
                    category: "message".to_string(),
                    action,
                    room_id: parts[3].to_string(),
                    user_id: Some(parts[4].to_string()),
                }),
                _ => None,
            };
        }

        if parts.len() != 3 {
            return None;
        }
        Some(ParsedTopic {
            category: parts[0].to_string(),
            action: parts[1].to_string(),
            room_id: parts[2].to_string(),
            user_id: None,
        })
    }
}
