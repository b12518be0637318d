//! Slash-command parsing and dispatch bodies for the AI agent. Grounded on
//! `original_source/internal/ai/command.go`'s `ParseCommandWithArgs` and the
//! five `HandleXxxCommand` methods.

pub const COMMAND_SUMMARY: &str = "/summary";
pub const COMMAND_HELP: &str = "/help";
pub const COMMAND_STATS: &str = "/stats";
pub const COMMAND_CLEAR: &str = "/clear";
pub const COMMAND_PROMPT: &str = "/prompt";

/// Splits `content` into a command token (including its leading slash) and its
/// remaining whitespace-separated arguments. Mirrors `ParseCommandWithArgs`:
/// content not starting with `/` parses to an empty command and no args.
pub fn parse_command(content: &str) -> (String, Vec<String>) {
    if !content.starts_with('/') {
        return (String::new(), Vec::new());
    }

    let mut parts = content.split_whitespace();
    let Some(command) = parts.next() else {
        return (String::new(), Vec::new());
    };

    (command.to_string(), parts.map(str::to_string).collect())
}

pub fn help_text() -> String {
    "Available commands:\n\
     /summary - generate a summary of the conversation so far\n\
     /help - show this message\n\
     /stats - show this room's AI assistant statistics\n\
     /clear - clear the summary history and start fresh\n\
     /prompt <text> - ask the assistant to act on a custom instruction\n"
        .to_string()
}

pub fn unsupported_command_text() -> String {
    "Unsupported command".to_string()
}

pub fn empty_prompt_text() -> String {
    "Please provide some text after /prompt".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_args() {
        let (command, args) = parse_command("/prompt summarize the bug reports");
        assert_eq!(command, "/prompt");
        assert_eq!(args, vec!["summarize", "the", "bug", "reports"]);
    }

    #[test]
    fn command_with_no_args_has_empty_args() {
        let (command, args) = parse_command("/summary");
        assert_eq!(command, "/summary");
        assert!(args.is_empty());
    }

    #[test]
    fn non_slash_content_is_not_a_command() {
        let (command, args) = parse_command("just chatting");
        assert_eq!(command, "");
        assert!(args.is_empty());
    }

    #[test]
    fn collapses_repeated_whitespace_between_args() {
        let (command, args) = parse_command("/prompt   two   words");
        assert_eq!(command, "/prompt");
        assert_eq!(args, vec!["two", "words"]);
    }
}
