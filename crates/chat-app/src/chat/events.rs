/// What one line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Message text, still untrimmed.
    Submit(String),
    /// Re-run a failed history load.
    Retry,
    /// Scroll by the given number of rows, or half a page when omitted.
    ScrollUp(Option<usize>),
    ScrollDown(Option<usize>),
    Bottom,
    /// Change the local author name.
    Nick(String),
    Quit,
    Help,
    /// A slash command that could not be understood, with a hint to show.
    Invalid(String),
}

pub const HELP_TEXT: &str =
    "/retry  /up [n]  /down [n]  /bottom  /nick NAME  /quit  (start with // to send a literal /)";

impl InputCommand {
    /// Parses one prompt line. Lines starting with `/` are commands; `//`
    /// escapes a leading slash in message text.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(escaped) = trimmed.strip_prefix("//") {
            return Self::Submit(format!("/{escaped}"));
        }
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Submit(line.to_string());
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (command, ""),
        };

        match name {
            "retry" => Self::Retry,
            "up" => parse_rows(argument).map_or_else(Self::Invalid, Self::ScrollUp),
            "down" => parse_rows(argument).map_or_else(Self::Invalid, Self::ScrollDown),
            "bottom" => Self::Bottom,
            "nick" if argument.is_empty() => Self::Invalid("usage: /nick NAME".to_string()),
            "nick" => Self::Nick(argument.to_string()),
            "quit" | "exit" => Self::Quit,
            "help" => Self::Help,
            other => Self::Invalid(format!("unknown command /{other}; {HELP_TEXT}")),
        }
    }
}

fn parse_rows(argument: &str) -> Result<Option<usize>, String> {
    if argument.is_empty() {
        return Ok(None);
    }
    match argument.parse::<usize>() {
        Ok(rows) if rows > 0 => Ok(Some(rows)),
        _ => Err(format!("expected a positive row count, got `{argument}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_submissions() {
        assert_eq!(
            InputCommand::parse("  hello there "),
            InputCommand::Submit("  hello there ".to_string())
        );
        assert_eq!(
            InputCommand::parse("//shrug"),
            InputCommand::Submit("/shrug".to_string())
        );
    }

    #[test]
    fn slash_commands_parse_with_arguments() {
        assert_eq!(InputCommand::parse("/retry"), InputCommand::Retry);
        assert_eq!(InputCommand::parse("/up"), InputCommand::ScrollUp(None));
        assert_eq!(InputCommand::parse("/down 4"), InputCommand::ScrollDown(Some(4)));
        assert_eq!(InputCommand::parse(" /bottom "), InputCommand::Bottom);
        assert_eq!(
            InputCommand::parse("/nick  Ada Lovelace "),
            InputCommand::Nick("Ada Lovelace".to_string())
        );
        assert_eq!(InputCommand::parse("/quit"), InputCommand::Quit);
    }

    #[test]
    fn malformed_commands_are_reported() {
        assert!(matches!(InputCommand::parse("/nick"), InputCommand::Invalid(_)));
        assert!(matches!(InputCommand::parse("/up zero"), InputCommand::Invalid(_)));
        assert!(matches!(InputCommand::parse("/up 0"), InputCommand::Invalid(_)));
        assert!(matches!(InputCommand::parse("/dance"), InputCommand::Invalid(_)));
    }
}
