//! Desk Input
//!
//! One line typed at the desk prompt, parsed into the action it asks for.

use std::str::FromStr;

use super::filter::CheckInFilter;

/// What a line of desk input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskCommand {
    Quit,
    /// Enter on an empty line: check in the single visible match
    QuickCommit,
    Refresh,
    Filter(CheckInFilter),
    CheckIn(u64),
    Undo(u64),
    Search(String),
}

impl FromStr for DeskCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        match input {
            "/q" => Ok(DeskCommand::Quit),
            "" => Ok(DeskCommand::QuickCommit),
            "r" => Ok(DeskCommand::Refresh),
            _ => {
                if let Some(name) = input.strip_prefix('/') {
                    name.parse().map(DeskCommand::Filter)
                } else if let Some(id) = input.strip_prefix('+') {
                    golfer_id(id).map(DeskCommand::CheckIn)
                } else if let Some(id) = input.strip_prefix('!') {
                    golfer_id(id).map(DeskCommand::Undo)
                } else {
                    Ok(DeskCommand::Search(input.to_string()))
                }
            }
        }
    }
}

fn golfer_id(s: &str) -> Result<u64, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("Expected a golfer id, got {:?}", s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<DeskCommand, String> {
        s.parse()
    }

    #[test]
    fn test_control_lines() {
        assert_eq!(parse("/q"), Ok(DeskCommand::Quit));
        assert_eq!(parse(""), Ok(DeskCommand::QuickCommit));
        assert_eq!(parse("   "), Ok(DeskCommand::QuickCommit));
        assert_eq!(parse("r"), Ok(DeskCommand::Refresh));
    }

    #[test]
    fn test_filters_and_aliases() {
        assert_eq!(parse("/all"), Ok(DeskCommand::Filter(CheckInFilter::All)));
        assert_eq!(
            parse("/pending"),
            Ok(DeskCommand::Filter(CheckInFilter::NotCheckedIn))
        );
        assert_eq!(parse("/DONE"), Ok(DeskCommand::Filter(CheckInFilter::CheckedIn)));
        assert!(parse("/later").unwrap_err().contains("Unknown filter"));
    }

    #[test]
    fn test_golfer_actions() {
        assert_eq!(parse("+12"), Ok(DeskCommand::CheckIn(12)));
        assert_eq!(parse(" + 7 "), Ok(DeskCommand::CheckIn(7)));
        assert_eq!(parse("!3"), Ok(DeskCommand::Undo(3)));
        assert!(parse("+abc").is_err());
        assert!(parse("!").is_err());
        assert!(parse("+-1").is_err());
    }

    #[test]
    fn test_anything_else_is_a_search() {
        assert_eq!(parse("smith"), Ok(DeskCommand::Search("smith".into())));
        assert_eq!(
            parse("  ann@club.org "),
            Ok(DeskCommand::Search("ann@club.org".into()))
        );
        // Only the bare letter refreshes
        assert_eq!(parse("ro"), Ok(DeskCommand::Search("ro".into())));
    }
}
