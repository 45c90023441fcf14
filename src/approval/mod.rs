//! Approval gate for write actions
//!
//! Writes are confirmed on the terminal unless approval is disabled in the
//! config. Without a terminal the gate reports [`ApprovalStatus::Unavailable`]
//! and the caller turns that into an approval-required envelope.

mod action;

pub use action::{RiskLevel, WriteAction};

use colored::Colorize;
use std::io::{BufRead, IsTerminal, Write};

/// Outcome of asking for approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    /// Go ahead
    Approved,
    /// The user said no
    Denied,
    /// Approval is required but nobody can be asked
    Unavailable,
}

pub struct Approver {
    required: bool,
    interactive: bool,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Approver {
    /// Prompt on stderr, read answers from stdin
    pub fn from_terminal(required: bool) -> Self {
        let stdin = std::io::stdin();
        let interactive = stdin.is_terminal();
        Self {
            required,
            interactive,
            input: Box::new(stdin.lock()),
            output: Box::new(std::io::stderr()),
        }
    }

    /// Approver over arbitrary streams, treated as interactive
    pub fn with_streams(
        required: bool,
        input: impl BufRead + 'static,
        output: impl Write + 'static,
    ) -> Self {
        Self {
            required,
            interactive: true,
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn require(&mut self, action: &WriteAction) -> std::io::Result<ApprovalStatus> {
        if !self.required {
            return Ok(ApprovalStatus::Approved);
        }
        if !self.interactive {
            return Ok(ApprovalStatus::Unavailable);
        }

        let risk = match action.risk() {
            RiskLevel::Write => action.risk().label().yellow(),
            RiskLevel::Dangerous => action.risk().label().red().bold(),
        };
        writeln!(self.output)?;
        writeln!(self.output, "[{}] {}", risk, action.describe())?;
        let payload = serde_json::to_string_pretty(&action.payload()).unwrap_or_default();
        writeln!(self.output, "{}", payload.dimmed())?;
        write!(self.output, "Execute this action? [y/N]: ")?;
        self.output.flush()?;

        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(ApprovalStatus::Denied);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(ApprovalStatus::Approved),
                "" | "n" | "no" => return Ok(ApprovalStatus::Denied),
                _ => {
                    write!(self.output, "Please enter 'y' or 'n': ")?;
                    self.output.flush()?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn action() -> WriteAction {
        WriteAction::ArchiveChannel {
            channel: "C1".into(),
        }
    }

    fn answer(input: &str) -> ApprovalStatus {
        let mut approver = Approver::with_streams(true, Cursor::new(input.to_string()), Vec::new());
        approver.require(&action()).unwrap()
    }

    #[test]
    fn test_not_required_approves() {
        let mut approver = Approver::with_streams(false, Cursor::new(String::new()), Vec::new());
        assert_eq!(approver.require(&action()).unwrap(), ApprovalStatus::Approved);
    }

    #[test]
    fn test_answers() {
        assert_eq!(answer("y\n"), ApprovalStatus::Approved);
        assert_eq!(answer("YES\n"), ApprovalStatus::Approved);
        assert_eq!(answer("n\n"), ApprovalStatus::Denied);
        assert_eq!(answer("\n"), ApprovalStatus::Denied);
        assert_eq!(answer(""), ApprovalStatus::Denied);
    }

    #[test]
    fn test_reprompts_on_garbage() {
        assert_eq!(answer("maybe\nyes\n"), ApprovalStatus::Approved);
        assert_eq!(answer("what\n"), ApprovalStatus::Denied);
    }

    #[test]
    fn test_non_interactive_is_unavailable() {
        let mut approver = Approver {
            required: true,
            interactive: false,
            input: Box::new(Cursor::new(String::new())),
            output: Box::new(Vec::new()),
        };
        assert_eq!(approver.require(&action()).unwrap(), ApprovalStatus::Unavailable);
    }
}
