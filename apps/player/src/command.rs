//! Line commands typed at the quiz prompt.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    /// Zero-based question index.
    GoTo(usize),
    /// Zero-based option index within the current question.
    Select(usize),
    Submit,
    Retry,
    Restart,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; type 'help'")]
    Unknown(String),
    #[error("'{0}' needs a question number, e.g. 'go 3'")]
    MissingNumber(&'static str),
    #[error("'{0}' is not a positive number")]
    BadNumber(String),
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "g" | "go" | "goto" => {
            let number = words.next().ok_or(CommandError::MissingNumber("go"))?;
            Command::GoTo(one_based(number)?)
        }
        "s" | "submit" => Command::Submit,
        "r" | "retry" => Command::Retry,
        "restart" => Command::Restart,
        "show" | "l" => Command::Show,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other if other.chars().all(|c| c.is_ascii_digit()) => Command::Select(one_based(other)?),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn one_based(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::BadNumber(raw.to_string())),
    }
}

pub const HELP: &str = "\
commands:
  1-4          choose an option for the current question
  n, next      next question
  p, prev      previous question
  go <n>       jump to question n
  show         redraw the current question
  s, submit    submit your answers
  r, retry     retry after a failed load or submit
  restart      start over after results
  q, quit      leave";
