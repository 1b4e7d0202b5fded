// Startup arguments and line commands for the terminal front end. Each line
// command maps to a session intent or a read-only query.

use crate::summary::SummaryLength;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Document to select on startup. More than one is rejected like a multi-file drop.
    pub files: Vec<PathBuf>,
}

pub const HELP: &str = "\
Commands:
  open <path>                    select a .pdf, .png, .jpg or .jpeg file
  length <short|medium|long>     choose the summary length
  submit                         generate the summary
  copy                           copy the summary to the clipboard
  clear                          forget file, summary and error
  status                         show the form again
  health                         ping the summary service
  help                           show this text
  quit                           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Length(SummaryLength),
    Submit,
    Copy,
    Clear,
    Status,
    Health,
    Help,
    Quit,
}

/// `Ok(None)` for blank input.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "open" | "drop" => {
            if rest.is_empty() {
                return Err("Usage: open <path>".to_string());
            }
            Command::Open(unquote(rest).to_string())
        }
        "length" => Command::Length(rest.parse()?),
        "submit" | "generate" => Command::Submit,
        "copy" => Command::Copy,
        "clear" => Command::Clear,
        "status" | "show" => Command::Status,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };

    Ok(Some(command))
}

fn unquote(input: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = input
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    input
}
