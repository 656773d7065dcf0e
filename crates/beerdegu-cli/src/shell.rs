//! Line commands typed inside a room.
//!
//! Plain text is a chat line. Everything else starts with `/`:
//!
//! ```text
//! /stage <WAITING|STARTING|IN_PROGRESS|FINISHED>
//! /beers                 refresh the catalog
//! /rate <beer id>        start rating a beer
//! /color|/foam|/smell|/taste|/opinion <text>
//! /note <1-10|->         pick or clear the note
//! /show                  print the room snapshot
//! /help
//! /quit
//! ```

use beerdegu_proto::{BeerId, DraftField, Note, RoomState};
use thiserror::Error;

/// Help text printed by `/help`.
pub const HELP: &str = "\
commands:
  <text>                  send a chat line
  /stage <stage>          move the room (host only)
  /beers                  refresh the catalog
  /rate <beer id>         start rating a beer
  /color /foam /smell /taste /opinion <text>
  /note <1-10|->          pick or clear the note
  /show                   print the room
  /quit                   leave the room";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Post a chat line.
    Say(String),
    /// Move the room to a new stage.
    Stage(RoomState),
    /// Ask for the catalog again.
    Refresh,
    /// Start rating a beer.
    Rate(BeerId),
    /// Edit the active draft.
    Edit(DraftField),
    /// Print the snapshot.
    Show,
    /// Print the command list.
    Help,
    /// Leave the room.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but whitespace.
    #[error("empty line")]
    Empty,

    /// `/` followed by something unknown.
    #[error("unknown command /{0}, try /help")]
    UnknownCommand(String),

    /// Command needs an argument.
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    /// `/rate` argument is not a beer ID.
    #[error("not a beer id: {0}")]
    InvalidBeerId(String),

    /// `/stage` argument is not a stage name.
    #[error("not a room stage: {0}")]
    InvalidStage(String),

    /// `/note` argument is outside 1..=10.
    #[error("note must be 1-10 or -, got {0}")]
    InvalidNote(String),
}

impl ShellCommand {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match name {
            "stage" => {
                let argument = required("stage", argument)?;
                argument
                    .parse()
                    .map(Self::Stage)
                    .map_err(|_| ParseError::InvalidStage(argument.to_string()))
            },
            "beers" => Ok(Self::Refresh),
            "rate" => {
                let argument = required("rate", argument)?;
                argument
                    .parse()
                    .map(Self::Rate)
                    .map_err(|_| ParseError::InvalidBeerId(argument.to_string()))
            },
            "color" => Ok(Self::Edit(DraftField::Color(argument.to_string()))),
            "foam" => Ok(Self::Edit(DraftField::Foam(argument.to_string()))),
            "smell" => Ok(Self::Edit(DraftField::Smell(argument.to_string()))),
            "taste" => Ok(Self::Edit(DraftField::Taste(argument.to_string()))),
            "opinion" => Ok(Self::Edit(DraftField::Opinion(argument.to_string()))),
            "note" => parse_note(required("note", argument)?).map(Self::Edit),
            "show" => Ok(Self::Show),
            "help" => Ok(Self::Help),
            "quit" | "leave" => Ok(Self::Quit),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn required<'a>(command: &'static str, argument: &'a str) -> Result<&'a str, ParseError> {
    if argument.is_empty() { Err(ParseError::MissingArgument(command)) } else { Ok(argument) }
}

fn parse_note(argument: &str) -> Result<DraftField, ParseError> {
    if argument == "-" {
        return Ok(DraftField::Note(None));
    }

    argument
        .parse::<u8>()
        .ok()
        .and_then(|value| Note::new(value).ok())
        .map(|note| DraftField::Note(Some(note)))
        .ok_or_else(|| ParseError::InvalidNote(argument.to_string()))
}
