use std::io::{self, IsTerminal, Read};

use crate::error::Error;

/// State of the standard input stream at startup.
pub enum Stdin<R> {
    /// An interactive terminal with nothing piped in.
    Interactive,
    Stream(R),
}

/// Classifies the process' own standard input.
pub fn detect_stdin() -> Stdin<io::Stdin> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        Stdin::Interactive
    } else {
        Stdin::Stream(stdin)
    }
}

/// Where the token text came from once both sources have been looked at.
#[derive(Debug, PartialEq)]
pub enum InputSource {
    None,
    Argument(String),
    Stdin(String),
    Both,
}

impl InputSource {
    /// Only empty values count as unset.
    pub fn classify(stdin: Option<String>, argument: &str) -> Self {
        let stdin = stdin.filter(|content| !content.is_empty());
        let argument = Some(argument).filter(|arg| !arg.is_empty());

        match (stdin, argument) {
            (None, None) => InputSource::None,
            (None, Some(arg)) => InputSource::Argument(arg.to_string()),
            (Some(content), None) => InputSource::Stdin(content),
            (Some(_), Some(_)) => InputSource::Both,
        }
    }

    pub fn into_token(self) -> Result<String, Error> {
        match self {
            InputSource::Argument(token) | InputSource::Stdin(token) => Ok(token),
            InputSource::None => Err(Error::NoInput),
            InputSource::Both => Err(Error::AmbiguousInput),
        }
    }
}

/// Joins the positional arguments the way they are compared against stdin.
pub fn join_args(args: &[String]) -> String {
    args.join(" ").trim().to_string()
}

/// Picks exactly one source of raw token text.
///
/// Stdin content is returned verbatim, invalid UTF-8 is replaced rather than
/// dropped. The argument is expected to be joined and trimmed already, see
/// [`join_args`].
pub fn resolve<R: Read>(stdin: Stdin<R>, argument: &str) -> Result<String, Error> {
    let content = match stdin {
        Stdin::Interactive => None,
        Stdin::Stream(mut reader) => {
            let mut bytes = Vec::new();
            reader
                .read_to_end(&mut bytes)
                .map_err(Error::StdinUnreadable)?;
            tracing::debug!(bytes = bytes.len(), "read token from stdin");
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
    };

    InputSource::classify(content, argument).into_token()
}
