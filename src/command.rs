//! Line-oriented command language run by [`Engine::srun`].
//!
//! Each non-blank line holds one command. Lines starting with `#` are
//! comments.
//!
//! ```text
//! get <path>                      print the value of one node
//! set <path> <value>              assign a value
//! clear <path>                    remove a node's value
//! rm <path>                       delete nodes and their subtrees
//! mv <src> <dst>                  move a node (also: move)
//! match <path> [<value>]          list matching nodes
//! ls <path>                       list the children of matching nodes
//! print [<path>]                  print whole subtrees
//! ins <label> before|after <path> add a sibling
//! save                            signal a save
//! quit                            stop
//! ```
//!
//! Arguments are separated by whitespace outside quotes and brackets, so
//! `set /a/b[.='x y'] "some value"` has two arguments.

use thiserror::Error;
use tracing::debug;

use crate::{
    engine::{Engine, STATUS_FAILURE, STATUS_QUIT},
    error::Result,
    output,
};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(String),
    Set(String, String),
    Clear(String),
    Rm(String),
    Move(String, String),
    Match(String, Option<String>),
    Ls(String),
    Print(Option<String>),
    Insert {
        label: String,
        before: bool,
        path: String,
    },
    Save,
    Quit,
}

/// Errors in the command text itself. These only surface as a failure
/// status, never in the engine's error record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' takes {expected} arguments, got {got}")]
    Arity {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("unterminated quote in '{0}'")]
    UnterminatedQuote(String),

    #[error("unbalanced brackets in '{0}'")]
    UnbalancedBrackets(String),

    #[error("expected 'before' or 'after', got '{0}'")]
    InsertPosition(String),
}

/// What running a command did.
enum Flow {
    Continue,
    Quit,
}

/// Split a command line into arguments.
///
/// Whitespace separates arguments except inside brackets or quotes. An
/// argument that starts with a quote is unquoted; quotes inside a path
/// argument are kept.
pub fn split_args(line: &str) -> std::result::Result<Vec<String>, CommandError> {
    let mut args = vec![];
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        let mut arg = String::new();
        if first == '"' || first == '\'' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => arg.push(escaped),
                        None => break,
                    },
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => arg.push(c),
                }
            }
            if !closed {
                return Err(CommandError::UnterminatedQuote(line.to_string()));
            }
        } else {
            let mut depth = 0usize;
            let mut quote = None;
            while let Some(&c) = chars.peek() {
                if quote.is_none() && depth == 0 && c.is_whitespace() {
                    break;
                }
                chars.next();
                arg.push(c);
                match (quote, c) {
                    (Some(q), c) if c == q => quote = None,
                    (Some(_), '\\') => {
                        if let Some(escaped) = chars.next() {
                            arg.push(escaped);
                        }
                    }
                    (Some(_), _) => {}
                    (None, '\\') => {
                        if let Some(escaped) = chars.next() {
                            arg.push(escaped);
                        }
                    }
                    (None, '[') => depth += 1,
                    (None, ']') => {
                        depth = depth
                            .checked_sub(1)
                            .ok_or_else(|| CommandError::UnbalancedBrackets(line.to_string()))?;
                    }
                    (None, '\'' | '"') if depth > 0 => quote = Some(c),
                    (None, _) => {}
                }
            }
            if quote.is_some() {
                return Err(CommandError::UnterminatedQuote(line.to_string()));
            }
            if depth > 0 {
                return Err(CommandError::UnbalancedBrackets(line.to_string()));
            }
        }
        args.push(arg);
    }
    Ok(args)
}

fn arity(command: &'static str, expected: &'static str, got: usize) -> CommandError {
    CommandError::Arity {
        command,
        expected,
        got,
    }
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> std::result::Result<Option<Command>, CommandError> {
    if line.trim_start().starts_with('#') {
        return Ok(None);
    }
    let mut args = split_args(line)?;
    if args.is_empty() {
        return Ok(None);
    }
    let name = args.remove(0);
    let n = args.len();
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or_default();

    let command = match (name.as_str(), n) {
        ("get", 1) => Command::Get(next()),
        ("get", _) => return Err(arity("get", "1", n)),
        ("set", 2) => Command::Set(next(), next()),
        ("set", _) => return Err(arity("set", "2", n)),
        ("clear", 1) => Command::Clear(next()),
        ("clear", _) => return Err(arity("clear", "1", n)),
        ("rm", 1) => Command::Rm(next()),
        ("rm", _) => return Err(arity("rm", "1", n)),
        ("mv" | "move", 2) => Command::Move(next(), next()),
        ("mv" | "move", _) => return Err(arity("mv", "2", n)),
        ("match", 1) => Command::Match(next(), None),
        ("match", 2) => Command::Match(next(), Some(next())),
        ("match", _) => return Err(arity("match", "1 or 2", n)),
        ("ls", 1) => Command::Ls(next()),
        ("ls", _) => return Err(arity("ls", "1", n)),
        ("print", 0) => Command::Print(None),
        ("print", 1) => Command::Print(Some(next())),
        ("print", _) => return Err(arity("print", "0 or 1", n)),
        ("ins" | "insert", 3) => {
            let label = next();
            let before = match next().as_str() {
                "before" => true,
                "after" => false,
                other => return Err(CommandError::InsertPosition(other.to_string())),
            };
            Command::Insert {
                label,
                before,
                path: next(),
            }
        }
        ("ins" | "insert", _) => return Err(arity("ins", "3", n)),
        ("save", 0) => Command::Save,
        ("save", _) => return Err(arity("save", "0", n)),
        ("quit", 0) => Command::Quit,
        ("quit", _) => return Err(arity("quit", "0", n)),
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn execute(engine: &mut Engine, command: &Command, out: &mut String) -> Result<Flow> {
    match command {
        Command::Get(path) => {
            let found = match engine.entries(path)?.as_slice() {
                [] => None,
                _ => Some(engine.get(path)?),
            };
            out.push_str(&output::format_get(path, found.as_ref().map(|v| v.as_deref())));
        }
        Command::Set(path, value) => engine.set(path, Some(value))?,
        Command::Clear(path) => engine.clear(path)?,
        Command::Rm(path) => {
            let removed = engine.remove(path)?;
            out.push_str(&format!("rm : {} {}\n", path, removed));
        }
        Command::Move(src, dst) => engine.move_node(src, dst)?,
        Command::Match(path, value) => {
            let entries: Vec<_> = engine
                .entries(path)?
                .into_iter()
                .filter(|e| value.is_none() || e.value == *value)
                .collect();
            if entries.is_empty() {
                out.push_str("  (no matches)\n");
            }
            for entry in &entries {
                out.push_str(&output::format_match(entry));
            }
        }
        Command::Ls(path) => {
            for entry in &engine.children(path)? {
                out.push_str(&output::format_ls(entry));
            }
        }
        Command::Print(path) => {
            let path = path.as_deref().unwrap_or("/");
            for entry in &engine.subtree(path)? {
                out.push_str(&output::format_print(entry));
            }
        }
        Command::Insert {
            label,
            before,
            path,
        } => engine.insert(path, label, *before)?,
        Command::Save => {
            engine.save()?;
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Run every line of `text` against `engine`.
pub(crate) fn run(engine: &mut Engine, text: &str) -> (i32, String) {
    let mut out = String::new();
    let mut executed = 0;

    for line in text.lines() {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                debug!(error = %err, line, "command rejected");
                return (STATUS_FAILURE, out);
            }
        };

        match execute(engine, &command, &mut out) {
            Ok(Flow::Continue) => executed += 1,
            Ok(Flow::Quit) => return (STATUS_QUIT, out),
            Err(_) => return (STATUS_FAILURE, out),
        }
    }
    (executed, out)
}
