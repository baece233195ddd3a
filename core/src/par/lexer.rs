//! Line-oriented PAR scanner.
//!
//! - a line starting with a letter opens a system command
//! - a line starting with one space and a letter opens a user command
//! - an include word at the start of a line takes the rest of the line as a path
//! - any other whitespace-led line continues the current command
//! - `#text` opens a string parameter, `#>>text` continues the previous one
//! - anything else (`*`, digits, punctuation) is a comment line

use crate::error::ParError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    System,
    User,
    Include,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Number(f64),
    Text(String),
}

impl Param {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Param::Number(n) => Some(*n),
            Param::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Param::Text(t) => Some(t),
            Param::Number(_) => None,
        }
    }
}

/// One statement: a command name and its raw parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParCommand {
    pub name: String,
    pub kind: CommandKind,
    pub params: Vec<Param>,
    /// 1-based line of the command name
    pub line: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split `src` into commands.
///
/// `include_words` are the command words that take a path argument.
pub fn tokenize(src: &str, include_words: &[&str]) -> Result<Vec<ParCommand>, ParError> {
    let mut commands: Vec<ParCommand> = Vec::new();

    for (index, raw) in src.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');

        let Some(first) = line.chars().next() else {
            continue;
        };

        let (kind, rest) = if first.is_ascii_alphabetic() {
            (Some(CommandKind::System), line)
        } else if let Some(rest) = line.strip_prefix(' ')
            && rest.starts_with(|c: char| c.is_ascii_alphabetic())
        {
            (Some(CommandKind::User), rest)
        } else if first.is_whitespace() || first == '#' {
            (None, line)
        } else {
            continue;
        };

        let rest = match kind {
            Some(kind) => {
                let end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
                let (name, tail) = rest.split_at(end);

                if kind == CommandKind::System && include_words.contains(&name) {
                    let path = tail.trim();
                    if path.is_empty() {
                        return Err(ParError::Syntax {
                            line: line_no,
                            message: format!("{name} needs a file name"),
                        });
                    }
                    commands.push(ParCommand {
                        name: name.to_string(),
                        kind: CommandKind::Include,
                        params: vec![Param::Text(path.to_string())],
                        line: line_no,
                    });
                    continue;
                }

                commands.push(ParCommand {
                    name: name.to_string(),
                    kind,
                    params: Vec::new(),
                    line: line_no,
                });
                tail
            }
            None => rest,
        };

        let Some(current) = commands.last_mut() else {
            if rest.trim().is_empty() {
                continue;
            }
            return Err(ParError::Syntax {
                line: line_no,
                message: "parameters before any command".to_string(),
            });
        };
        scan_params(rest, line_no, &mut current.params)?;
    }

    Ok(commands)
}

fn scan_params(mut rest: &str, line: usize, params: &mut Vec<Param>) -> Result<(), ParError> {
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(());
        }

        if let Some(text) = rest.strip_prefix("#>>") {
            let end = text.find('#').unwrap_or(text.len());
            let piece = text[..end].trim();
            match params.last_mut() {
                Some(Param::Text(s)) => {
                    if !piece.is_empty() {
                        if !s.is_empty() {
                            s.push(' ');
                        }
                        s.push_str(piece);
                    }
                }
                _ => {
                    return Err(ParError::Syntax {
                        line,
                        message: "string continuation without a string".to_string(),
                    });
                }
            }
            rest = &text[end..];
        } else if let Some(text) = rest.strip_prefix('#') {
            let end = text.find('#').unwrap_or(text.len());
            params.push(Param::Text(text[..end].trim().to_string()));
            rest = &text[end..];
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '#')
                .unwrap_or(rest.len());
            let word = &rest[..end];
            match word.parse::<f64>() {
                Ok(n) if n.is_finite() => params.push(Param::Number(n)),
                _ => {
                    return Err(ParError::Syntax {
                        line,
                        message: format!("invalid number '{word}'"),
                    });
                }
            }
            rest = &rest[end..];
        }
    }
}
