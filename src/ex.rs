//! Ex command line parsing and substitution.

use regex::{Regex, RegexBuilder};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    /// `:N`. Zero means the start of the document.
    GotoLine(i64),
    /// `:$`
    DocumentEnd,
    /// `:s/pattern/replacement/[i]`, or a bare `:s` which reuses the last one.
    Substitute(Option<SubstituteArgs>),
    /// `/pattern` or `?pattern`; an empty pattern repeats the last search.
    Search {
        backward: bool,
        pattern: Option<String>,
    },
}

/// The parts of a `:s` command as typed. An empty pattern means "reuse the
/// last pattern".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteArgs {
    pub pattern: String,
    pub replacement: String,
    pub ignore_case: bool,
}

impl ExCommand {
    pub fn parse(text: &str) -> Result<ExCommand, EngineError> {
        let mut chars = text.chars();
        match chars.next() {
            Some(':') => parse_colon(chars.as_str()),
            Some(lead @ ('/' | '?')) => {
                let pattern = chars.as_str();
                Ok(ExCommand::Search {
                    backward: lead == '?',
                    pattern: (!pattern.is_empty()).then(|| pattern.to_string()),
                })
            }
            _ => Err(EngineError::CommandNotRecognised),
        }
    }
}

fn parse_colon(rest: &str) -> Result<ExCommand, EngineError> {
    if let Ok(line) = rest.parse::<i64>() {
        return Ok(ExCommand::GotoLine(line));
    }
    if rest == "$" {
        return Ok(ExCommand::DocumentEnd);
    }
    match rest.strip_prefix('s') {
        Some("") => Ok(ExCommand::Substitute(None)),
        Some(args) => parse_substitute(args).map(|args| ExCommand::Substitute(Some(args))),
        None => Err(EngineError::CommandNotRecognised),
    }
}

/// Parses `<sep>pattern<sep>replacement[<sep>[i]]`. The separator is the
/// first character and may be anything but alphanumeric, space included.
fn parse_substitute(args: &str) -> Result<SubstituteArgs, EngineError> {
    let mut chars = args.chars();
    let sep = chars
        .next()
        .filter(|c| !c.is_alphanumeric())
        .ok_or(EngineError::CommandNotRecognised)?;
    let body = chars.as_str();
    let (pattern, tail) = body
        .split_once(sep)
        .ok_or(EngineError::CommandNotRecognised)?;

    let (replacement, ignore_case) = match tail.rsplit_once(sep) {
        Some((replacement, "")) => (replacement, false),
        Some((replacement, "i")) => (replacement, true),
        // A separator followed by anything else belongs to the replacement.
        _ => (tail, false),
    };

    Ok(SubstituteArgs {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
        ignore_case,
    })
}

/// A complete substitution ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub ignore_case: bool,
}

impl Substitution {
    pub fn regex(&self) -> Result<Regex, EngineError> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.ignore_case)
            .multi_line(true)
            .build()
            .map_err(|e| EngineError::Replacement(e.to_string()))
    }

    /// Replaces every match in `text`.
    pub fn apply(&self, text: &str) -> Result<String, EngineError> {
        let regex = self.regex()?;
        let replacement = translate_replacement(&self.replacement);
        Ok(regex.replace_all(text, replacement.as_str()).into_owned())
    }
}

/// Converts vi replacement syntax to the `regex` crate's: `\N` is group N,
/// `&` is the whole match, `\&` and `\\` are literal, and `$` is escaped.
pub fn translate_replacement(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    chars.next();
                    out.push_str(&format!("${{{d}}}"));
                }
                Some('$') => {
                    chars.next();
                    out.push_str("$$");
                }
                Some(other) => {
                    chars.next();
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            other => out.push(other),
        }
    }
    out
}

/// Compiles a search pattern the way the host will interpret it.
pub fn validate_search(pattern: &str, case_sensitive: bool) -> Result<(), EngineError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map(|_| ())
        .map_err(|e| EngineError::InvalidPattern(e.to_string()))
}
