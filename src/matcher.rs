//! Path templates and matching.
//!
//! # Responsibilities
//! - Parse a route template into segments
//! - Match a request path against a template, segment by segment
//! - Extract typed variables from matched segments
//!
//! # Template syntax
//!
//! | Segment | Matches | Binds |
//! |---|---|---|
//! | `users` | exactly `users` | none |
//! | `#id` | a finite number (`42`, `-1.5`, `1e3`) | `Arg::Number` |
//! | `$name` | any segment | `Arg::Text` |
//!
//! # Design Decisions
//! - Segment counts must be equal: no wildcards, no catch-alls
//! - A trailing slash is an extra (empty) segment, never stripped here
//! - No regex, matching is a single pass that stops at the first mismatch

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::request::{Arg, Args};

/// One `/`-separated piece of a template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Number(String),
    Text(String),
}

impl Segment {
    fn parse(raw: &str, template: &str) -> Result<Self, Error> {
        let name = || match &raw[1..] {
            "" => Err(invalid(template, "variable segment without a name")),
            name => Ok(name.to_owned()),
        };
        Ok(match raw.as_bytes().first() {
            Some(b'#') => Self::Number(name()?),
            Some(b'$') => Self::Text(name()?),
            _ => Self::Literal(raw.to_owned()),
        })
    }

    fn variable(&self) -> Option<&str> {
        match self {
            Self::Number(name) | Self::Text(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

/// A parsed route template such as `/users/#id/posts/$slug`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template.
    ///
    /// Fails if the template does not start with `/`, if a `#`/`$` segment
    /// has no name, or if a variable name appears twice.
    pub fn parse(source: &str) -> Result<Self, Error> {
        if !source.starts_with('/') {
            return Err(invalid(source, "must start with `/`"));
        }

        let mut segments: Vec<Segment> = Vec::new();
        for raw in split(source) {
            let segment = Segment::parse(raw, source)?;
            if let Some(name) = segment.variable() {
                if segments.iter().any(|s| s.variable() == Some(name)) {
                    return Err(invalid(source, "variable name used twice"));
                }
            }
            segments.push(segment);
        }

        Ok(Self { source: source.to_owned(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches `path` against this template.
    ///
    /// Returns the bound variables on a match, `None` otherwise. Comparison
    /// stops at the first segment that fails.
    pub fn extract(&self, path: &str) -> Option<Args> {
        let actual: Vec<&str> = split(path).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut args = Args::default();
        for (segment, actual) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Number(name) => {
                    let n = parse_number(actual)?;
                    args.bind(name.clone(), Arg::Number(n)).ok()?;
                }
                Segment::Text(name) => {
                    args.bind(name.clone(), Arg::Text(actual.to_owned())).ok()?;
                }
            }
        }
        Some(args)
    }

    /// `true` if `path` has this template's shape.
    pub fn matches(&self, path: &str) -> bool {
        self.extract(path).is_some()
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses `template` and matches `path` against it in one go.
///
/// `Err` means the template itself is invalid; `Ok(None)` means no match.
///
/// ```rust
/// use byway::matcher::compare_and_extract;
///
/// let args = compare_and_extract("/users/#id", "/users/42").unwrap().unwrap();
/// assert_eq!(args.number("id"), Some(42.0));
///
/// assert!(compare_and_extract("/users/#id", "/users/abc").unwrap().is_none());
/// ```
pub fn compare_and_extract(template: &str, path: &str) -> Result<Option<Args>, Error> {
    Ok(Template::parse(template)?.extract(path))
}

/// Splits on `/`, dropping the empty piece produced by a leading slash.
fn split(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Numeric segments accept anything that parses as a finite `f64`.
fn parse_number(segment: &str) -> Option<f64> {
    if segment.is_empty() {
        return None;
    }
    segment.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn invalid(template: &str, reason: &'static str) -> Error {
    Error::InvalidTemplate { template: template.to_owned(), reason }
}
