//! Value objects describing a single shell request and its resolution

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    entities::{App, Unit},
    errors::{ShellError, ShellResult},
};

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermSize {
    /// Columns
    pub width: u16,
    /// Rows
    pub height: u16,
}

impl TermSize {
    /// Create a terminal size, rejecting zero dimensions
    pub fn new(width: u16, height: u16) -> ShellResult<Self> {
        if width == 0 || height == 0 {
            return Err(ShellError::InvalidRequest(
                "width and height must be positive integers".to_string(),
            ));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for TermSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A validated request for an interactive shell, built once per connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    /// Target application name
    pub app_name: String,
    /// Explicit unit, or `None` to let the resolver pick one
    pub unit: Option<String>,
    /// Negotiated terminal size
    pub size: TermSize,
    /// Terminal type name, e.g. "xterm"
    pub term: String,
}

impl ShellRequest {
    /// Build a request from raw query values.
    ///
    /// An empty `unit` is the same as an absent one.
    pub fn parse(
        app_name: impl Into<String>,
        width: Option<&str>,
        height: Option<&str>,
        term: Option<&str>,
        unit: Option<&str>,
    ) -> ShellResult<Self> {
        let width = parse_dimension("width", width)?;
        let height = parse_dimension("height", height)?;
        let term = match term.map(str::trim) {
            Some(term) if !term.is_empty() => term.to_string(),
            _ => {
                return Err(ShellError::InvalidRequest(
                    "term parameter is required".to_string(),
                ))
            }
        };
        let unit = unit
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .map(str::to_string);

        Ok(Self {
            app_name: app_name.into(),
            unit,
            size: TermSize::new(width, height)?,
            term,
        })
    }
}

fn parse_dimension(name: &str, raw: Option<&str>) -> ShellResult<u16> {
    let raw = raw.ok_or_else(|| ShellError::InvalidRequest(format!("{name} parameter is required")))?;
    match raw.trim().parse::<u16>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ShellError::InvalidRequest(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}

/// The single unit a session is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Application the session belongs to
    pub app: App,
    /// Chosen unit
    pub unit: Unit,
    /// Whether the caller named the unit explicitly
    pub pinned: bool,
}

/// Everything the unit directory needs to start a shell process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOptions {
    /// Resolved target
    pub target: ResolvedTarget,
    /// Initial terminal size
    pub size: TermSize,
    /// Terminal type name
    pub term: String,
}

impl ShellOptions {
    /// Combine a resolved target with the request's terminal parameters
    pub fn new(target: ResolvedTarget, request: &ShellRequest) -> Self {
        Self {
            target,
            size: request.size,
            term: request.term.clone(),
        }
    }

    /// Id of the unit the shell runs on
    pub fn unit_id(&self) -> &str {
        &self.target.unit.id
    }

    /// Record of this start attempt as seen by the unit directory
    pub fn invocation(&self) -> ShellInvocation {
        ShellInvocation {
            app: self.target.app.name.clone(),
            unit: if self.target.pinned {
                self.target.unit.id.clone()
            } else {
                String::new()
            },
            width: self.size.width,
            height: self.size.height,
            term: self.term.clone(),
        }
    }
}

/// One recorded shell start attempt.
///
/// `unit` holds the unit the caller asked for and stays empty when the
/// resolver picked the unit on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellInvocation {
    /// Application name
    pub app: String,
    /// Requested unit id
    pub unit: String,
    /// Terminal width
    pub width: u16,
    /// Terminal height
    pub height: u16,
    /// Terminal type
    pub term: String,
}
