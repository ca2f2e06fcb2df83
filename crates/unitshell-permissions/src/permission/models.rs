//! Permission data models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unitshell_domain::App;

use crate::error::AuthError;

/// Dotted permission scheme such as `app.run.shell`.
///
/// `*` is the root scheme and covers everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scheme(String);

impl Scheme {
    /// Name of the root scheme
    pub const ROOT: &'static str = "*";
    /// Read-only access to an application
    pub const APP_READ: &'static str = "app.read";
    /// Interactive shell into an application's units
    pub const APP_RUN_SHELL: &'static str = "app.run.shell";

    /// Create a scheme from its dotted name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The root scheme
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Scheme required to open a shell
    pub fn run_shell() -> Self {
        Self::new(Self::APP_RUN_SHELL)
    }

    /// Dotted name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether holding this scheme grants `required`.
    ///
    /// `app` covers `app.run.shell` but not `application.x`.
    pub fn covers(&self, required: &Scheme) -> bool {
        if self.0 == Self::ROOT || self.0 == required.0 {
            return true;
        }
        required
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope a permission applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Context {
    /// Every resource on the platform
    Global,
    /// Resources owned by a team
    Team(String),
    /// A single application
    App(String),
}

impl Context {
    /// Contexts under which a permission applies to `app`
    pub fn for_app(app: &App) -> Vec<Context> {
        vec![
            Context::Global,
            Context::App(app.name.clone()),
            Context::Team(app.team_owner.clone()),
        ]
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Global => write!(f, "global"),
            Context::Team(team) => write!(f, "team:{team}"),
            Context::App(app) => write!(f, "app:{app}"),
        }
    }
}

impl FromStr for Context {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(Context::Global);
        }
        match s.split_once(':') {
            Some(("team", team)) if !team.is_empty() => Ok(Context::Team(team.to_string())),
            Some(("app", app)) if !app.is_empty() => Ok(Context::App(app.to_string())),
            _ => Err(AuthError::InvalidPermission(format!("unknown context {s:?}"))),
        }
    }
}

/// A scheme granted within a context.
///
/// Serialized as `scheme@context`, e.g. `app.run.shell@app:someapp`; a bare
/// scheme means the global context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// Granted scheme
    pub scheme: Scheme,
    /// Where the scheme applies
    pub context: Context,
}

impl Permission {
    /// Create a new permission
    pub fn new(scheme: impl Into<String>, context: Context) -> Self {
        Self {
            scheme: Scheme::new(scheme),
            context,
        }
    }

    /// Check whether this permission grants `required` on any of `contexts`
    pub fn grants(&self, required: &Scheme, contexts: &[Context]) -> bool {
        self.scheme.covers(required) && contexts.contains(&self.context)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.scheme, self.context)
    }
}

impl FromStr for Permission {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, context) = match s.split_once('@') {
            Some((scheme, context)) => (scheme, context.parse()?),
            None => (s, Context::Global),
        };
        if scheme.is_empty() {
            return Err(AuthError::InvalidPermission(format!("empty scheme in {s:?}")));
        }
        Ok(Self::new(scheme, context))
    }
}

impl TryFrom<String> for Permission {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.to_string()
    }
}
