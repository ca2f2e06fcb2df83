//! Applications and the units that run them

use serde::{Deserialize, Serialize};

/// An application registered on the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Unique application name
    pub name: String,
    /// Team owning the application
    pub team_owner: String,
}

impl App {
    /// Create a new application reference
    pub fn new(name: impl Into<String>, team_owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team_owner: team_owner.into(),
        }
    }
}

/// Unit lifecycle status as reported by the unit directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Unit is being provisioned
    Building,
    /// Unit is started and serving
    Started,
    /// Unit is stopped
    Stopped,
    /// Unit failed to start or crashed
    Error,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitStatus::Building => write!(f, "building"),
            UnitStatus::Started => write!(f, "started"),
            UnitStatus::Stopped => write!(f, "stopped"),
            UnitStatus::Error => write!(f, "error"),
        }
    }
}

/// One running instance of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit identifier, unique across the platform
    pub id: String,
    /// Name of the application the unit belongs to
    pub app_name: String,
    /// Process type the unit runs (e.g. "web")
    pub process_name: String,
    /// Current status
    pub status: UnitStatus,
}

impl Unit {
    /// Create a started unit
    pub fn new(
        id: impl Into<String>,
        app_name: impl Into<String>,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.into(),
            process_name: process_name.into(),
            status: UnitStatus::Started,
        }
    }

    /// Check whether the unit belongs to the given application
    pub fn belongs_to(&self, app: &App) -> bool {
        self.app_name == app.name
    }
}
