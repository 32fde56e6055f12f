use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// Role of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    User,
    Reseller,
    /// Bring-your-own-contract: the actor brings their own carrier contracts.
    Byoc,
    Admin,
    Superadmin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::User => "user",
            ActorRole::Reseller => "reseller",
            ActorRole::Byoc => "byoc",
            ActorRole::Admin => "admin",
            ActorRole::Superadmin => "superadmin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::Superadmin)
    }

    /// Resellers price shipments against their own lists as well as the platform's.
    pub fn has_reseller_capability(&self) -> bool {
        matches!(self, ActorRole::Reseller)
    }

    /// Roles allowed to create supplier/custom price lists and to sync them.
    pub fn can_manage_price_lists(&self) -> bool {
        !matches!(self, ActorRole::User)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(ActorRole::User),
            "reseller" => Ok(ActorRole::Reseller),
            "byoc" => Ok(ActorRole::Byoc),
            "admin" => Ok(ActorRole::Admin),
            "superadmin" => Ok(ActorRole::Superadmin),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown actor role '{}'",
                other
            )))),
        }
    }
}

/// The caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
    /// Price list assigned to the actor's workspace, highest priority in resolution.
    pub workspace_price_list_id: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
            workspace_price_list_id: None,
        }
    }

    pub fn with_workspace_price_list(mut self, price_list_id: impl Into<String>) -> Self {
        self.workspace_price_list_id = Some(price_list_id.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
