//! User profile as seen by notification delivery and billing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact details for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContact {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserContact {
    /// Greeting name: the display name, else the local part of the email.
    pub fn greeting_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("there")
            .to_string()
    }
}
