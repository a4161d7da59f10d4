//! Origin-to-role portal mapping.
//!
//! Each portal surface (client, agent, admin) is identified by configured
//! origin substrings. The first entry contained in the request origin wins;
//! an origin matching no entry leaves the portal unresolved.

use crate::config::PortalConfig;
use crate::models::Role;

#[derive(Debug, Clone, Default)]
pub struct PortalMap {
    entries: Vec<(String, Role)>,
}

impl PortalMap {
    pub fn from_config(config: &PortalConfig) -> Self {
        let mut entries = Vec::new();
        for id in &config.client_identifiers {
            entries.push((id.clone(), Role::Client));
        }
        for id in &config.agent_identifiers {
            entries.push((id.clone(), Role::Agent));
        }
        for id in &config.admin_identifiers {
            entries.push((id.clone(), Role::Admin));
        }
        Self { entries }
    }

    /// Role required by the portal serving `origin`, if any entry matches.
    pub fn resolve(&self, origin: &str) -> Option<Role> {
        self.entries
            .iter()
            .find(|(id, _)| origin.contains(id.as_str()))
            .map(|(_, role)| *role)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
