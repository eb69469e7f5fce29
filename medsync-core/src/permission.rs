//! Calendar permission model.
//!
//! Native calendars grant read and write access separately. The engine only
//! needs to know whether both are granted and whether asking again could help.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    ReadCalendar,
    WriteCalendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeStatus {
    Granted,
    /// Not decided yet; the user can still be asked
    Prompt,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState {
    pub granted: bool,
    pub can_request: bool,
}

impl PermissionState {
    pub fn from_scopes(read: ScopeStatus, write: ScopeStatus) -> Self {
        PermissionState {
            granted: read == ScopeStatus::Granted && write == ScopeStatus::Granted,
            can_request: read == ScopeStatus::Prompt || write == ScopeStatus::Prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ScopeStatus::*;

    #[test]
    fn test_granted_requires_both_scopes() {
        assert!(PermissionState::from_scopes(Granted, Granted).granted);
        assert!(!PermissionState::from_scopes(Granted, Prompt).granted);
        assert!(!PermissionState::from_scopes(Denied, Granted).granted);
    }

    #[test]
    fn test_can_request_if_either_scope_is_promptable() {
        assert!(PermissionState::from_scopes(Prompt, Denied).can_request);
        assert!(PermissionState::from_scopes(Granted, Prompt).can_request);
        assert!(!PermissionState::from_scopes(Denied, Denied).can_request);
        assert!(!PermissionState::from_scopes(Granted, Granted).can_request);
    }
}
