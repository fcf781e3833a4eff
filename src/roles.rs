//! Role capability table. The HTTP layer consults this before mutating
//! clinical data; the scheduling core never sees roles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Doctor,
    Nurse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManagePatients,
    ManageMedications,
    Prescribe,
    RecordAdministration,
    ManageAlerts,
    ManageUsers,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(Role::Administrator),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            _ => None,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match (self, action) {
            (Role::Administrator, _) => true,
            (_, Action::ManageUsers) => false,
            (Role::Doctor, Action::Prescribe) => true,
            (Role::Nurse, Action::Prescribe) => false,
            (Role::Nurse, Action::RecordAdministration) => true,
            (Role::Doctor, Action::RecordAdministration) => false,
            // shared clinical actions
            (_, Action::ManagePatients | Action::ManageMedications | Action::ManageAlerts) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrator_allows_everything() {
        for action in [
            Action::ManagePatients,
            Action::ManageMedications,
            Action::Prescribe,
            Action::RecordAdministration,
            Action::ManageAlerts,
            Action::ManageUsers,
        ] {
            assert!(Role::Administrator.allows(action));
        }
    }

    #[test]
    fn test_only_administrators_manage_users() {
        assert!(!Role::Doctor.allows(Action::ManageUsers));
        assert!(!Role::Nurse.allows(Action::ManageUsers));
    }

    #[test]
    fn test_prescribing_is_doctor_only_among_clinicians() {
        assert!(Role::Doctor.allows(Action::Prescribe));
        assert!(!Role::Nurse.allows(Action::Prescribe));
    }

    #[test]
    fn test_administration_recording_is_nurse_side() {
        assert!(Role::Nurse.allows(Action::RecordAdministration));
        assert!(!Role::Doctor.allows(Action::RecordAdministration));
    }

    #[test]
    fn test_shared_clinical_actions() {
        for role in [Role::Doctor, Role::Nurse] {
            assert!(role.allows(Action::ManagePatients));
            assert!(role.allows(Action::ManageMedications));
            assert!(role.allows(Action::ManageAlerts));
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Administrator, Role::Doctor, Role::Nurse] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("janitor"), None);
    }
}
