use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A stage of the delivery lifecycle.
///
/// Variants are declared in lifecycle order, so `Ord` follows the flow from
/// intake to done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Stage {
    // Intake
    #[default]
    #[serde(rename = "Backlog")]
    Backlog,
    #[serde(rename = "Scoping In Progress")]
    ScopingInProgress,

    // Definition and sizing
    #[serde(rename = "Clarification Requested (Pre-Dev)")]
    ClarificationRequested,
    #[serde(rename = "Providing Clarification")]
    ProvidingClarification,
    #[serde(rename = "Ready for Sizing")]
    ReadyForSizing,
    #[serde(rename = "Sizing Underway")]
    SizingUnderway,
    #[serde(rename = "Ready for Prioritization")]
    ReadyForPrioritization,
    #[serde(rename = "Prioritizing")]
    Prioritizing,
    #[serde(rename = "Proposal Requested")]
    ProposalRequested,
    #[serde(rename = "Drafting Proposal")]
    DraftingProposal,

    // Approval
    #[serde(rename = "Ready for Tech Review")]
    ReadyForTechReview,
    #[serde(rename = "Tech Reviewing")]
    TechReviewing,
    #[serde(rename = "Ready for Client Approval")]
    ReadyForClientApproval,
    #[serde(rename = "In Client Approval")]
    InClientApproval,

    // Development
    #[serde(rename = "Ready for Development")]
    ReadyForDevelopment,
    #[serde(rename = "In Development")]
    InDevelopment,
    #[serde(rename = "Dev Clarification Requested")]
    DevClarificationRequested,
    #[serde(rename = "Providing Dev Clarification")]
    ProvidingDevClarification,
    #[serde(rename = "Back For Development")]
    BackForDevelopment,
    #[serde(rename = "Dev Blocked")]
    DevBlocked,

    // Testing
    #[serde(rename = "Ready for Scratch Test")]
    ReadyForScratchTest,
    #[serde(rename = "Scratch Testing")]
    ScratchTesting,
    #[serde(rename = "Ready for QA")]
    ReadyForQa,
    #[serde(rename = "QA In Progress")]
    QaInProgress,
    #[serde(rename = "Ready for Internal UAT")]
    ReadyForInternalUat,
    #[serde(rename = "Internal UAT")]
    InternalUat,

    // Client UAT
    #[serde(rename = "Ready for Client UAT")]
    ReadyForClientUat,
    #[serde(rename = "In Client UAT")]
    InClientUat,
    #[serde(rename = "Ready for UAT Sign-off")]
    ReadyForUatSignOff,
    #[serde(rename = "Processing Sign-off")]
    ProcessingSignOff,

    // Deployment
    #[serde(rename = "Ready for Merge")]
    ReadyForMerge,
    #[serde(rename = "Merging")]
    Merging,
    #[serde(rename = "Ready for Deployment")]
    ReadyForDeployment,
    #[serde(rename = "Deploying")]
    Deploying,
    #[serde(rename = "Deployed to Prod")]
    DeployedToProd,

    // End states
    #[serde(rename = "Done")]
    Done,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl Stage {
    pub const ALL: [Stage; 37] = [
        Stage::Backlog,
        Stage::ScopingInProgress,
        Stage::ClarificationRequested,
        Stage::ProvidingClarification,
        Stage::ReadyForSizing,
        Stage::SizingUnderway,
        Stage::ReadyForPrioritization,
        Stage::Prioritizing,
        Stage::ProposalRequested,
        Stage::DraftingProposal,
        Stage::ReadyForTechReview,
        Stage::TechReviewing,
        Stage::ReadyForClientApproval,
        Stage::InClientApproval,
        Stage::ReadyForDevelopment,
        Stage::InDevelopment,
        Stage::DevClarificationRequested,
        Stage::ProvidingDevClarification,
        Stage::BackForDevelopment,
        Stage::DevBlocked,
        Stage::ReadyForScratchTest,
        Stage::ScratchTesting,
        Stage::ReadyForQa,
        Stage::QaInProgress,
        Stage::ReadyForInternalUat,
        Stage::InternalUat,
        Stage::ReadyForClientUat,
        Stage::InClientUat,
        Stage::ReadyForUatSignOff,
        Stage::ProcessingSignOff,
        Stage::ReadyForMerge,
        Stage::Merging,
        Stage::ReadyForDeployment,
        Stage::Deploying,
        Stage::DeployedToProd,
        Stage::Done,
        Stage::Cancelled,
    ];

    /// The label stored on ticket records.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Backlog => "Backlog",
            Stage::ScopingInProgress => "Scoping In Progress",
            Stage::ClarificationRequested => "Clarification Requested (Pre-Dev)",
            Stage::ProvidingClarification => "Providing Clarification",
            Stage::ReadyForSizing => "Ready for Sizing",
            Stage::SizingUnderway => "Sizing Underway",
            Stage::ReadyForPrioritization => "Ready for Prioritization",
            Stage::Prioritizing => "Prioritizing",
            Stage::ProposalRequested => "Proposal Requested",
            Stage::DraftingProposal => "Drafting Proposal",
            Stage::ReadyForTechReview => "Ready for Tech Review",
            Stage::TechReviewing => "Tech Reviewing",
            Stage::ReadyForClientApproval => "Ready for Client Approval",
            Stage::InClientApproval => "In Client Approval",
            Stage::ReadyForDevelopment => "Ready for Development",
            Stage::InDevelopment => "In Development",
            Stage::DevClarificationRequested => "Dev Clarification Requested",
            Stage::ProvidingDevClarification => "Providing Dev Clarification",
            Stage::BackForDevelopment => "Back For Development",
            Stage::DevBlocked => "Dev Blocked",
            Stage::ReadyForScratchTest => "Ready for Scratch Test",
            Stage::ScratchTesting => "Scratch Testing",
            Stage::ReadyForQa => "Ready for QA",
            Stage::QaInProgress => "QA In Progress",
            Stage::ReadyForInternalUat => "Ready for Internal UAT",
            Stage::InternalUat => "Internal UAT",
            Stage::ReadyForClientUat => "Ready for Client UAT",
            Stage::InClientUat => "In Client UAT",
            Stage::ReadyForUatSignOff => "Ready for UAT Sign-off",
            Stage::ProcessingSignOff => "Processing Sign-off",
            Stage::ReadyForMerge => "Ready for Merge",
            Stage::Merging => "Merging",
            Stage::ReadyForDeployment => "Ready for Deployment",
            Stage::Deploying => "Deploying",
            Stage::DeployedToProd => "Deployed to Prod",
            Stage::Done => "Done",
            Stage::Cancelled => "Cancelled",
        }
    }

    /// Who is expected to act on a ticket sitting in this stage.
    pub fn owner(&self) -> StageOwner {
        use super::Persona;
        match self {
            Stage::Backlog | Stage::ScopingInProgress => StageOwner::Persona(Persona::Consultant),
            Stage::ClarificationRequested | Stage::ProvidingClarification => {
                StageOwner::Persona(Persona::Client)
            }
            Stage::ReadyForSizing | Stage::SizingUnderway => StageOwner::Persona(Persona::Developer),
            Stage::ReadyForPrioritization | Stage::Prioritizing => {
                StageOwner::Persona(Persona::Client)
            }
            Stage::ProposalRequested | Stage::DraftingProposal => {
                StageOwner::Persona(Persona::Developer)
            }
            Stage::ReadyForTechReview | Stage::TechReviewing => {
                StageOwner::Persona(Persona::Consultant)
            }
            Stage::ReadyForClientApproval | Stage::InClientApproval => {
                StageOwner::Persona(Persona::Client)
            }
            Stage::ReadyForDevelopment | Stage::InDevelopment => {
                StageOwner::Persona(Persona::Developer)
            }
            Stage::DevClarificationRequested | Stage::ProvidingDevClarification => {
                StageOwner::Persona(Persona::Client)
            }
            Stage::BackForDevelopment | Stage::DevBlocked => StageOwner::Persona(Persona::Developer),
            Stage::ReadyForScratchTest
            | Stage::ScratchTesting
            | Stage::ReadyForQa
            | Stage::QaInProgress => StageOwner::Persona(Persona::Qa),
            Stage::ReadyForInternalUat | Stage::InternalUat => {
                StageOwner::Persona(Persona::Consultant)
            }
            Stage::ReadyForClientUat
            | Stage::InClientUat
            | Stage::ReadyForUatSignOff
            | Stage::ProcessingSignOff => StageOwner::Persona(Persona::Client),
            Stage::ReadyForMerge
            | Stage::Merging
            | Stage::ReadyForDeployment
            | Stage::Deploying => StageOwner::Persona(Persona::Consultant),
            Stage::DeployedToProd => StageOwner::System,
            Stage::Done | Stage::Cancelled => StageOwner::All,
        }
    }

    /// Card accent color: queues are light, work is saturated, holds are red.
    pub fn color(&self) -> &'static str {
        match self {
            Stage::Backlog => "#F3F4F6",
            Stage::ScopingInProgress => "#FEF3C7",
            Stage::ClarificationRequested => "#E0F2FE",
            Stage::ProvidingClarification => "#DBEAFE",
            Stage::ReadyForSizing => "#E0F2FE",
            Stage::SizingUnderway => "#FFEDD5",
            Stage::ReadyForPrioritization => "#E0F2FE",
            Stage::Prioritizing => "#DBEAFE",
            Stage::ProposalRequested => "#E0F2FE",
            Stage::DraftingProposal => "#FFEDD5",
            Stage::ReadyForTechReview => "#E0F2FE",
            Stage::TechReviewing => "#FEF3C7",
            Stage::ReadyForClientApproval => "#E0F2FE",
            Stage::InClientApproval => "#DBEAFE",
            Stage::ReadyForDevelopment => "#DCFCE7",
            Stage::InDevelopment => "#FF9100",
            Stage::DevClarificationRequested => "#FEE2E2",
            Stage::ProvidingDevClarification => "#DBEAFE",
            Stage::BackForDevelopment | Stage::DevBlocked => "#EF4444",
            Stage::ReadyForScratchTest => "#E0F2FE",
            Stage::ScratchTesting => "#22C55E",
            Stage::ReadyForQa => "#E0F2FE",
            Stage::QaInProgress => "#22C55E",
            Stage::ReadyForInternalUat => "#E0F2FE",
            Stage::InternalUat => "#1D4ED8",
            Stage::ReadyForClientUat => "#E0F2FE",
            Stage::InClientUat => "#2563EB",
            Stage::ReadyForUatSignOff => "#E0F2FE",
            Stage::ProcessingSignOff => "#DBEAFE",
            Stage::ReadyForMerge => "#F3E8FF",
            Stage::Merging => "#7C3AED",
            Stage::ReadyForDeployment => "#F3E8FF",
            Stage::Deploying => "#7C3AED",
            Stage::DeployedToProd => "#059669",
            Stage::Done => "#374151",
            Stage::Cancelled => "#9CA3AF",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Cancelled)
    }

    /// Stages that no longer consume development capacity.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Stage::DeployedToProd | Stage::Done | Stage::Cancelled)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Stage {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Stage::ALL
            .iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| BoardError::Parse(format!("Invalid stage: {}", s)))
    }
}

/// Owner of a stage: a persona, the system itself, or everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageOwner {
    Persona(super::Persona),
    System,
    All,
}

impl StageOwner {
    pub fn color(&self) -> &'static str {
        use super::Persona;
        match self {
            StageOwner::Persona(Persona::Client) => "#2196F3",
            StageOwner::Persona(Persona::Consultant) => "#FFD600",
            StageOwner::Persona(Persona::Developer) => "#FF9100",
            StageOwner::Persona(Persona::Qa) => "#00C853",
            StageOwner::System => "#9E9E9E",
            StageOwner::All => DEFAULT_OWNER_COLOR,
        }
    }
}

pub const DEFAULT_OWNER_COLOR: &str = "#BDBDBD";

impl fmt::Display for StageOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOwner::Persona(p) => write!(f, "{}", p),
            StageOwner::System => write!(f, "System"),
            StageOwner::All => write!(f, "All"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for stage in Stage::ALL {
            assert_eq!(stage.label().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive_and_trims() {
        assert_eq!(" ready for qa ".parse::<Stage>().unwrap(), Stage::ReadyForQa);
        assert_eq!("DONE".parse::<Stage>().unwrap(), Stage::Done);
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        assert!("Active Scoping".parse::<Stage>().is_err());
        assert!("".parse::<Stage>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Stage::ReadyForUatSignOff).unwrap();
        assert_eq!(json, "\"Ready for UAT Sign-off\"");
        let stage: Stage = serde_json::from_str("\"Clarification Requested (Pre-Dev)\"").unwrap();
        assert_eq!(stage, Stage::ClarificationRequested);
    }

    #[test]
    fn test_all_is_in_lifecycle_order() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
        assert_eq!(Stage::ALL.first(), Some(&Stage::Backlog));
        assert_eq!(Stage::ALL.last(), Some(&Stage::Cancelled));
    }

    #[test]
    fn test_owners() {
        assert_eq!(Stage::DeployedToProd.owner(), StageOwner::System);
        assert_eq!(Stage::Done.owner(), StageOwner::All);
        assert_eq!(
            Stage::ScratchTesting.owner(),
            StageOwner::Persona(crate::model::Persona::Qa)
        );
    }
}
