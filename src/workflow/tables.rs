//! Built-in workflow tables.
//!
//! These are the defaults a [`WorkflowConfig`] starts from; an overrides file
//! can replace any section.

use super::config::{ColumnStyle, PersonaLayout, WorkflowConfig};
use crate::model::{BoardView, Persona, Stage, Stage::*};
use std::collections::BTreeMap;

pub fn default_config() -> WorkflowConfig {
    WorkflowConfig {
        advance: advance_table(),
        backtrack: backtrack_table(),
        advance_overrides: BTreeMap::new(),
        backtrack_overrides: BTreeMap::new(),
        layouts: default_layouts(),
        column_styles: column_styles(),
        display_names: display_names(),
    }
}

fn table(rows: &[(Stage, &[Stage])]) -> BTreeMap<Stage, Vec<Stage>> {
    rows.iter()
        .map(|(stage, targets)| (*stage, targets.to_vec()))
        .collect()
}

pub fn advance_table() -> BTreeMap<Stage, Vec<Stage>> {
    table(&[
        (Backlog, &[ScopingInProgress, ReadyForSizing, ReadyForPrioritization]),
        (
            ScopingInProgress,
            &[ClarificationRequested, ReadyForSizing, ReadyForPrioritization],
        ),
        (
            ClarificationRequested,
            &[ProvidingClarification, ReadyForSizing, ReadyForTechReview],
        ),
        (
            ProvidingClarification,
            &[ReadyForSizing, ReadyForPrioritization, ReadyForTechReview],
        ),
        (
            ReadyForSizing,
            &[
                SizingUnderway,
                ReadyForPrioritization,
                ReadyForTechReview,
                ReadyForClientApproval,
            ],
        ),
        (
            SizingUnderway,
            &[
                ReadyForPrioritization,
                ProposalRequested,
                ReadyForTechReview,
                ReadyForClientApproval,
            ],
        ),
        (
            ReadyForPrioritization,
            &[Prioritizing, ReadyForDevelopment, ReadyForTechReview],
        ),
        (
            Prioritizing,
            &[ProposalRequested, ReadyForTechReview, ReadyForDevelopment],
        ),
        (ProposalRequested, &[DraftingProposal]),
        (DraftingProposal, &[ReadyForTechReview, ReadyForPrioritization]),
        (
            ReadyForTechReview,
            &[TechReviewing, ReadyForClientApproval, ReadyForDevelopment],
        ),
        (TechReviewing, &[ReadyForClientApproval, ReadyForDevelopment]),
        (ReadyForClientApproval, &[InClientApproval, ReadyForDevelopment]),
        (InClientApproval, &[ReadyForDevelopment]),
        (ReadyForDevelopment, &[InDevelopment]),
        (
            InDevelopment,
            &[
                DevClarificationRequested,
                DevBlocked,
                ReadyForScratchTest,
                ReadyForQa,
                ReadyForDeployment,
            ],
        ),
        (DevClarificationRequested, &[ProvidingDevClarification]),
        (ProvidingDevClarification, &[BackForDevelopment]),
        (BackForDevelopment, &[InDevelopment]),
        (DevBlocked, &[InDevelopment, ProvidingDevClarification]),
        (
            ReadyForScratchTest,
            &[ScratchTesting, ReadyForQa, ReadyForInternalUat, ReadyForClientUat],
        ),
        (
            ScratchTesting,
            &[
                ReadyForQa,
                ReadyForInternalUat,
                ReadyForClientUat,
                BackForDevelopment,
            ],
        ),
        (ReadyForQa, &[QaInProgress, ReadyForInternalUat, ReadyForClientUat]),
        (
            QaInProgress,
            &[ReadyForInternalUat, ReadyForClientUat, BackForDevelopment],
        ),
        (ReadyForInternalUat, &[InternalUat, ReadyForClientUat]),
        (InternalUat, &[ReadyForClientUat, BackForDevelopment]),
        (
            ReadyForClientUat,
            &[InClientUat, ReadyForUatSignOff, ReadyForMerge, ReadyForDeployment],
        ),
        (
            InClientUat,
            &[
                ReadyForUatSignOff,
                ReadyForMerge,
                ReadyForDeployment,
                BackForDevelopment,
            ],
        ),
        (
            ReadyForUatSignOff,
            &[ProcessingSignOff, ReadyForMerge, ReadyForDeployment],
        ),
        (
            ProcessingSignOff,
            &[ReadyForMerge, ReadyForDeployment, BackForDevelopment],
        ),
        (ReadyForMerge, &[Merging, ReadyForDeployment]),
        (Merging, &[ReadyForDeployment]),
        (ReadyForDeployment, &[Deploying]),
        (Deploying, &[DeployedToProd]),
        (DeployedToProd, &[Done]),
        (Done, &[]),
        (Cancelled, &[Backlog, ReadyForSizing]),
    ])
}

pub fn backtrack_table() -> BTreeMap<Stage, Vec<Stage>> {
    table(&[
        (Backlog, &[Cancelled]),
        (ScopingInProgress, &[Backlog, Cancelled]),
        (ClarificationRequested, &[Backlog, Cancelled]),
        (
            ProvidingClarification,
            &[ClarificationRequested, Backlog, Cancelled],
        ),
        (ReadyForSizing, &[ClarificationRequested, Backlog, Cancelled]),
        (SizingUnderway, &[ReadyForSizing, Backlog, Cancelled]),
        (ReadyForPrioritization, &[ReadyForSizing, Backlog, Cancelled]),
        (Prioritizing, &[ReadyForPrioritization, Cancelled]),
        (
            ProposalRequested,
            &[ReadyForPrioritization, ReadyForSizing, Cancelled],
        ),
        (DraftingProposal, &[ProposalRequested, Cancelled]),
        (
            ReadyForTechReview,
            &[ProposalRequested, ReadyForPrioritization, Cancelled],
        ),
        (TechReviewing, &[ReadyForTechReview, Cancelled]),
        (ReadyForClientApproval, &[ReadyForTechReview, Cancelled]),
        (InClientApproval, &[ReadyForClientApproval, Cancelled]),
        (
            ReadyForDevelopment,
            &[
                InClientApproval,
                ReadyForClientApproval,
                ReadyForTechReview,
                Cancelled,
            ],
        ),
        (InDevelopment, &[ReadyForDevelopment, Cancelled]),
        (DevClarificationRequested, &[InDevelopment, Cancelled]),
        (
            ProvidingDevClarification,
            &[DevClarificationRequested, Cancelled],
        ),
        (
            BackForDevelopment,
            &[DevClarificationRequested, ReadyForDevelopment, Cancelled],
        ),
        (DevBlocked, &[InDevelopment, Cancelled]),
        (ReadyForScratchTest, &[InDevelopment, Cancelled]),
        (
            ScratchTesting,
            &[ReadyForScratchTest, ReadyForDevelopment, Cancelled],
        ),
        (ReadyForQa, &[ReadyForScratchTest, Cancelled]),
        (QaInProgress, &[ReadyForQa, ReadyForScratchTest, Cancelled]),
        (ReadyForInternalUat, &[ReadyForQa, Cancelled]),
        (InternalUat, &[ReadyForInternalUat, ReadyForQa, Cancelled]),
        (
            ReadyForClientUat,
            &[ReadyForInternalUat, ReadyForDevelopment, Cancelled],
        ),
        (
            InClientUat,
            &[ReadyForClientUat, ReadyForInternalUat, Cancelled],
        ),
        (ReadyForUatSignOff, &[InClientUat, Cancelled]),
        (
            ProcessingSignOff,
            &[ReadyForUatSignOff, ReadyForDevelopment, Cancelled],
        ),
        (
            ReadyForMerge,
            &[
                ProcessingSignOff,
                ReadyForClientUat,
                ReadyForDevelopment,
                Cancelled,
            ],
        ),
        (Merging, &[ReadyForMerge, Cancelled]),
        (
            ReadyForDeployment,
            &[ReadyForMerge, ReadyForClientUat, Cancelled],
        ),
        (Deploying, &[ReadyForDeployment, Cancelled]),
        (
            DeployedToProd,
            &[ReadyForDeployment, ReadyForClientUat, Cancelled],
        ),
        (Done, &[DeployedToProd, Cancelled]),
        (Cancelled, &[Backlog, ReadyForSizing, ReadyForDevelopment]),
    ])
}

const QA_STAGES: &[Stage] = &[
    ReadyForScratchTest,
    ScratchTesting,
    ReadyForQa,
    QaInProgress,
    ReadyForInternalUat,
    InternalUat,
];

const UAT_STAGES: &[Stage] = &[
    ReadyForClientUat,
    InClientUat,
    ReadyForUatSignOff,
    ProcessingSignOff,
];

const DEPLOYMENT_STAGES: &[Stage] = &[ReadyForMerge, Merging, ReadyForDeployment, Deploying];

const CLIENT_APPROVAL: &[Stage] = &[ReadyForClientApproval, InClientApproval];
const DEV_CLARIFICATION: &[Stage] = &[DevClarificationRequested, ProvidingDevClarification];
const PRE_DEV_CLARIFICATION: &[Stage] = &[ClarificationRequested, ProvidingClarification];
const END_STATES: &[Stage] = &[Done, Cancelled];

fn layout(
    columns: &[(&str, &[Stage])],
    extended: &[&str],
    views: [(BoardView, &[&str]); 4],
) -> PersonaLayout {
    PersonaLayout {
        columns: columns
            .iter()
            .map(|(key, stages)| (key.to_string(), stages.to_vec()))
            .collect(),
        extended: extended.iter().map(|key| (key.to_string(), true)).collect(),
        views: views
            .iter()
            .map(|(view, keys)| (*view, keys.iter().map(|k| k.to_string()).collect()))
            .collect(),
    }
}

/// A column holding exactly one stage, keyed by that stage's label.
fn single(stage: &'static Stage) -> (&'static str, &'static [Stage]) {
    (stage.label(), std::slice::from_ref(stage))
}

pub fn default_layouts() -> BTreeMap<Persona, PersonaLayout> {
    let mut layouts = BTreeMap::new();
    layouts.insert(Persona::Client, client_layout());
    layouts.insert(Persona::Consultant, consultant_layout());
    layouts.insert(Persona::Developer, developer_layout());
    layouts.insert(Persona::Qa, qa_layout());
    layouts
}

fn client_layout() -> PersonaLayout {
    let all = [
        "Backlog",
        "Scoping",
        "Clarification Requested (Pre-Dev)",
        "Providing Clarification",
        "Estimation",
        "Ready for Prioritization",
        "Prioritizing",
        "Proposal",
        "Dev Approval",
        "Ready for Client Approval",
        "In Client Approval",
        "In Development",
        "QA & Review",
        "Ready for Client UAT",
        "In Client UAT",
        "Deployment Prep",
        "Deployed",
        "Done",
    ];
    layout(
        &[
            ("Backlog", &[Backlog]),
            ("Scoping", &[ScopingInProgress]),
            single(&ClarificationRequested),
            single(&ProvidingClarification),
            ("Estimation", &[ReadyForSizing, SizingUnderway]),
            single(&ReadyForPrioritization),
            single(&Prioritizing),
            ("Proposal", &[ProposalRequested, DraftingProposal]),
            ("Dev Approval", &[ReadyForTechReview, TechReviewing]),
            single(&ReadyForClientApproval),
            single(&InClientApproval),
            (
                "In Development",
                &[
                    ReadyForDevelopment,
                    InDevelopment,
                    BackForDevelopment,
                    DevBlocked,
                    DevClarificationRequested,
                    ProvidingDevClarification,
                ],
            ),
            ("QA & Review", QA_STAGES),
            single(&ReadyForClientUat),
            single(&InClientUat),
            (
                "Deployment Prep",
                &[
                    ReadyForUatSignOff,
                    ProcessingSignOff,
                    ReadyForMerge,
                    Merging,
                    ReadyForDeployment,
                    Deploying,
                ],
            ),
            ("Deployed", &[DeployedToProd]),
            ("Done", END_STATES),
        ],
        &[
            "Proposal",
            "Dev Approval",
            "QA & Review",
            "Deployment Prep",
            "Done",
        ],
        [
            (BoardView::All, &all[..]),
            (BoardView::Predev, &all[..8]),
            (BoardView::Indev, &all[8..13]),
            (BoardView::Deployed, &all[13..]),
        ],
    )
}

fn consultant_layout() -> PersonaLayout {
    let all = [
        "Backlog",
        "Scoping In Progress",
        "Clarification Requested (Pre-Dev)",
        "Providing Clarification",
        "Ready for Sizing",
        "Sizing Underway",
        "Ready for Prioritization",
        "Prioritizing",
        "Proposal Requested",
        "Drafting Proposal",
        "Ready for Tech Review",
        "Tech Reviewing",
        "Client Approval",
        "Dev Queue",
        "Dev Work",
        "Rework",
        "Blocked",
        "Dev Clarification",
        "Ready for Scratch Test",
        "Scratch Testing",
        "Ready for QA",
        "QA In Progress",
        "Ready for Internal UAT",
        "Internal UAT",
        "Client UAT",
        "Ready for UAT Sign-off",
        "Processing Sign-off",
        "Ready for Merge",
        "Merging",
        "Ready for Deployment",
        "Deploying",
        "Deployed",
        "Done",
    ];
    layout(
        &[
            single(&Backlog),
            single(&ScopingInProgress),
            single(&ClarificationRequested),
            single(&ProvidingClarification),
            single(&ReadyForSizing),
            single(&SizingUnderway),
            single(&ReadyForPrioritization),
            single(&Prioritizing),
            single(&ProposalRequested),
            single(&DraftingProposal),
            single(&ReadyForTechReview),
            single(&TechReviewing),
            ("Client Approval", CLIENT_APPROVAL),
            ("Dev Queue", &[ReadyForDevelopment]),
            ("Dev Work", &[InDevelopment]),
            ("Rework", &[BackForDevelopment]),
            ("Blocked", &[DevBlocked]),
            ("Dev Clarification", DEV_CLARIFICATION),
            single(&ReadyForScratchTest),
            single(&ScratchTesting),
            single(&ReadyForQa),
            single(&QaInProgress),
            single(&ReadyForInternalUat),
            single(&InternalUat),
            ("Client UAT", &[ReadyForClientUat, InClientUat]),
            single(&ReadyForUatSignOff),
            single(&ProcessingSignOff),
            single(&ReadyForMerge),
            single(&Merging),
            single(&ReadyForDeployment),
            single(&Deploying),
            ("Deployed", &[DeployedToProd]),
            ("Done", END_STATES),
        ],
        &[
            "Client Approval",
            "Client UAT",
            "Ready for UAT Sign-off",
            "Processing Sign-off",
            "Ready for Merge",
            "Merging",
            "Ready for Deployment",
            "Deploying",
        ],
        [
            (BoardView::All, &all[..]),
            (BoardView::Predev, &all[..10]),
            (BoardView::Indev, &all[10..22]),
            (BoardView::Deployed, &all[22..]),
        ],
    )
}

fn developer_layout() -> PersonaLayout {
    let all = [
        "Backlog",
        "Clarification",
        "Ready for Sizing",
        "Sizing Underway",
        "Prioritization",
        "Proposal Requested",
        "Drafting Proposal",
        "Ready for Tech Review",
        "Tech Reviewing",
        "Client Approval",
        "Dev Queue",
        "Dev Work",
        "Rework",
        "Blocked",
        "Dev Clarification",
        "QA",
        "UAT",
        "Deployment",
        "Deployed",
        "Done",
    ];
    layout(
        &[
            ("Backlog", &[Backlog, ScopingInProgress]),
            ("Clarification", PRE_DEV_CLARIFICATION),
            single(&ReadyForSizing),
            single(&SizingUnderway),
            ("Prioritization", &[ReadyForPrioritization, Prioritizing]),
            single(&ProposalRequested),
            single(&DraftingProposal),
            single(&ReadyForTechReview),
            single(&TechReviewing),
            ("Client Approval", CLIENT_APPROVAL),
            ("Dev Queue", &[ReadyForDevelopment]),
            ("Dev Work", &[InDevelopment]),
            ("Rework", &[BackForDevelopment]),
            ("Blocked", &[DevBlocked]),
            ("Dev Clarification", DEV_CLARIFICATION),
            ("QA", QA_STAGES),
            ("UAT", UAT_STAGES),
            ("Deployment", DEPLOYMENT_STAGES),
            ("Deployed", &[DeployedToProd]),
            ("Done", END_STATES),
        ],
        &[
            "Backlog",
            "Clarification",
            "Prioritization",
            "Client Approval",
            "QA",
            "UAT",
            "Deployment",
            "Deployed",
            "Done",
        ],
        [
            (BoardView::All, &all[..]),
            (BoardView::Predev, &all[..7]),
            (BoardView::Indev, &all[7..15]),
            (BoardView::Deployed, &all[15..]),
        ],
    )
}

fn qa_layout() -> PersonaLayout {
    let all = [
        "Backlog",
        "Clarification",
        "Sizing",
        "Prioritization",
        "Dev Approval",
        "Client Approval",
        "Dev Queue",
        "Dev Work",
        "Ready for Scratch Test",
        "Scratch Testing",
        "Ready for QA",
        "QA In Progress",
        "Ready for Internal UAT",
        "Internal UAT",
        "UAT",
        "Deployment",
        "Deployed",
        "Done",
    ];
    layout(
        &[
            ("Backlog", &[Backlog, ScopingInProgress]),
            ("Clarification", PRE_DEV_CLARIFICATION),
            ("Sizing", &[ReadyForSizing, SizingUnderway]),
            (
                "Prioritization",
                &[
                    ReadyForPrioritization,
                    Prioritizing,
                    ProposalRequested,
                    DraftingProposal,
                ],
            ),
            ("Dev Approval", &[ReadyForTechReview, TechReviewing]),
            ("Client Approval", CLIENT_APPROVAL),
            ("Dev Queue", &[ReadyForDevelopment]),
            (
                "Dev Work",
                &[
                    InDevelopment,
                    BackForDevelopment,
                    DevBlocked,
                    DevClarificationRequested,
                    ProvidingDevClarification,
                ],
            ),
            single(&ReadyForScratchTest),
            single(&ScratchTesting),
            single(&ReadyForQa),
            single(&QaInProgress),
            single(&ReadyForInternalUat),
            single(&InternalUat),
            ("UAT", UAT_STAGES),
            ("Deployment", DEPLOYMENT_STAGES),
            ("Deployed", &[DeployedToProd]),
            ("Done", END_STATES),
        ],
        &[
            "Backlog",
            "Clarification",
            "Sizing",
            "Prioritization",
            "Dev Approval",
            "Client Approval",
            "UAT",
            "Deployment",
            "Deployed",
            "Done",
        ],
        [
            (BoardView::All, &all[..]),
            (BoardView::Predev, &all[..6]),
            (BoardView::Indev, &all[6..12]),
            (BoardView::Deployed, &all[12..]),
        ],
    )
}

/// Header styles keyed by column key or stage label.
pub fn column_styles() -> BTreeMap<String, ColumnStyle> {
    const GROUPS: &[(&[&str], &str, &str)] = &[
        (&["Backlog"], "rgba(243, 244, 246, 0.8)", "#1F2937"),
        (
            &["Scoping", "Scoping In Progress"],
            "rgba(254, 243, 199, 0.5)",
            "#D97706",
        ),
        (
            &[
                "Clarification",
                "Clarification Requested (Pre-Dev)",
                "Providing Clarification",
                "Dev Clarification",
                "Dev Clarification Requested",
                "Providing Dev Clarification",
            ],
            "rgba(254, 226, 226, 0.5)",
            "#DC2626",
        ),
        (
            &["Ready for Sizing", "Ready for Prioritization", "Prioritizing", "Prioritization"],
            "rgba(224, 242, 254, 0.5)",
            "#0284C7",
        ),
        (
            &[
                "Sizing Underway",
                "Estimation",
                "Sizing",
                "Proposal",
                "Proposal Requested",
                "Drafting Proposal",
            ],
            "rgba(255, 237, 213, 0.5)",
            "#EA580C",
        ),
        (
            &[
                "Dev Approval",
                "Ready for Tech Review",
                "Tech Reviewing",
                "Client Approval",
                "Ready for Client Approval",
                "In Client Approval",
            ],
            "rgba(254, 243, 199, 0.5)",
            "#D97706",
        ),
        (
            &["Dev Queue", "Ready for Development"],
            "rgba(220, 252, 231, 0.5)",
            "#16A34A",
        ),
        (
            &["In Development", "Dev Work"],
            "rgba(255, 145, 0, 0.3)",
            "#C2410C",
        ),
        (
            &["Rework", "Back For Development", "Blocked", "Dev Blocked"],
            "rgba(254, 202, 202, 0.6)",
            "#991B1B",
        ),
        (
            &["Ready for Scratch Test", "Ready for QA", "QA"],
            "rgba(219, 234, 254, 0.5)",
            "#1E40AF",
        ),
        (
            &["Scratch Testing", "QA In Progress"],
            "rgba(191, 219, 254, 0.5)",
            "#1D4ED8",
        ),
        (&["QA & Review"], "rgba(219, 234, 254, 0.5)", "#1D4ED8"),
        (
            &[
                "Ready for Internal UAT",
                "Internal UAT",
                "Ready for Client UAT",
                "In Client UAT",
                "Client UAT",
                "UAT",
            ],
            "rgba(191, 219, 254, 0.5)",
            "#2563EB",
        ),
        (
            &["Ready for UAT Sign-off", "Processing Sign-off", "Deployment Prep"],
            "rgba(221, 214, 254, 0.5)",
            "#7C3AED",
        ),
        (
            &[
                "Ready for Merge",
                "Merging",
                "Ready for Deployment",
                "Deploying",
                "Deployment",
            ],
            "rgba(237, 233, 254, 0.5)",
            "#6D28D9",
        ),
        (
            &["Deployed", "Deployed to Prod"],
            "rgba(209, 250, 229, 0.5)",
            "#059669",
        ),
        (&["Done"], "rgba(229, 231, 235, 0.5)", "#374151"),
        (&["Cancelled"], "rgba(229, 231, 235, 0.5)", "#6B7280"),
    ];

    let mut styles = BTreeMap::new();
    for (keys, background, foreground) in GROUPS {
        for key in keys.iter() {
            styles.insert(key.to_string(), ColumnStyle::new(*background, *foreground));
        }
    }
    styles
}

pub fn display_names() -> BTreeMap<String, String> {
    [
        ("Clarification Requested (Pre-Dev)", "Clarification Requested"),
        ("Dev Work", "Active Dev"),
        ("Blocked", "⛔ Blocked"),
        ("Scoping In Progress", "Active Scoping"),
    ]
    .iter()
    .map(|(key, name)| (key.to_string(), name.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stage_has_both_tables() {
        let advance = advance_table();
        let backtrack = backtrack_table();
        for stage in Stage::ALL {
            assert!(advance.contains_key(&stage), "no advance row for {stage}");
            assert!(backtrack.contains_key(&stage), "no backtrack row for {stage}");
        }
    }

    #[test]
    fn test_every_layout_maps_every_stage_once() {
        for (persona, layout) in default_layouts() {
            let mut seen: Vec<Stage> = layout.columns.values().flatten().copied().collect();
            seen.sort();
            let mut expected = Stage::ALL.to_vec();
            expected.sort();
            assert_eq!(seen, expected, "layout for {persona}");
        }
    }

    #[test]
    fn test_views_partition_the_all_view() {
        for (persona, layout) in default_layouts() {
            let all = &layout.views[&BoardView::All];
            let joined: Vec<String> = [BoardView::Predev, BoardView::Indev, BoardView::Deployed]
                .iter()
                .flat_map(|view| layout.views[view].clone())
                .collect();
            assert_eq!(&joined, all, "views for {persona}");
        }
    }

    #[test]
    fn test_client_estimation_column() {
        let layout = client_layout();
        assert_eq!(
            layout.columns["Estimation"],
            vec![ReadyForSizing, SizingUnderway]
        );
        assert!(!layout.extended.contains_key("Estimation"));
        assert!(layout.views[&BoardView::Predev].contains(&"Estimation".to_string()));
    }

    #[test]
    fn test_single_column_helper() {
        assert_eq!(single(&Merging), ("Merging", &[Merging][..]));
    }
}
