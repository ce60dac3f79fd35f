use serde::Serialize;

/// Stage of the requirement-intake screen (no registry entry)
pub const INITIAL_STAGE: u8 = 0;
/// The approval gate
pub const GATE_STAGE: u8 = 5;
/// Terminal "Procurement Complete" stage
pub const FINAL_STAGE: u8 = 10;

/// Static metadata for one workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub id: u8,
    pub name: &'static str,
    pub department: &'static str,
    pub is_gate: bool,
}

const STAGES: [StageDefinition; 10] = [
    StageDefinition { id: 1, name: "Functional Assessment", department: "Functional Department", is_gate: false },
    StageDefinition { id: 2, name: "Technical Committee Review", department: "Technical Committee", is_gate: false },
    StageDefinition { id: 3, name: "Tender Drafting", department: "Procurement Cell", is_gate: false },
    StageDefinition { id: 4, name: "RFP Review", department: "Legal & Compliance", is_gate: false },
    StageDefinition { id: 5, name: "Authority Approval", department: "Competent Authority", is_gate: true },
    StageDefinition { id: 6, name: "Publish RFP", department: "Procurement Cell", is_gate: false },
    StageDefinition { id: 7, name: "Vendor Bids & Evaluation", department: "Evaluation Committee", is_gate: false },
    StageDefinition { id: 8, name: "Purchase Order", department: "Finance", is_gate: false },
    StageDefinition { id: 9, name: "Contract Signing", department: "Legal & Compliance", is_gate: false },
    StageDefinition { id: 10, name: "Procurement Complete", department: "Procurement Cell", is_gate: false },
];

/// All stages in workflow order
pub fn stages() -> &'static [StageDefinition] {
    &STAGES
}

/// Look up a stage by id
pub fn stage(id: u8) -> Option<&'static StageDefinition> {
    STAGES.iter().find(|s| s.id == id)
}

/// The approval gate stage
pub fn gate() -> &'static StageDefinition {
    &STAGES[(GATE_STAGE - 1) as usize]
}

/// Human-readable label for any sequencer stage, including the intake screen
pub fn stage_label(id: u8) -> &'static str {
    if id == INITIAL_STAGE {
        "Requirement Intake"
    } else {
        stage(id).map(|s| s.name).unwrap_or("Unknown")
    }
}
