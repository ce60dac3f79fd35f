use serde::Serialize;
use crate::models::INITIAL_STAGE;
use crate::workflow::error::{WorkflowError, WorkflowResult};

/// Screen rendered for a sequencer stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScreenId {
    RequirementForm,
    FunctionalAssessment,
    TechnicalReview,
    TenderDrafting,
    RfpReview,
    AuthorityApproval,
    PublishRfp,
    VendorEvaluation,
    PurchaseOrder,
    ContractSigning,
    ProcurementComplete,
}

const SCREENS: [ScreenId; 11] = [
    ScreenId::RequirementForm,
    ScreenId::FunctionalAssessment,
    ScreenId::TechnicalReview,
    ScreenId::TenderDrafting,
    ScreenId::RfpReview,
    ScreenId::AuthorityApproval,
    ScreenId::PublishRfp,
    ScreenId::VendorEvaluation,
    ScreenId::PurchaseOrder,
    ScreenId::ContractSigning,
    ScreenId::ProcurementComplete,
];

impl ScreenId {
    /// Component name, as reported in `current_page_component`
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenId::RequirementForm => "RequirementForm",
            ScreenId::FunctionalAssessment => "FunctionalAssessment",
            ScreenId::TechnicalReview => "TechnicalReview",
            ScreenId::TenderDrafting => "TenderDrafting",
            ScreenId::RfpReview => "RfpReview",
            ScreenId::AuthorityApproval => "AuthorityApproval",
            ScreenId::PublishRfp => "PublishRfp",
            ScreenId::VendorEvaluation => "VendorEvaluation",
            ScreenId::PurchaseOrder => "PurchaseOrder",
            ScreenId::ContractSigning => "ContractSigning",
            ScreenId::ProcurementComplete => "ProcurementComplete",
        }
    }

    /// Stage this screen belongs to
    pub fn stage(&self) -> u8 {
        SCREENS.iter().position(|s| s == self).unwrap_or(0) as u8
    }
}

/// Map a stage to its screen. Total over `0..=10`; anything else is `InvalidStage`.
pub fn resolve_screen(stage: i64) -> WorkflowResult<ScreenId> {
    usize::try_from(stage)
        .ok()
        .and_then(|idx| SCREENS.get(idx).copied())
        .ok_or(WorkflowError::InvalidStage(stage))
}

/// Resolve a screen, falling back to the initial screen on an invalid stage
/// so the caller can never be left without something to render.
pub fn resolve_screen_or_initial(stage: i64) -> ScreenId {
    match resolve_screen(stage) {
        Ok(screen) => screen,
        Err(err) => {
            log::warn!("{}; falling back to the initial screen", err);
            SCREENS[INITIAL_STAGE as usize]
        }
    }
}
