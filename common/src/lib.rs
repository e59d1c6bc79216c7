//! Wardrobe Common Library
//!
//! CLIと各フロントエンドで共有される状態機械と型。I/Oは行わない。

pub mod analysis;
pub mod error;
pub mod generation;
pub mod image_file;
pub mod parser;
pub mod preview;
pub mod profile;
pub mod prompts;
pub mod selection;
pub mod slot;
pub mod step;
pub mod types;
pub mod wizard;

pub use analysis::{judge_clothing, judge_face, ClothingReport, FaceReport, Rejection};
pub use error::{Error, Result, ValidationError};
pub use generation::{GenerationRequest, OutfitState, Personalization};
pub use image_file::{single_file, ImageFile, MAX_UPLOAD_BYTES};
pub use parser::{extract_json, parse_clothing_response, parse_face_response};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use profile::{
    check_range, ProfileFields, ProfileUpdate, AGE_RANGE, HEIGHT_RANGE, WEIGHT_RANGE,
};
pub use prompts::{build_clothing_prompt, build_face_prompt, build_outfit_prompt};
pub use selection::SelectionSet;
pub use slot::{AnalysisTicket, DropRejected, SlotState, UploadSlot};
pub use step::{SetupStep, StepSequencer, STEP_ORDER};
pub use types::{
    ClassificationResult, ClothingCategory, ClothingRecord, DressingStyle, FaceQuality,
    FaceVerification, ProfileRecord, SavedItem,
};
pub use wizard::{ClothingSlot, PendingUpload, SetupWizard, SubmissionSnapshot, WizardSlot};
