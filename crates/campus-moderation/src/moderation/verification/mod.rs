//! Student and teacher verification requests.

pub mod domain;
pub mod repository;
pub mod tracker;

pub use domain::{
    Attachment, AttachmentKind, NewVerification, VerificationDecision, VerificationEvidence,
    VerificationId, VerificationRequest, VerificationStatus, VerificationVerdict,
};
pub use repository::{ProfileVerification, VerificationRepository};
pub use tracker::{VerificationApproval, VerificationTracker};
