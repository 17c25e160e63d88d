//! Teacher profiles, their pending change requests, and the field-level differ.

pub mod desk;
pub mod differ;
pub mod domain;
pub mod repository;

pub use desk::{PendingProfileChange, ProfileChangeDesk, ProfileReview};
pub use domain::{
    FieldDiff, FieldValue, PendingChanges, ProfileChanges, ProfileDiff, ProfileField,
    ProfileFields, ResubmissionPolicy, ReviewDecision, ReviewMetrics, TeacherId, TeacherProfile,
    MAX_BIO_CHARS, MAX_SUBJECTS,
};
pub use repository::{CommitOutcome, ProfileCommit, ProfileRepository};
