//! Account change requests: legal name changes and claims on teacher profiles.

pub mod desk;
pub mod domain;
pub mod repository;

pub use desk::AccountRequestDesk;
pub use domain::{
    name_script, Account, AccountName, NameChangeForm, NameChangeRequest, NameScript,
    NewNameChange, NewTeacherClaim, RequestId, RequestStatus, RequestVerdict,
    TeacherClaimRequest, MAX_NAME_CHARS, MAX_REASON_CHARS, MIN_NAME_CHARS,
};
pub use repository::AccountRequestRepository;
