//! Device login policy and atomic admission.

pub mod decision;
pub mod enforcer;
pub mod login;
pub mod outcome;

pub use decision::{Decision, decide};
pub use enforcer::LoginPolicyEnforcer;
pub use login::{IssuedCredential, NewLogin};
pub use outcome::{Admission, AdmissionOutcome, PolicyCheck, RevocationOutcome};
