//! Coverage selection and claim assembly (pure domain logic).
//!
//! Policies, coverage entries and draft claims, plus the deterministic rules
//! that pick a coverage line for an item and derive a claim's description and
//! value. No IO; collaborators that produce these values live in `veritas-ai`.

pub mod claim;
pub mod coverage;
pub mod policy;

pub use claim::{ClaimStatus, ClaimValuation, DraftClaim, ValuationMethod, claim_description};
pub use coverage::{CoverageSelection, select_coverage};
pub use policy::{AUTO_VERIFY_THRESHOLD, AccountHolder, CoverageEntry, CoverageKind, ParsedPolicy};
