//! Agent-side use of the intent classifier.
//!
//! The classifier in `intake-core` is pure and total. This crate is the caller
//! that sits in front of the remote intake agent:
//! - `enrichment` builds the classifier from configuration and contains any
//!   failure, so a broken rule table degrades to a tagged fallback result
//!   instead of blocking the request
//! - `metadata` renders a result as read-only context for the agent
//!   invocation and as transport headers
//!
//! The score is a hint for the downstream agent. It never gates whether a
//! message is forwarded.

pub mod enrichment;
pub mod metadata;

pub use enrichment::{Degradation, IntentEnricher, CLASSIFIER_ERROR_PREFIX};
pub use metadata::AgentContext;
