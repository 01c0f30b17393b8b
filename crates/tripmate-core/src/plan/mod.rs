//! Plan-generation workflow tracking.

pub mod source;
pub mod tracker;
pub mod trigger;

pub use source::PlanSource;
pub use tracker::{InboundSignal, PlanWorkflowTracker};
pub use trigger::TriggerMatcher;
