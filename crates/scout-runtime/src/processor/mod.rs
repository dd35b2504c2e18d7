//! Signal-to-message translation: step tracking and the event processor.

pub mod event_processor;
pub mod step_tracker;

pub use event_processor::EventProcessor;
pub use step_tracker::StepTracker;
