//! Broadcasting of pipeline events to in-process observers.

pub mod pipeline_events;

pub use pipeline_events::{EventBroadcaster, PipelineEvent, TaskUpdatedEvent};
