use crate::{proto, util};
use prost::Message;

/// A timestamped, optionally step-numbered summary.
///
/// An [`Event`] is created for each value handed to a writer, serialized once and
/// then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Seconds since epoch with microsecond precision.
    pub wall_time: f64,

    /// Global step. Negative steps are treated as absent.
    pub step: Option<i64>,

    /// Payload of the event.
    pub summary: proto::Summary,
}

impl Event {
    /// Creates an event stamped with the current wall-clock time.
    pub fn new(summary: proto::Summary, step: Option<i64>) -> Self {
        Self {
            wall_time: util::timestamp(),
            step: step.filter(|s| *s >= 0),
            summary,
        }
    }

    /// Creates an event from a step where a negative value means "no step".
    pub fn with_step(summary: proto::Summary, step: i64) -> Self {
        Self::new(summary, Some(step))
    }

    /// Converts the event into its schema message.
    pub fn to_proto(&self) -> proto::Event {
        proto::Event {
            wall_time: self.wall_time,
            step: self.step.unwrap_or_default(),
            what: Some(proto::event::What::Summary(self.summary.clone())),
        }
    }

    /// Serializes the event.
    pub fn encode(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }
}

/// Serializes the event which starts every new event file.
pub(crate) fn file_version_event(version: &str) -> Vec<u8> {
    proto::Event {
        wall_time: util::timestamp(),
        step: 0,
        what: Some(proto::event::What::FileVersion(version.to_string())),
    }
    .encode_to_vec()
}
