pub mod bbox;
pub mod decoder;
pub mod detection;
pub mod error;
pub mod frame;
pub mod nms;
pub mod scheduler;
pub mod stats;
pub mod tracker;

mod circular_queue;

pub use bbox::BBox;
pub use decoder::{DecoderConfig, TensorDecoder};
pub use detection::Detection;
pub use error::Error;
pub use frame::{Frame, FrameSource};
pub use scheduler::{
    FrameScheduler, InferenceEngine, PipelineConfig, PipelineContext, SnapshotSink, StopHandle,
};
pub use stats::{CongestionLevel, DirectionCounts, StatsAggregator, StatsConfig, StatsSnapshot};
pub use tracker::{Direction, ObjectTracker, TrackedObject, TrackerConfig};
