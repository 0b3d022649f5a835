use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::ArrayD;
use tracing::{debug, warn};

use crate::decoder::{DecoderConfig, TensorDecoder};
use crate::error::Error;
use crate::frame::{Frame, FrameSource};
use crate::nms;
use crate::stats::{StatsAggregator, StatsConfig, StatsSnapshot};
use crate::tracker::{ObjectTracker, TrackedObject, TrackerConfig};

/// The opaque model call. Preprocessing (normalization, channel order,
/// resize) is the engine's contract; the scheduler passes the frame
/// through untouched and decodes whatever tensor comes back.
pub trait InferenceEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    fn infer(&mut self, frame: &Frame) -> Result<ArrayD<f32>, Self::Error>;
}

/// Receives each processed frame's results. Called on the pipeline thread,
/// so it must not block.
pub trait SnapshotSink {
    fn publish(&mut self, snapshot: &StatsSnapshot, objects: &[TrackedObject]);
}

impl<F> SnapshotSink for F
where
    F: FnMut(&StatsSnapshot, &[TrackedObject]),
{
    fn publish(&mut self, snapshot: &StatsSnapshot, objects: &[TrackedObject]) {
        self(snapshot, objects)
    }
}

/// The caller-owned ends of the pipeline.
pub struct PipelineContext<S, P> {
    pub source: S,
    pub sink: P,
}

pub struct PipelineConfig {
    pub decoder: DecoderConfig,
    pub iou_threshold: f32,
    pub tracker: TrackerConfig,
    pub stats: StatsConfig,
    /// Process one frame out of every `skip_interval`; values of 0 and 1
    /// both mean every frame.
    pub skip_interval: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            iou_threshold: 0.45,
            tracker: TrackerConfig::default(),
            stats: StatsConfig::default(),
            skip_interval: 1,
        }
    }
}

/// Cooperative stop flag for a running scheduler. Cloneable across
/// threads; `stop` is idempotent and takes effect at the next cycle
/// boundary, never mid-frame.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives the per-frame cycle: acquire, infer, decode, suppress, track,
/// aggregate, publish.
///
/// Any failure while handling one frame is logged and absorbed so a
/// transient glitch never takes the loop down. Skipped cycles leave the
/// cached last result readable through `last_snapshot`/`last_objects` for
/// consumers that render every frame.
pub struct FrameScheduler<S, P, E> {
    context: PipelineContext<S, P>,
    engine: E,
    decoder: TensorDecoder,
    tracker: ObjectTracker,
    aggregator: StatsAggregator,
    iou_threshold: f32,
    skip_interval: u32,
    skip_counter: u32,
    stop: Arc<AtomicBool>,
    last_snapshot: Option<StatsSnapshot>,
    last_objects: Vec<TrackedObject>,
}

impl<S, P, E> FrameScheduler<S, P, E>
where
    S: FrameSource,
    P: SnapshotSink,
    E: InferenceEngine,
{
    pub fn new(context: PipelineContext<S, P>, engine: E, config: PipelineConfig) -> Self {
        Self {
            context,
            engine,
            decoder: TensorDecoder::new(config.decoder),
            tracker: ObjectTracker::new(config.tracker),
            aggregator: StatsAggregator::new(config.stats),
            iou_threshold: config.iou_threshold,
            skip_interval: config.skip_interval,
            skip_counter: 0,
            stop: Arc::new(AtomicBool::new(false)),
            last_snapshot: None,
            last_objects: Vec::new(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop.clone())
    }

    #[inline]
    pub fn context(&self) -> &PipelineContext<S, P> {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut PipelineContext<S, P> {
        &mut self.context
    }

    /// Result of the most recently processed frame, if any. Stays put
    /// through skipped cycles.
    #[inline]
    pub fn last_snapshot(&self) -> Option<&StatsSnapshot> {
        self.last_snapshot.as_ref()
    }

    #[inline]
    pub fn last_objects(&self) -> &[TrackedObject] {
        &self.last_objects
    }

    /// Runs until the source drains or the stop handle fires.
    pub fn run(&mut self) {
        while !self.stop.load(Ordering::Relaxed) {
            let frame = match self.context.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("frame source drained, stopping");
                    break;
                }
                Err(err) => {
                    let err = Error::Source(Box::new(err));
                    warn!(error = %err, "failed to acquire frame, continuing");
                    continue;
                }
            };

            if !self.should_process() {
                continue;
            }

            if let Err(err) = self.process_frame(&frame) {
                warn!(error = %err, "frame dropped, continuing");
            }
        }
    }

    fn should_process(&mut self) -> bool {
        self.skip_counter += 1;
        if self.skip_counter < self.skip_interval {
            return false;
        }

        self.skip_counter = 0;
        true
    }

    /// One full pipeline pass over a frame. `run` calls this for every
    /// non-skipped frame; tests and callers stepping manually may drive it
    /// directly.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        let tensor = self
            .engine
            .infer(frame)
            .map_err(|err| Error::Inference(Box::new(err)))?;

        let (frame_width, frame_height) = frame.dims();
        // a rejected tensor downgrades to an empty frame: tracks still age
        // and a zero-count snapshot still goes out
        let candidates = match self.decoder.decode(tensor.view(), frame_width, frame_height) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "tensor rejected, treating frame as empty");
                Vec::new()
            }
        };
        let detections = nms::suppress(candidates, self.iou_threshold);
        let objects = self.tracker.update(&detections, frame.timestamp);
        let snapshot = self
            .aggregator
            .aggregate(&objects, &detections, frame_width, frame_height);

        debug!(
            people = snapshot.people_count,
            tracks = objects.len(),
            "frame processed"
        );

        self.context.sink.publish(&snapshot, &objects);

        self.last_snapshot = Some(snapshot);
        self.last_objects = objects;

        Ok(())
    }
}
