/// A decoded video frame handed to the pipeline.
///
/// `pixels` is whatever layout the inference engine expects; the pipeline
/// itself only reads the dimensions and the timestamp. `timestamp` is
/// stream time in seconds and drives track staleness, so sources must
/// keep it monotonic.
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: f64, // in seconds
}

impl Frame {
    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pull-based frame supplier for the scheduler. `Ok(None)` signals end of
/// stream and ends the run loop cleanly.
pub trait FrameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}
