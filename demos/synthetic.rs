//! Synthetic people-counting demo: a handful of scripted walkers cross a
//! 640x480 scene, the fake detector hands their boxes to the pipeline, and
//! each processed frame prints one JSON line. Ctrl-c stops the loop.

use std::convert::Infallible;
use std::thread;
use std::time::Duration;

use ndarray::{Array3, ArrayD};

use crowdmeter::{
    DecoderConfig, Frame, FrameScheduler, FrameSource, InferenceEngine, PipelineConfig,
    PipelineContext, StatsSnapshot, TrackedObject,
};

const SCENE_WIDTH: f32 = 640.0;
const SCENE_HEIGHT: f32 = 480.0;
const FPS: f64 = 30.0;
const MAX_FRAMES: u64 = 900;

struct Camera {
    frame_no: u64,
}

impl FrameSource for Camera {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        if self.frame_no == MAX_FRAMES {
            return Ok(None);
        }

        // pace like a live 30 fps feed
        thread::sleep(Duration::from_millis(33));
        self.frame_no += 1;

        Ok(Some(Frame {
            pixels: Vec::new(),
            width: SCENE_WIDTH as u32,
            height: SCENE_HEIGHT as u32,
            timestamp: self.frame_no as f64 / FPS,
        }))
    }
}

struct Walker {
    start: (f32, f32),
    velocity: (f32, f32), // px per second
    size: (f32, f32),
}

impl Walker {
    fn at(&self, t: f64) -> (f32, f32) {
        let t = t as f32;
        let x = (self.start.0 + self.velocity.0 * t).rem_euclid(SCENE_WIDTH);
        let y = (self.start.1 + self.velocity.1 * t).rem_euclid(SCENE_HEIGHT);

        (x, y)
    }
}

/// Stands in for the model call: emits one anchor per walker plus a
/// sub-threshold noise anchor and a duplicate box, so the decoder's
/// filtering and the suppression stage both have work to do.
struct SyntheticDetector {
    walkers: Vec<Walker>,
}

impl InferenceEngine for SyntheticDetector {
    type Error = Infallible;

    fn infer(&mut self, frame: &Frame) -> Result<ArrayD<f32>, Self::Error> {
        let rows = self.walkers.len() + 2;
        let mut tensor = Array3::<f32>::zeros((1, rows, 6));

        for (i, walker) in self.walkers.iter().enumerate() {
            let (cx, cy) = walker.at(frame.timestamp);
            tensor[[0, i, 0]] = cx;
            tensor[[0, i, 1]] = cy;
            tensor[[0, i, 2]] = walker.size.0;
            tensor[[0, i, 3]] = walker.size.1;
            tensor[[0, i, 4]] = 0.85;
        }

        // noise anchor below the confidence threshold
        let noise = self.walkers.len();
        tensor[[0, noise, 0]] = SCENE_WIDTH / 2.0;
        tensor[[0, noise, 1]] = SCENE_HEIGHT / 2.0;
        tensor[[0, noise, 2]] = 40.0;
        tensor[[0, noise, 3]] = 40.0;
        tensor[[0, noise, 4]] = 0.3;

        // near-duplicate of the first walker, to be suppressed
        let (cx, cy) = self.walkers[0].at(frame.timestamp);
        let dup = noise + 1;
        tensor[[0, dup, 0]] = cx + 3.0;
        tensor[[0, dup, 1]] = cy + 2.0;
        tensor[[0, dup, 2]] = self.walkers[0].size.0;
        tensor[[0, dup, 3]] = self.walkers[0].size.1;
        tensor[[0, dup, 4]] = 0.7;

        Ok(tensor.into_dyn())
    }
}

fn walkers() -> Vec<Walker> {
    vec![
        Walker {
            start: (40.0, 120.0),
            velocity: (45.0, 2.0),
            size: (36.0, 90.0),
        },
        Walker {
            start: (600.0, 200.0),
            velocity: (-38.0, -1.0),
            size: (40.0, 96.0),
        },
        Walker {
            start: (320.0, 60.0),
            velocity: (1.5, 30.0),
            size: (34.0, 84.0),
        },
        Walker {
            start: (180.0, 420.0),
            velocity: (-2.0, -26.0),
            size: (38.0, 92.0),
        },
        Walker {
            start: (480.0, 350.0),
            velocity: (42.0, 3.0),
            size: (36.0, 88.0),
        },
    ]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let sink = |snapshot: &StatsSnapshot, objects: &[TrackedObject]| {
        let line = serde_json::json!({
            "people": snapshot.people_count,
            "tracks": objects.len(),
            "dominant": snapshot.dominant_direction,
            "area_ratio": snapshot.area_ratio,
            "congestion": snapshot.congestion.code(),
        });
        println!("{line}");
    };

    let context = PipelineContext {
        source: Camera { frame_no: 0 },
        sink,
    };
    let engine = SyntheticDetector { walkers: walkers() };
    let config = PipelineConfig {
        decoder: DecoderConfig {
            num_classes: 2,
            input_width: SCENE_WIDTH as u32,
            input_height: SCENE_HEIGHT as u32,
            ..DecoderConfig::default()
        },
        ..PipelineConfig::default()
    };

    let mut scheduler = FrameScheduler::new(context, engine, config);

    let handle = scheduler.stop_handle();
    ctrlc::set_handler(move || handle.stop())?;

    scheduler.run();

    Ok(())
}
