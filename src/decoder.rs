use ndarray::prelude::*;
use tracing::debug;

use crate::bbox::BBox;
use crate::detection::Detection;
use crate::error::Error;

pub struct DecoderConfig {
    pub confidence_threshold: f32,
    pub target_class: i32,
    pub num_classes: usize,
    pub input_width: u32,
    pub input_height: u32,
}

impl DecoderConfig {
    pub fn new(confidence_threshold: f32, target_class: i32) -> Self {
        Self {
            confidence_threshold,
            target_class,
            ..Self::default()
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            target_class: 0,
            num_classes: 80,
            input_width: 640,
            input_height: 640,
        }
    }
}

/// Turns a raw detector output tensor into detections in source-image
/// coordinates.
///
/// Accepts both export layouts for a batch of one: `[1, F, N]` with the
/// feature axis first and `[1, N, F]` with the anchor axis first, where
/// `F = 4 + num_classes`. The layout is resolved from the declared shape
/// alone; when `N == F` the feature-first reading wins. Each anchor is
/// `[cx, cy, w, h, class scores...]` in model-input pixels with no
/// objectness term: the best class score is the confidence.
pub struct TensorDecoder {
    config: DecoderConfig,
}

impl TensorDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn decode(
        &self,
        tensor: ArrayViewD<'_, f32>,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Vec<Detection>, Error> {
        let features = 4 + self.config.num_classes;
        let shape = tensor.shape().to_vec();

        let view = match tensor.into_dimensionality::<Ix3>() {
            Ok(view) if view.shape()[0] == 1 => view,
            _ => {
                return Err(Error::UnsupportedLayout {
                    shape,
                    expected: features,
                })
            }
        };

        let plane = view.index_axis(Axis(0), 0);
        let anchors = if plane.shape()[0] == features {
            plane.reversed_axes()
        } else if plane.shape()[1] == features {
            plane
        } else {
            return Err(Error::UnsupportedLayout {
                shape,
                expected: features,
            });
        };

        let x_scale = frame_width as f32 / self.config.input_width as f32;
        let y_scale = frame_height as f32 / self.config.input_height as f32;

        let mut detections = Vec::new();
        let mut degenerate = 0usize;

        for anchor in anchors.outer_iter() {
            let mut class_index = -1;
            let mut confidence = 0.0;

            for (idx, val) in anchor.iter().skip(4).copied().enumerate() {
                if val > confidence {
                    class_index = idx as i32;
                    confidence = val;
                }
            }

            if class_index < 0 || confidence <= self.config.confidence_threshold {
                continue;
            }

            if class_index != self.config.target_class {
                continue;
            }

            let cx = anchor[0] * x_scale;
            let cy = anchor[1] * y_scale;
            let w = anchor[2] * x_scale;
            let h = anchor[3] * y_scale;

            let bbox = BBox::from_cxcywh(cx, cy, w, h);
            if !bbox.is_valid() {
                degenerate += 1;
                continue;
            }

            detections.push(Detection::new(bbox, confidence, class_index));
        }

        if degenerate > 0 {
            debug!(count = degenerate, "dropped degenerate boxes after decode");
        }

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DecoderConfig {
        DecoderConfig {
            confidence_threshold: 0.5,
            target_class: 0,
            num_classes: 2,
            input_width: 100,
            input_height: 100,
        }
    }

    fn feature_major(anchors: &[[f32; 6]]) -> ArrayD<f32> {
        let mut arr = Array3::<f32>::zeros((1, 6, anchors.len()));
        for (i, anchor) in anchors.iter().enumerate() {
            for (f, val) in anchor.iter().enumerate() {
                arr[[0, f, i]] = *val;
            }
        }
        arr.into_dyn()
    }

    fn anchor_major(anchors: &[[f32; 6]]) -> ArrayD<f32> {
        let mut arr = Array3::<f32>::zeros((1, anchors.len(), 6));
        for (i, anchor) in anchors.iter().enumerate() {
            for (f, val) in anchor.iter().enumerate() {
                arr[[0, i, f]] = *val;
            }
        }
        arr.into_dyn()
    }

    #[test]
    fn decodes_feature_major_layout() {
        let decoder = TensorDecoder::new(config());
        let tensor = feature_major(&[[50.0, 50.0, 20.0, 10.0, 0.9, 0.1]]);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 0);
        assert!((dets[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(dets[0].bbox.as_slice(), &[40.0, 45.0, 60.0, 55.0]);
        assert_eq!(dets[0].center, (50, 50));
    }

    #[test]
    fn decodes_anchor_major_layout() {
        let decoder = TensorDecoder::new(config());
        let tensor = anchor_major(&[[50.0, 50.0, 20.0, 10.0, 0.9, 0.1]]);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox.as_slice(), &[40.0, 45.0, 60.0, 55.0]);
    }

    #[test]
    fn square_plane_prefers_feature_major() {
        // Six anchors with six features each: the shape alone is ambiguous,
        // and only the feature-first reading finds the planted detection.
        let decoder = TensorDecoder::new(config());
        let mut anchors = [[0.0f32; 6]; 6];
        anchors[0] = [50.0, 50.0, 20.0, 10.0, 0.9, 0.0];
        let tensor = feature_major(&anchors);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert_eq!(dets.len(), 1);
        assert!((dets[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        let decoder = TensorDecoder::new(config());

        let wrong_features = ArrayD::<f32>::zeros(ndarray::IxDyn(&[1, 7, 5]));
        assert!(matches!(
            decoder.decode(wrong_features.view(), 100, 100),
            Err(Error::UnsupportedLayout { expected: 6, .. })
        ));

        let two_axes = ArrayD::<f32>::zeros(ndarray::IxDyn(&[6, 5]));
        assert!(decoder.decode(two_axes.view(), 100, 100).is_err());

        let batch_of_two = ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 6, 5]));
        assert!(decoder.decode(batch_of_two.view(), 100, 100).is_err());
    }

    #[test]
    fn scales_axes_independently() {
        let decoder = TensorDecoder::new(config());
        let tensor = anchor_major(&[[50.0, 50.0, 20.0, 10.0, 0.9, 0.1]]);

        // 200x100 source against a 100x100 model input doubles x only.
        let dets = decoder.decode(tensor.view(), 200, 100).unwrap();

        assert_eq!(dets[0].bbox.as_slice(), &[80.0, 45.0, 120.0, 55.0]);
        assert_eq!(dets[0].center, (100, 50));
    }

    #[test]
    fn confidence_threshold_is_exclusive() {
        let decoder = TensorDecoder::new(config());
        let tensor = anchor_major(&[
            [50.0, 50.0, 20.0, 10.0, 0.5, 0.0],
            [30.0, 30.0, 20.0, 10.0, 0.51, 0.0],
        ]);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert_eq!(dets.len(), 1);
        assert!((dets[0].confidence - 0.51).abs() < 1e-6);
    }

    #[test]
    fn keeps_only_target_class() {
        let decoder = TensorDecoder::new(config());
        // class 1 wins the argmax on the first anchor, so it is discarded
        let tensor = anchor_major(&[
            [50.0, 50.0, 20.0, 10.0, 0.6, 0.8],
            [30.0, 30.0, 20.0, 10.0, 0.8, 0.6],
        ]);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 0);
        assert_eq!(dets[0].center, (30, 30));
    }

    #[test]
    fn drops_degenerate_boxes() {
        let decoder = TensorDecoder::new(config());
        let tensor = anchor_major(&[
            [50.0, 50.0, 0.0, 10.0, 0.9, 0.0],
            [50.0, 50.0, 20.0, -5.0, 0.9, 0.0],
            [f32::NAN, 50.0, 20.0, 10.0, 0.9, 0.0],
        ]);

        let dets = decoder.decode(tensor.view(), 100, 100).unwrap();

        assert!(dets.is_empty());
    }
}
