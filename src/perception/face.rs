//! Detector output types
//!
//! These mirror what browser face detectors hand back (a bounding box, a
//! keypoint mesh, or both), in image pixels. Decoding accepts both the
//! `box`/`boundingBox` box forms and keypoints as pairs or `{x, y}` objects.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::FACE_BOX_VERTICAL_BIAS;

/// Which detector produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Landmark mesh model
    Mesh,
    /// Bounding-box detector, used when the mesh finds nothing
    Box,
}

/// Axis-aligned face bounding box (image pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// One detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFace")]
pub struct Face {
    #[serde(rename = "box")]
    pub bounding_box: Option<FaceBox>,
    pub keypoints: Vec<Vec2>,
}

/// A point as detectors emit it: `[x, y]` or `{x, y, z?, name?}`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Pair([f32; 2]),
    Object { x: f32, y: f32 },
}

impl From<RawPoint> for Vec2 {
    fn from(p: RawPoint) -> Self {
        match p {
            RawPoint::Pair([x, y]) => Vec2::new(x, y),
            RawPoint::Object { x, y } => Vec2::new(x, y),
        }
    }
}

/// Corner form of a box used by older detector builds
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCorners {
    top_left: RawPoint,
    bottom_right: RawPoint,
}

/// Every face shape the page may forward
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFace {
    #[serde(rename = "box", default)]
    bounding_box: Option<FaceBox>,
    #[serde(rename = "boundingBox", default)]
    corners: Option<RawCorners>,
    #[serde(default)]
    keypoints: Vec<RawPoint>,
}

impl From<RawFace> for Face {
    fn from(raw: RawFace) -> Self {
        let bounding_box = raw.bounding_box.or_else(|| {
            raw.corners.map(|c| {
                let (tl, br) = (Vec2::from(c.top_left), Vec2::from(c.bottom_right));
                FaceBox {
                    x_min: tl.x,
                    y_min: tl.y,
                    x_max: br.x,
                    y_max: br.y,
                }
            })
        });
        Self {
            bounding_box,
            keypoints: raw.keypoints.into_iter().map(Vec2::from).collect(),
        }
    }
}

impl Face {
    pub fn from_box(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            bounding_box: Some(FaceBox {
                x_min,
                y_min,
                x_max,
                y_max,
            }),
            keypoints: Vec::new(),
        }
    }

    pub fn from_keypoints(keypoints: Vec<Vec2>) -> Self {
        Self {
            bounding_box: None,
            keypoints,
        }
    }

    /// Face centre in image pixels.
    ///
    /// Boxes use the horizontal middle and a point a little above the vertical
    /// middle (where the eyes are); keypoints use their centroid.
    pub fn center(&self) -> Option<Vec2> {
        if let Some(b) = self.bounding_box {
            return Some(Vec2::new(
                (b.x_min + b.x_max) * 0.5,
                (b.y_min + b.y_max) * FACE_BOX_VERTICAL_BIAS,
            ));
        }
        if self.keypoints.is_empty() {
            return None;
        }
        let sum: Vec2 = self.keypoints.iter().copied().sum();
        Some(sum / self.keypoints.len() as f32)
    }
}

/// Result of one detector call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub faces: Vec<Face>,
    /// Size of the analysed camera frame (px)
    pub frame_width: f32,
    pub frame_height: f32,
    pub detector: DetectorKind,
}

impl Detection {
    /// Centre of the first face in [0,1]x[0,1] image space.
    ///
    /// `None` when there is no face, the frame has no size, or the numbers are
    /// not finite.
    pub fn normalized_center(&self) -> Option<Vec2> {
        if !(self.frame_width > 0.0 && self.frame_height > 0.0) {
            return None;
        }
        let center = self.faces.first()?.center()?;
        let n = Vec2::new(center.x / self.frame_width, center.y / self.frame_height);
        n.is_finite().then_some(n)
    }

    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_center_biased_upward() {
        let face = Face::from_box(100.0, 100.0, 200.0, 300.0);
        let c = face.center().unwrap();
        assert_eq!(c.x, 150.0);
        assert!((c.y - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_keypoint_centroid() {
        let face = Face::from_keypoints(vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 20.0)]);
        assert_eq!(face.center(), Some(Vec2::new(5.0, 10.0)));
        assert_eq!(Face::default().center(), None);
    }

    #[test]
    fn test_normalized_center_rejects_bad_numbers() {
        let mut det = Detection {
            faces: vec![Face::from_keypoints(vec![Vec2::new(320.0, 240.0)])],
            frame_width: 640.0,
            frame_height: 480.0,
            detector: DetectorKind::Mesh,
        };
        assert_eq!(det.normalized_center(), Some(Vec2::new(0.5, 0.5)));

        det.faces = vec![Face::from_keypoints(vec![Vec2::new(f32::NAN, 1.0)])];
        assert_eq!(det.normalized_center(), None);

        det.faces = vec![Face::from_keypoints(vec![Vec2::new(1.0, 1.0)])];
        det.frame_width = 0.0;
        assert_eq!(det.normalized_center(), None);
    }

    #[test]
    fn test_deserialize_browser_payload() {
        let json = r#"{
            "faces": [{"box": {"xMin": 10, "yMin": 20, "xMax": 30, "yMax": 40}}],
            "frameWidth": 640,
            "frameHeight": 480,
            "detector": "box"
        }"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.detector, DetectorKind::Box);
        assert_eq!(det.faces[0].center().map(|c| c.x), Some(20.0));
        assert!(det.faces[0].keypoints.is_empty());
    }

    #[test]
    fn test_deserialize_keypoint_objects() {
        let json = r#"{
            "faces": [{"keypoints": [
                {"x": 100, "y": 200, "z": -3.5, "name": "noseTip"},
                {"x": 300, "y": 400, "z": 1.0}
            ]}],
            "frameWidth": 800,
            "frameHeight": 600,
            "detector": "mesh"
        }"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.faces[0].center(), Some(Vec2::new(200.0, 300.0)));
        assert_eq!(det.normalized_center(), Some(Vec2::new(0.25, 0.5)));

        // Plain pairs still decode, mixed with objects
        let face: Face =
            serde_json::from_str(r#"{"keypoints": [[0, 0], {"x": 10, "y": 20}]}"#).unwrap();
        assert_eq!(face.center(), Some(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn test_deserialize_bounding_box_corners() {
        let json = r#"{
            "faces": [
                {"boundingBox": {"topLeft": [100, 100], "bottomRight": [200, 300]}},
                {"boundingBox": {"topLeft": {"x": 0, "y": 0}, "bottomRight": {"x": 50, "y": 50}}}
            ],
            "frameWidth": 640,
            "frameHeight": 480,
            "detector": "box"
        }"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        let c = det.faces[0].center().unwrap();
        assert_eq!(c.x, 150.0);
        assert!((c.y - 180.0).abs() < 1e-4);
        assert_eq!(
            det.faces[1].bounding_box,
            Some(FaceBox {
                x_min: 0.0,
                y_min: 0.0,
                x_max: 50.0,
                y_max: 50.0
            })
        );
        assert!(det.normalized_center().is_some());
    }

    #[test]
    fn test_box_wins_over_corners() {
        let face: Face = serde_json::from_str(
            r#"{"box": {"xMin": 0, "yMin": 0, "xMax": 10, "yMax": 10},
                "boundingBox": {"topLeft": [100, 100], "bottomRight": [200, 200]}}"#,
        )
        .unwrap();
        assert_eq!(face.bounding_box.map(|b| b.x_max), Some(10.0));
    }
}
