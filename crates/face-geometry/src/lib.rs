//! Facial Landmark Geometry
//!
//! Pure functions over normalized 2D landmark coordinates:
//! - Euclidean distance between points
//! - Eye aspect ratio (EAR) from a 6-point eyelid contour
//! - Point-set centroid
//! - 8-way gaze direction bucketing

use serde::{Deserialize, Serialize};

/// Minimum horizontal eyelid span before EAR is considered degenerate
const MIN_HORIZONTAL_SPAN: f32 = 1e-6;

/// Magnitude below which a gaze vector is considered centered
const CENTER_EPSILON: f32 = 1e-4;

/// Minor/major axis ratio below which a near-axis vector gets a cardinal label
const CARDINAL_RATIO: f32 = 0.35;

/// A 2D point in normalized image coordinates (0.0 - 1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point2, b: Point2) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Eye aspect ratio from a 6-point eyelid contour.
///
/// Point order: p1 outer corner, p2/p3 upper lid, p4 inner corner,
/// p5/p6 lower lid. EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|).
/// Low values indicate a closed eye.
///
/// Returns `None` when fewer than 6 points are given or the horizontal
/// span collapses (division would be degenerate, not an error).
pub fn eye_aspect_ratio(contour: &[Point2]) -> Option<f32> {
    if contour.len() < 6 {
        return None;
    }

    let horizontal = distance(contour[0], contour[3]);
    if horizontal < MIN_HORIZONTAL_SPAN {
        return None;
    }

    let v1 = distance(contour[1], contour[5]);
    let v2 = distance(contour[2], contour[4]);

    Some((v1 + v2) / (2.0 * horizontal))
}

/// Mean of a point set, `None` for an empty set
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }

    let mut sx = 0.0;
    let mut sy = 0.0;
    for p in points {
        sx += p.x;
        sy += p.y;
    }

    let n = points.len() as f32;
    Some(Point2::new(sx / n, sy / n))
}

/// Discrete gaze direction relative to a reference point.
///
/// Y grows downward in image coordinates, so `Up` means negative dy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GazeDirection {
    #[default]
    Center,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

/// Bucket a 2D offset vector into one of 8 directions (or `Center`).
///
/// Vectors that are nearly axis-aligned (minor/major axis ratio below
/// 0.35) get a cardinal label; the rest are diagonal.
pub fn direction_label(dx: f32, dy: f32) -> GazeDirection {
    let magnitude = (dx * dx + dy * dy).sqrt();
    if magnitude < CENTER_EPSILON {
        return GazeDirection::Center;
    }

    let ax = dx.abs();
    let ay = dy.abs();
    let ratio = ax.min(ay) / ax.max(ay);

    if ratio < CARDINAL_RATIO {
        // Near-axis: dominant axis wins
        if ax > ay {
            if dx > 0.0 {
                GazeDirection::Right
            } else {
                GazeDirection::Left
            }
        } else if dy > 0.0 {
            GazeDirection::Down
        } else {
            GazeDirection::Up
        }
    } else {
        match (dx > 0.0, dy > 0.0) {
            (true, true) => GazeDirection::DownRight,
            (true, false) => GazeDirection::UpRight,
            (false, true) => GazeDirection::DownLeft,
            (false, false) => GazeDirection::UpLeft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Open eye: tall vertical spans relative to the horizontal
    fn open_eye() -> Vec<Point2> {
        vec![
            Point2::new(0.30, 0.50),
            Point2::new(0.34, 0.46),
            Point2::new(0.38, 0.46),
            Point2::new(0.42, 0.50),
            Point2::new(0.38, 0.54),
            Point2::new(0.34, 0.54),
        ]
    }

    #[test]
    fn test_distance() {
        let d = distance(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_ear_open_eye() {
        let ear = eye_aspect_ratio(&open_eye()).unwrap();
        // Vertical spans 0.08 each, horizontal 0.12 -> EAR = 0.16 / 0.24
        assert!((ear - 0.6667).abs() < 0.01);
    }

    #[test]
    fn test_ear_too_few_points() {
        assert!(eye_aspect_ratio(&open_eye()[..5]).is_none());
    }

    #[test]
    fn test_ear_degenerate_horizontal_span() {
        let mut contour = open_eye();
        contour[3] = contour[0];
        assert!(eye_aspect_ratio(&contour).is_none());
    }

    #[test]
    fn test_centroid() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let c = centroid(&points).unwrap();
        assert!((c.x - 0.5).abs() < 1e-6);
        assert!((c.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_direction_center() {
        assert_eq!(direction_label(0.0, 0.0), GazeDirection::Center);
        assert_eq!(direction_label(1e-5, -1e-5), GazeDirection::Center);
    }

    #[test]
    fn test_direction_cardinals() {
        assert_eq!(direction_label(1.0, 0.0), GazeDirection::Right);
        assert_eq!(direction_label(-1.0, 0.1), GazeDirection::Left);
        assert_eq!(direction_label(0.1, 1.0), GazeDirection::Down);
        assert_eq!(direction_label(0.0, -1.0), GazeDirection::Up);
    }

    #[test]
    fn test_direction_diagonals() {
        assert_eq!(direction_label(1.0, 1.0), GazeDirection::DownRight);
        assert_eq!(direction_label(1.0, -1.0), GazeDirection::UpRight);
        assert_eq!(direction_label(-1.0, 1.0), GazeDirection::DownLeft);
        assert_eq!(direction_label(-0.5, -0.5), GazeDirection::UpLeft);
    }

    #[test]
    fn test_direction_favors_cardinal_near_axis() {
        // 0.3 ratio is under the 0.35 cutoff
        assert_eq!(direction_label(1.0, 0.3), GazeDirection::Right);
        assert_eq!(direction_label(0.3, -1.0), GazeDirection::Up);
    }

    proptest! {
        #[test]
        fn ear_is_scale_invariant(scale in 0.1f32..100.0) {
            let base = open_eye();
            let scaled: Vec<Point2> = base
                .iter()
                .map(|p| Point2::new(p.x * scale, p.y * scale))
                .collect();

            let ear_base = eye_aspect_ratio(&base).unwrap();
            let ear_scaled = eye_aspect_ratio(&scaled).unwrap();
            prop_assert!((ear_base - ear_scaled).abs() < 1e-3);
        }

        #[test]
        fn distance_is_non_negative(
            ax in -10.0f32..10.0, ay in -10.0f32..10.0,
            bx in -10.0f32..10.0, by in -10.0f32..10.0,
        ) {
            prop_assert!(distance(Point2::new(ax, ay), Point2::new(bx, by)) >= 0.0);
        }
    }
}
