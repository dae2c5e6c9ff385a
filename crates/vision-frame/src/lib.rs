//! Vision Frame Input
//!
//! The per-frame observation record delivered by the external vision
//! provider (face-mesh landmarks, iris centers, head pose), plus the
//! validation gate the pipeline applies before trusting a frame.

pub mod frame;
pub mod validate;

pub use frame::{HeadPose, VisionFrame, EYE_CONTOUR_POINTS};
pub use validate::{FrameCheck, FrameError};
