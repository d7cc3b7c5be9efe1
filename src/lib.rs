pub mod error;
pub mod follow;
pub mod interpolation;
pub mod math;
pub mod network;
pub mod operations;

pub use error::{Result, SplineGraphError};
pub use network::{InterpolationMode, JunctionId, PointId, PointMode, SplineId, SplineNetwork};
