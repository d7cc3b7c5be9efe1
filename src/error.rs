use thiserror::Error;

/// Top-level error type for the spline network engine.
#[derive(Debug, Error)]
pub enum SplineGraphError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// Errors raised when an identifier does not resolve to a live entity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("spline not found")]
    SplineNotFound,

    #[error("spline point not found")]
    PointNotFound,

    #[error("junction not found")]
    JunctionNotFound,
}

/// Errors raised for arguments outside the valid range of an operation.
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("point index {index} is out of range [0, {count})")]
    PointIndexOutOfRange { index: usize, count: usize },

    #[error("control point index {index} is out of range [0, 2)")]
    CtrlPointIndexOutOfRange { index: usize },

    #[error("connection index {index} is out of range [0, {count})")]
    ConnectionIndexOutOfRange { index: usize, count: usize },

    #[error("curve index {index} is out of range [0, {count})")]
    CurveIndexOutOfRange { index: usize, count: usize },

    #[error("a spline needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("invalid parameter {parameter} = {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },
}

/// Convenience type alias for results using [`SplineGraphError`].
pub type Result<T> = std::result::Result<T, SplineGraphError>;
