//! Assetgate Processing Library
//!
//! Image transformation pipeline: a query-string DSL parsed into an ordered
//! operation list, geometry resolution for resize targets, and execution over
//! the `image` crate. Pixel resampling and encoding are delegated to `image`;
//! this crate decides parameters.

pub mod pipeline;

// Re-export commonly used types
pub use pipeline::executor::{apply_pipeline, is_supported_image, TransformedImage};
pub use pipeline::geometry;
pub use pipeline::parser::parse_pipeline;
pub use pipeline::{
    Operation, OutputFormat, PadColor, Pipeline, PipelineError, ResizeMode, ResizeSpec,
};
