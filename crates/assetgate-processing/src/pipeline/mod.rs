//! Pipeline types and errors.
//!
//! A pipeline is an ordered list of operations encoded in a fetch query
//! string, e.g. `image/resize,m_lfit,w_200,h_100/format,webp/quality,Q_80`.
//! Operations apply strictly in parse order.

pub mod executor;
pub mod geometry;
pub mod parser;

use thiserror::Error;

/// Output encodings the pipeline can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jpg" | "jpeg" => Some(OutputFormat::Jpg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::Webp),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// How a resize maps the source onto the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Largest content box fitting inside the target, aspect preserved.
    Lfit,
    /// Smallest content box covering the target, aspect preserved.
    Mfit,
    /// Lfit content centered on a target-sized canvas filled with the pad color.
    Pad,
    /// Exact target dimensions, aspect not preserved.
    Fixed,
}

impl ResizeMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lfit" => Some(ResizeMode::Lfit),
            "mfit" => Some(ResizeMode::Mfit),
            "pad" => Some(ResizeMode::Pad),
            "fixed" => Some(ResizeMode::Fixed),
            _ => None,
        }
    }
}

/// Fill color for pad mode, parsed from `RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PadColor {
    pub const WHITE: PadColor = PadColor {
        r: 255,
        g: 255,
        b: 255,
    };
}

impl Default for PadColor {
    fn default() -> Self {
        PadColor::WHITE
    }
}

/// Parsed resize operation. All dimensions are validated to 1..=4096 at parse
/// time; resolution against the source dimensions happens at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub mode: ResizeMode,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub longer: Option<u32>,
    pub shorter: Option<u32>,
    pub pad_color: PadColor,
}

impl Default for ResizeSpec {
    fn default() -> Self {
        ResizeSpec {
            mode: ResizeMode::Lfit,
            width: None,
            height: None,
            longer: None,
            shorter: None,
            pad_color: PadColor::WHITE,
        }
    }
}

/// One step of a transformation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Format(OutputFormat),
    Quality(u8),
    Resize(ResizeSpec),
}

/// An ordered sequence of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub operations: Vec<Operation>,
}

/// Parse or apply failure. Per the download gatekeeper's contract these are
/// advisory: a failed pipeline means the original bytes are served unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("missing asset type segment")]
    MissingAssetType,

    #[error("unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("operation {op}: unknown argument {arg}")]
    UnknownArgument { op: &'static str, arg: String },

    #[error("operation {op}: malformed argument {arg}")]
    MalformedArgument { op: &'static str, arg: String },

    #[error("{key} value {value} out of range {min}..={max}")]
    OutOfRange {
        key: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("malformed color: {0}")]
    MalformedColor(String),

    #[error("pipeline has {0} operations, more than the limit")]
    TooManyOperations(usize),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image encode failed: {0}")]
    Encode(String),
}
