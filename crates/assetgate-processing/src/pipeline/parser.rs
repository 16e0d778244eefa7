//! Pipeline DSL parser.
//!
//! Grammar: `assetType ('/' operation)*` where `assetType` must be `image`
//! and each operation is `name (',' arg)*`. Resize arguments are `key_value`
//! pairs; `format` takes a bare format name; `quality` takes `Q_<n>`.

use assetgate_core::constants::{MAX_DIMENSION, MAX_PIPELINE_OPERATIONS};

use super::{Operation, OutputFormat, PadColor, Pipeline, PipelineError, ResizeMode, ResizeSpec};

/// Parse a pipeline query value into an ordered operation list.
pub fn parse_pipeline(input: &str) -> Result<Pipeline, PipelineError> {
    let mut segments = input.split('/');

    let asset_type = segments.next().unwrap_or("");
    if asset_type.is_empty() {
        return Err(PipelineError::MissingAssetType);
    }
    if asset_type != "image" {
        return Err(PipelineError::UnknownAssetType(asset_type.to_string()));
    }

    let mut operations = Vec::new();
    for segment in segments {
        operations.push(parse_operation(segment)?);
        if operations.len() > MAX_PIPELINE_OPERATIONS {
            return Err(PipelineError::TooManyOperations(operations.len()));
        }
    }

    Ok(Pipeline { operations })
}

fn parse_operation(segment: &str) -> Result<Operation, PipelineError> {
    let mut parts = segment.split(',');
    let name = parts.next().unwrap_or("");

    match name {
        "format" => parse_format(parts),
        "quality" => parse_quality(parts),
        "resize" => parse_resize(parts),
        other => Err(PipelineError::UnknownOperation(other.to_string())),
    }
}

fn parse_format<'a>(
    mut args: impl Iterator<Item = &'a str>,
) -> Result<Operation, PipelineError> {
    let value = args.next().ok_or(PipelineError::MalformedArgument {
        op: "format",
        arg: String::new(),
    })?;
    if args.next().is_some() {
        return Err(PipelineError::MalformedArgument {
            op: "format",
            arg: value.to_string(),
        });
    }
    let format = OutputFormat::from_name(value).ok_or_else(|| PipelineError::MalformedArgument {
        op: "format",
        arg: value.to_string(),
    })?;
    Ok(Operation::Format(format))
}

fn parse_quality<'a>(
    mut args: impl Iterator<Item = &'a str>,
) -> Result<Operation, PipelineError> {
    let arg = args.next().ok_or(PipelineError::MalformedArgument {
        op: "quality",
        arg: String::new(),
    })?;
    if args.next().is_some() {
        return Err(PipelineError::MalformedArgument {
            op: "quality",
            arg: arg.to_string(),
        });
    }
    let value = arg
        .strip_prefix("Q_")
        .ok_or_else(|| PipelineError::MalformedArgument {
            op: "quality",
            arg: arg.to_string(),
        })?;
    let quality = parse_bounded(value, "quality", 1, 100).map_err(|e| match e {
        // Keep the raw argument in malformed-number reports.
        PipelineError::MalformedArgument { op, .. } => PipelineError::MalformedArgument {
            op,
            arg: arg.to_string(),
        },
        other => other,
    })?;
    Ok(Operation::Quality(quality as u8))
}

fn parse_resize<'a>(args: impl Iterator<Item = &'a str>) -> Result<Operation, PipelineError> {
    let mut spec = ResizeSpec::default();

    for arg in args {
        let (key, value) = arg.split_once('_').ok_or_else(|| {
            PipelineError::MalformedArgument {
                op: "resize",
                arg: arg.to_string(),
            }
        })?;
        match key {
            "m" => {
                spec.mode =
                    ResizeMode::from_name(value).ok_or_else(|| PipelineError::MalformedArgument {
                        op: "resize",
                        arg: arg.to_string(),
                    })?;
            }
            "w" => spec.width = Some(parse_bounded(value, "w", 1, MAX_DIMENSION)?),
            "h" => spec.height = Some(parse_bounded(value, "h", 1, MAX_DIMENSION)?),
            "l" => spec.longer = Some(parse_bounded(value, "l", 1, MAX_DIMENSION)?),
            "s" => spec.shorter = Some(parse_bounded(value, "s", 1, MAX_DIMENSION)?),
            "color" => spec.pad_color = parse_color(value)?,
            _ => {
                return Err(PipelineError::UnknownArgument {
                    op: "resize",
                    arg: arg.to_string(),
                })
            }
        }
    }

    Ok(Operation::Resize(spec))
}

fn parse_bounded(
    value: &str,
    key: &'static str,
    min: u32,
    max: u32,
) -> Result<u32, PipelineError> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| PipelineError::MalformedArgument {
            op: "resize",
            arg: format!("{}_{}", key, value),
        })?;
    if parsed < min || parsed > max {
        return Err(PipelineError::OutOfRange {
            key,
            value: parsed,
            min,
            max,
        });
    }
    Ok(parsed)
}

fn parse_color(value: &str) -> Result<PadColor, PipelineError> {
    if value.len() != 6 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PipelineError::MalformedColor(value.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&value[range], 16).expect("validated hex digits")
    };
    Ok(PadColor {
        r: channel(0..2),
        g: channel(2..4),
        b: channel(4..6),
    })
}
