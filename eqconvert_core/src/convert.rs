use crate::client::{Backend, ClientError};
use crate::markup;
use crate::protocol::{ContentHash, MimeCategory, ResponseShape, TargetFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{format} expects a {expected} content hash source")]
    SourceArity {
        format: TargetFormat,
        expected: &'static str,
    },
    #[error("{format} returned an unexpected payload: {reason}")]
    Payload {
        format: TargetFormat,
        reason: String,
    },
}

/// The content hashes a conversion reads from.
#[derive(Debug, Clone, Copy)]
pub enum RenderSource<'a> {
    Single(&'a ContentHash),
    Pair {
        left: &'a ContentHash,
        right: &'a ContentHash,
    },
}

/// A converted EQ ready for presentation: pretty-printed display text and
/// the verbatim payload the download writes, under its derived filename.
///
/// Display and download share one fetch, so they can never diverge.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub display_html: String,
    pub payload: String,
    pub filename: String,
    pub mime: MimeCategory,
}

pub async fn render<C: Backend>(
    client: &C,
    format: TargetFormat,
    target_filename: &str,
    source: RenderSource<'_>,
) -> Result<Rendered, ConvertError> {
    let value = match (format.needs_pair(), source) {
        (false, RenderSource::Single(hash)) => client.eq_target(format, hash).await?,
        (true, RenderSource::Pair { left, right }) => {
            client.eq_target_room(left, right).await?
        }
        (false, RenderSource::Pair { .. }) => {
            return Err(ConvertError::SourceArity {
                format,
                expected: "single",
            })
        }
        (true, RenderSource::Single(_)) => {
            return Err(ConvertError::SourceArity {
                format,
                expected: "left/right pair",
            })
        }
    };

    let payload = extract_text(format, value)?;
    Ok(Rendered {
        display_html: markup::to_html(&payload),
        filename: download_filename(target_filename, format),
        mime: format.mime(),
        payload,
    })
}

fn extract_text(format: TargetFormat, value: serde_json::Value) -> Result<String, ConvertError> {
    match format.response_shape() {
        ResponseShape::Text => match value {
            serde_json::Value::String(text) => Ok(text),
            other => Err(ConvertError::Payload {
                format,
                reason: format!("expected a string, got {other}"),
            }),
        },
        ResponseShape::MarkedText => {
            // Two-element [marker, text]; the marker is opaque.
            let text = value
                .as_array()
                .filter(|elems| elems.len() == 2)
                .and_then(|elems| elems[1].as_str())
                .map(str::to_string);
            text.ok_or_else(|| ConvertError::Payload {
                format,
                reason: format!("expected a [marker, text] pair, got {value}"),
            })
        }
    }
}

/// Derive the download name from the source filename: formats with an
/// extension substitute the last four characters when the name is longer
/// than four, and append otherwise. APO keeps the name as is.
pub fn download_filename(name: &str, format: TargetFormat) -> String {
    let Some(ext) = format.extension() else {
        return name.to_string();
    };
    let count = name.chars().count();
    if count > 4 {
        let stem: String = name.chars().take(count - 4).collect();
        format!("{stem}{ext}")
    } else {
        format!("{name}{ext}")
    }
}
