/// Normalization of the detection API response
///
/// The hosted model answers `{ "predictions": [ { x, y, width, height,
/// class | label, confidence | conf }, ... ] }`. Field spellings vary between
/// deployments, so every prediction is normalized once here and the rest of
/// the application only ever sees `Detection`.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{DetectError, DetectResult};
use crate::state::data::{Detection, DetectionSet};

/// Class shown when the response names none
pub const FALLBACK_CLASS: &str = "obj";

#[derive(Debug, Deserialize)]
struct RawPrediction {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    class: Option<Value>,
    #[serde(default)]
    label: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    conf: Option<Value>,
}

impl RawPrediction {
    fn normalize(self) -> Detection {
        // Precedence: `class` then `label`; `confidence` then `conf`
        let class = [self.class, self.label]
            .into_iter()
            .flatten()
            .find_map(class_name)
            .unwrap_or_else(|| FALLBACK_CLASS.to_string());

        let confidence = [self.confidence, self.conf]
            .into_iter()
            .flatten()
            .find_map(confidence_value)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Detection {
            x: self.x,
            y: self.y,
            width: self.width.max(0.0),
            height: self.height.max(0.0),
            class,
            confidence,
        }
    }
}

/// Class ids may arrive as strings or numbers ("1" and 1 are the same class)
fn class_name(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Scores may arrive as numbers or numeric strings ("0.9")
fn confidence_value(value: Value) -> Option<f32> {
    let score = match value {
        Value::Number(n) => n.as_f64()? as f32,
        Value::String(s) => s.trim().parse::<f32>().ok()?,
        _ => return None,
    };
    score.is_finite().then_some(score)
}

/// Parse a response body into a detection set
pub fn parse_predictions(body: &[u8]) -> DetectResult<DetectionSet> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| DetectError::MalformedResponse(e.to_string()))?;

    let predictions = match json.get("predictions") {
        None | Some(Value::Null) => return Ok(DetectionSet::default()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DetectError::MalformedResponse(format!(
                "`predictions` should be an array, got {}",
                kind(other)
            )))
        }
    };

    let mut detections = Vec::with_capacity(predictions.len());
    for (i, item) in predictions.iter().enumerate() {
        match RawPrediction::deserialize(item) {
            Ok(raw) => detections.push(raw.normalize()),
            Err(e) => warn!("⚠️  Skipping prediction #{}: {}", i, e),
        }
    }

    Ok(DetectionSet::new(detections))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
