//! Inbound frame parsing.
//!
//! The source sends two JSON text frame shapes:
//! 1. Initial batch: `{"type": "initial", "data": [{"time": .., "price": ..}, ..]}`
//! 2. Incremental point: `{"time": .., "price": ..}` (no `type`, or any other `type`)
//!
//! `price` is the raw numeric field regardless of what the values mean.
//! Anything that fits neither shape is rejected so the caller can drop it.

use crate::error::{FeedError, FeedResult};
use pulse_core::{now_timestamp, RemapPolicy, Sample};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const INITIAL_FRAME_TYPE: &str = "initial";

/// Raw data point as sent by the source.
///
/// Extra fields (such as the source's own `isNew`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPoint {
    #[serde(default)]
    pub time: Option<String>,
    pub price: f64,
}

/// Decoded frame, before remapping.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Full replacement of the window.
    Initial(Vec<RawPoint>),
    /// One new point to append.
    Point(RawPoint),
}

impl StreamFrame {
    /// Parse a text frame.
    pub fn parse(text: &str) -> FeedResult<Self> {
        let value: Value = serde_json::from_str(text)?;

        if !value.is_object() {
            return Err(FeedError::UnrecognizedFrame(format!(
                "expected JSON object, got {}",
                json_kind(&value)
            )));
        }

        let is_initial = value.get("type").and_then(Value::as_str) == Some(INITIAL_FRAME_TYPE);

        if is_initial {
            let data = value.get("data").cloned().ok_or_else(|| {
                FeedError::UnrecognizedFrame("initial frame without data".to_string())
            })?;
            let points: Vec<RawPoint> = serde_json::from_value(data)
                .map_err(|e| FeedError::InvalidData(format!("initial batch: {e}")))?;
            return Ok(Self::Initial(points));
        }

        let point: RawPoint = serde_json::from_value(value)
            .map_err(|e| FeedError::UnrecognizedFrame(format!("not a data point: {e}")))?;
        Ok(Self::Point(point))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Window mutation produced by one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    /// Replace the window wholesale.
    Reset(Vec<Sample>),
    /// Append one sample.
    Append(Sample),
}

/// Frame decoder applying a single remap policy to every frame kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    remap: RemapPolicy,
}

impl FrameDecoder {
    pub fn new(remap: RemapPolicy) -> Self {
        Self { remap }
    }

    pub fn remap(&self) -> RemapPolicy {
        self.remap
    }

    /// Parse a text frame and turn it into a window mutation.
    pub fn decode(&self, text: &str) -> FeedResult<FeedUpdate> {
        match StreamFrame::parse(text)? {
            StreamFrame::Initial(points) => {
                let samples = points
                    .into_iter()
                    .map(|p| self.to_sample(p))
                    .collect::<FeedResult<Vec<_>>>()?;
                debug!(count = samples.len(), "Decoded initial batch");
                Ok(FeedUpdate::Reset(samples))
            }
            StreamFrame::Point(point) => Ok(FeedUpdate::Append(self.to_sample(point)?)),
        }
    }

    fn to_sample(&self, point: RawPoint) -> FeedResult<Sample> {
        let value = self.remap.apply(point.price);
        if !value.is_finite() {
            return Err(FeedError::InvalidData(format!(
                "non-finite value from price {}",
                point.price
            )));
        }
        let timestamp = point.time.unwrap_or_else(now_timestamp);
        Ok(Sample::new(timestamp, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_initial() {
        let frame = StreamFrame::parse(
            r#"{"type":"initial","data":[{"time":"t1","price":90.5,"isNew":false},{"time":"t2","price":91.0}]}"#,
        )
        .unwrap();

        match frame {
            StreamFrame::Initial(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[0].time.as_deref(), Some("t1"));
                assert_eq!(points[1].price, 91.0);
            }
            other => panic!("Expected Initial, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_point() {
        let frame = StreamFrame::parse(r#"{"time":"t","price":100.2,"isNew":true}"#).unwrap();
        assert_eq!(
            frame,
            StreamFrame::Point(RawPoint {
                time: Some("t".to_string()),
                price: 100.2
            })
        );
    }

    #[test]
    fn test_parse_point_with_other_type() {
        let frame = StreamFrame::parse(r#"{"type":"tick","time":"t","price":1}"#).unwrap();
        assert!(matches!(frame, StreamFrame::Point(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            StreamFrame::parse("not json"),
            Err(FeedError::Json(_))
        ));
        assert!(matches!(
            StreamFrame::parse("[1,2,3]"),
            Err(FeedError::UnrecognizedFrame(_))
        ));
        assert!(matches!(
            StreamFrame::parse(r#"{"time":"t"}"#),
            Err(FeedError::UnrecognizedFrame(_))
        ));
        assert!(matches!(
            StreamFrame::parse(r#"{"price":"high"}"#),
            Err(FeedError::UnrecognizedFrame(_))
        ));
    }

    #[test]
    fn test_parse_initial_with_bad_data() {
        assert!(matches!(
            StreamFrame::parse(r#"{"type":"initial","data":{"price":1}}"#),
            Err(FeedError::InvalidData(_))
        ));
        assert!(matches!(
            StreamFrame::parse(r#"{"type":"initial"}"#),
            Err(FeedError::UnrecognizedFrame(_))
        ));
    }

    #[test]
    fn test_decode_applies_same_remap_to_both_kinds() {
        let decoder = FrameDecoder::new(RemapPolicy::DEMO_LINEAR);

        let reset = decoder
            .decode(r#"{"type":"initial","data":[{"time":"a","price":100}]}"#)
            .unwrap();
        let append = decoder.decode(r#"{"time":"b","price":100}"#).unwrap();

        match (reset, append) {
            (FeedUpdate::Reset(batch), FeedUpdate::Append(sample)) => {
                assert_eq!(batch[0].value, 130.0);
                assert_eq!(sample.value, 130.0);
                assert_eq!(sample.timestamp, "b");
            }
            other => panic!("Unexpected updates: {other:?}"),
        }
    }

    #[test]
    fn test_decode_identity_default() {
        let decoder = FrameDecoder::default();
        match decoder.decode(r#"{"time":"b","price":72.0}"#).unwrap() {
            FeedUpdate::Append(sample) => assert_eq!(sample.value, 72.0),
            other => panic!("Expected Append, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_time_uses_receipt_time() {
        let decoder = FrameDecoder::default();
        match decoder.decode(r#"{"price":72.0}"#).unwrap() {
            FeedUpdate::Append(sample) => assert!(!sample.timestamp.is_empty()),
            other => panic!("Expected Append, got {other:?}"),
        }
    }
}
