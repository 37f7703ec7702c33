// Invocation payloads — the two ways a review reaches the pipeline.
//
// A storage notification carries only a reference to a blob holding the
// review JSON; a direct call carries the review inline. Both are resolved to
// one `Review` before any stage runs. Field parsing is lenient: anything
// missing or mistyped gets a default and a recorded warning, never an error.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::{Review, MAX_RATING, MIN_RATING, NEUTRAL_RATING};
use crate::error::PipelineError;

/// Placeholder id for a review that arrived without an author or product.
pub const UNKNOWN_ID: &str = "unknown";

const AUTHOR_FIELDS: &[&str] = &["reviewerID", "author_id"];
const PRODUCT_FIELDS: &[&str] = &["asin", "product_id"];
const NAME_FIELDS: &[&str] = &["reviewerName", "author_name"];
const BODY_FIELDS: &[&str] = &["reviewText", "body"];
const SUMMARY_FIELDS: &[&str] = &["summary"];
const RATING_FIELDS: &[&str] = &["overall", "rating"];

/// One pipeline invocation, before the review has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// The review payload travels inline.
    Direct(Value),
    /// A new blob appeared in the store; the review must be fetched from it.
    BlobCreated { bucket: String, key: String },
}

impl Invocation {
    /// Classify a raw event document.
    ///
    /// Accepts `{"review_data": {...}}`, a storage notification
    /// (`{"Records": [{"s3": {"bucket": {"name"}, "object": {"key"}}}]}`),
    /// or a bare review object. Inline `review_data` wins when both are present.
    pub fn from_event(event: &Value) -> Result<Self, PipelineError> {
        let obj = event.as_object().ok_or_else(|| {
            PipelineError::MalformedInput("event is not a JSON object".to_string())
        })?;

        if let Some(data) = obj.get("review_data") {
            return Ok(Invocation::Direct(data.clone()));
        }

        if let Some(records) = obj.get("Records").and_then(Value::as_array) {
            let s3 = records
                .first()
                .and_then(|r| r.get("s3"))
                .ok_or_else(|| {
                    PipelineError::MalformedInput("storage notification has no records".to_string())
                })?;
            let bucket = s3
                .pointer("/bucket/name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            let key = s3
                .pointer("/object/key")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            return match (bucket, key) {
                (Some(bucket), Some(key)) => Ok(Invocation::BlobCreated {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }),
                _ => Err(PipelineError::MalformedInput(
                    "storage notification is missing bucket name or object key".to_string(),
                )),
            };
        }

        let looks_like_review = AUTHOR_FIELDS
            .iter()
            .chain(PRODUCT_FIELDS)
            .chain(BODY_FIELDS)
            .any(|f| obj.contains_key(*f));
        if looks_like_review {
            return Ok(Invocation::Direct(event.clone()));
        }

        Err(PipelineError::MalformedInput(
            "event is neither a review payload nor a storage notification".to_string(),
        ))
    }
}

/// A resolved review plus the defaults that had to be applied to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReview {
    pub review: Review,
    pub warnings: Vec<String>,
}

/// Parse raw blob bytes into a review.
pub fn parse_review_bytes(bytes: &[u8]) -> Result<ParsedReview, PipelineError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::MalformedInput(format!("review blob is not JSON: {e}")))?;
    parse_review(&value)
}

/// Turn a review payload into a `Review`.
///
/// Only a non-object payload is rejected; there's nothing to default from.
pub fn parse_review(value: &Value) -> Result<ParsedReview, PipelineError> {
    let obj = value.as_object().ok_or_else(|| {
        PipelineError::MalformedInput("review payload is not a JSON object".to_string())
    })?;

    let mut warnings = Vec::new();

    let author = id_field(obj, AUTHOR_FIELDS);
    let author_defaulted = author.is_none();
    let author_id = author.unwrap_or_else(|| {
        warnings.push("missing author id, using \"unknown\"".to_string());
        UNKNOWN_ID.to_string()
    });
    let product_id = id_field(obj, PRODUCT_FIELDS).unwrap_or_else(|| {
        warnings.push("missing product id, using \"unknown\"".to_string());
        UNKNOWN_ID.to_string()
    });
    let author_name = lookup(obj, NAME_FIELDS)
        .and_then(Value::as_str)
        .map(str::to_string);

    let body = text_field(obj, BODY_FIELDS, "body", &mut warnings);
    let summary = text_field(obj, SUMMARY_FIELDS, "summary", &mut warnings);
    let rating = rating_field(obj, &mut warnings);
    let submitted_at = submitted_at_field(obj);

    Ok(ParsedReview {
        review: Review {
            author_id,
            product_id,
            author_name,
            body,
            summary,
            rating,
            submitted_at,
            author_defaulted,
        },
        warnings,
    })
}

fn lookup<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|n| obj.get(*n))
        .filter(|v| !v.is_null())
}

/// Ids may arrive as strings or numbers; blank strings count as missing.
fn id_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match lookup(obj, names)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(
    obj: &Map<String, Value>,
    names: &[&str],
    label: &str,
    warnings: &mut Vec<String>,
) -> String {
    match lookup(obj, names) {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            warnings.push(format!(
                "{label} is not text ({}), using empty string",
                type_name(other)
            ));
            String::new()
        }
    }
}

fn rating_field(obj: &Map<String, Value>, warnings: &mut Vec<String>) -> f64 {
    let parsed = match lookup(obj, RATING_FIELDS) {
        None => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(r) if r.is_finite() => {
            if !(MIN_RATING..=MAX_RATING).contains(&r) {
                warnings.push(format!("rating {r} outside 1-5, clamped"));
            }
            r.clamp(MIN_RATING, MAX_RATING)
        }
        _ => {
            warnings.push(format!("missing or invalid rating, using {NEUTRAL_RATING}"));
            NEUTRAL_RATING
        }
    }
}

fn submitted_at_field(obj: &Map<String, Value>) -> Option<DateTime<Utc>> {
    if let Some(secs) = obj.get("unixReviewTime").and_then(Value::as_i64) {
        return Utc.timestamp_opt(secs, 0).single();
    }
    obj.get("submitted_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dataset_shape() {
        let value = json!({
            "reviewerID": "A2SUAM1J3GNN3B",
            "asin": "0000013714",
            "reviewerName": "J. McDonald",
            "reviewText": "I bought this for my husband who plays the piano.",
            "overall": 5.0,
            "summary": "Heavenly Highway Hymns",
            "unixReviewTime": 1252800000
        });
        let parsed = parse_review(&value).unwrap();
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        let r = parsed.review;
        assert_eq!(r.author_id, "A2SUAM1J3GNN3B");
        assert_eq!(r.product_id, "0000013714");
        assert_eq!(r.author_name.as_deref(), Some("J. McDonald"));
        assert_eq!(r.rating, 5.0);
        assert_eq!(r.submitted_at.unwrap().timestamp(), 1252800000);
        assert!(!r.author_defaulted);
    }

    #[test]
    fn test_missing_fields_default_with_warnings() {
        let parsed = parse_review(&json!({"reviewText": 42})).unwrap();
        let r = &parsed.review;
        assert_eq!(r.author_id, UNKNOWN_ID);
        assert!(r.author_defaulted);
        assert_eq!(r.product_id, UNKNOWN_ID);
        assert_eq!(r.body, "");
        assert_eq!(r.summary, "");
        assert_eq!(r.rating, NEUTRAL_RATING);
        // author, product, non-text body, rating
        assert_eq!(parsed.warnings.len(), 4, "{:?}", parsed.warnings);
    }

    #[test]
    fn test_rating_string_and_clamp() {
        let parsed = parse_review(&json!({"reviewerID": "U", "asin": "P", "overall": "4"})).unwrap();
        assert_eq!(parsed.review.rating, 4.0);
        assert!(parsed.warnings.is_empty());

        let parsed = parse_review(&json!({"reviewerID": "U", "asin": "P", "overall": 9})).unwrap();
        assert_eq!(parsed.review.rating, MAX_RATING);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_numeric_author_id_is_accepted() {
        let parsed = parse_review(&json!({"author_id": 77, "product_id": "P"})).unwrap();
        assert_eq!(parsed.review.author_id, "77");
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(matches!(
            parse_review(&json!("just a string")),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_event_direct_form() {
        let event = json!({"review_data": {"reviewerID": "U1", "asin": "P1"}});
        match Invocation::from_event(&event).unwrap() {
            Invocation::Direct(v) => assert_eq!(v["reviewerID"], "U1"),
            other => panic!("expected direct, got {other:?}"),
        }
    }

    #[test]
    fn test_event_storage_notification_form() {
        let event = json!({
            "Records": [{"s3": {"bucket": {"name": "review-analysis-reviews"},
                                "object": {"key": "raw/U1_P1.json"}}}]
        });
        assert_eq!(
            Invocation::from_event(&event).unwrap(),
            Invocation::BlobCreated {
                bucket: "review-analysis-reviews".to_string(),
                key: "raw/U1_P1.json".to_string(),
            }
        );
    }

    #[test]
    fn test_event_inline_payload_wins_over_reference() {
        let event = json!({
            "Records": [{"s3": {"bucket": {"name": "b"}, "object": {"key": "k"}}}],
            "review_data": {"reviewerID": "U1"}
        });
        assert!(matches!(
            Invocation::from_event(&event).unwrap(),
            Invocation::Direct(_)
        ));
    }

    #[test]
    fn test_event_bare_review_and_garbage() {
        let bare = json!({"reviewerID": "U1", "reviewText": "fine"});
        assert!(matches!(
            Invocation::from_event(&bare).unwrap(),
            Invocation::Direct(_)
        ));

        assert!(Invocation::from_event(&json!({"hello": "world"})).is_err());
        assert!(Invocation::from_event(&json!({"Records": []})).is_err());
        assert!(Invocation::from_event(&json!([1, 2])).is_err());
    }
}
