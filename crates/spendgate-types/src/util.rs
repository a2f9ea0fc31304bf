use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Today's ledger date key, UTC.
pub fn utc_today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Current instant as an ISO-8601 string, the format state files record.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a host-supplied timestamp. Providers disagree on the wire shape:
/// some send ISO-8601 strings, some epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_iso(s),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Rough token estimate used for context-size decisions: four characters
/// per token.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_iso() {
        let ts = parse_timestamp(&json!("2026-08-02T10:30:00Z")).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-08-02T10:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_epoch_millis() {
        let ts = parse_timestamp(&json!(1_754_130_600_000_i64)).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_754_130_600_000);
    }

    #[test]
    fn test_parse_timestamp_rejects_other_shapes() {
        assert!(parse_timestamp(&json!(null)).is_none());
        assert!(parse_timestamp(&json!("not a date")).is_none());
        assert!(parse_timestamp(&json!({"sec": 1})).is_none());
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(4), 1);
        assert_eq!(estimate_tokens(5), 2);
    }

    #[test]
    fn test_utc_today_shape() {
        let today = utc_today();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
    }
}
