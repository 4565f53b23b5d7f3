//! Response wrapping for frontend compatibility.
//!
//! The frontend expects `{success: true, <key>: data}` objects rather than
//! raw values. This module maps each method's result onto that shape.

use serde_json::{json, Value};

/// Wrap a method's raw result in the `{success, ...}` envelope.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        "get_metrics_snapshot" => {
            json!({
                "success": true,
                "snapshot": result
            })
        }

        "get_price_history" | "get_tvl_history" => {
            json!({
                "success": true,
                "points": result
            })
        }

        "get_cache_stats" => {
            json!({
                "success": true,
                "stats": result
            })
        }

        // Default: return as-is (for methods not explicitly handled)
        _ => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_snapshot() {
        let wrapped = wrap_response("get_metrics_snapshot", json!({"metrics": {}}));
        assert!(wrapped.get("success").unwrap().as_bool().unwrap());
        assert_eq!(wrapped.get("snapshot").unwrap(), &json!({"metrics": {}}));
    }

    #[test]
    fn test_wrap_history_points() {
        let points = json!([{"timestamp": "2026-10-17T00:00:00Z", "value": 1.0}]);
        let wrapped = wrap_response("get_tvl_history", points.clone());
        assert!(wrapped.get("success").unwrap().as_bool().unwrap());
        assert_eq!(wrapped.get("points").unwrap(), &points);
    }

    #[test]
    fn test_wrap_cache_stats() {
        let wrapped = wrap_response("get_cache_stats", json!({"ttl_secs": 300}));
        assert_eq!(wrapped, json!({"success": true, "stats": {"ttl_secs": 300}}));
    }

    #[test]
    fn test_passthrough_method() {
        let data = json!({"status": "ok"});
        assert_eq!(wrap_response("health_check", data.clone()), data);
    }
}
