// Built-in dispatch handlers. Applications add their own with
// `MethodRegistry::register`.

use chrono::Utc;
use serde_json::{json, Value};

use super::registry::{ApiContext, ApiError};

/// `echo` - return the request data unchanged
pub fn echo(_ctx: &ApiContext, data: Value) -> Result<Value, ApiError> {
    Ok(data)
}

/// `ping` - liveness probe with a timestamp
pub fn ping(_ctx: &ApiContext, _data: Value) -> Result<Value, ApiError> {
    Ok(json!({ "pong": Utc::now().to_rfc3339() }))
}

/// `env` - the site env map as a JSON object
pub fn env(ctx: &ApiContext, _data: Value) -> Result<Value, ApiError> {
    let map: serde_json::Map<String, Value> = ctx
        .env
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Ok(Value::Object(map))
}

/// `session` - the caller's session id
pub fn session(ctx: &ApiContext, _data: Value) -> Result<Value, ApiError> {
    Ok(json!({ "session": ctx.session_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(env: &HashMap<String, String>) -> ApiContext<'_> {
        ApiContext {
            env,
            session_id: "test-session",
        }
    }

    #[test]
    fn test_echo_returns_data_unchanged() {
        let env = HashMap::new();
        let data = json!({"x": 1, "nested": {"y": [1, 2]}});
        assert_eq!(echo(&ctx(&env), data.clone()).unwrap(), data);
    }

    #[test]
    fn test_ping_has_pong_key() {
        let env = HashMap::new();
        let out = ping(&ctx(&env), json!({})).unwrap();
        assert!(out.get("pong").is_some());
    }

    #[test]
    fn test_env_reflects_map() {
        let mut env = HashMap::new();
        env.insert("site".to_string(), "demo".to_string());
        let out = super::env(&ctx(&env), json!({})).unwrap();
        assert_eq!(out, json!({"site": "demo"}));
    }

    #[test]
    fn test_session_returns_id() {
        let env = HashMap::new();
        let out = session(&ctx(&env), json!({})).unwrap();
        assert_eq!(out, json!({"session": "test-session"}));
    }
}
