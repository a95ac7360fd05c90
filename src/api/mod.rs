// API module entry
// Generic JSON dispatch: envelope in, registry lookup, JSON out

mod envelope;
mod handlers;
mod registry;

pub use envelope::Envelope;
pub use registry::{ApiContext, ApiError, ApiHandler, MethodRegistry};

use serde_json::{json, Value};

use crate::logger;

/// Dispatch an envelope against the registry
///
/// Always produces a response body: handler results pass through untouched,
/// every failure collapses to `{"error": "<class>: <message>"}`. Full error
/// detail is logged server-side; clients only ever see the short form
/// (never a backtrace).
pub fn dispatch(
    registry: &MethodRegistry,
    result: Result<Envelope, ApiError>,
    ctx: &ApiContext,
    request_path: &str,
) -> Value {
    let outcome = result.and_then(|env| {
        let handler = registry
            .get(&env.method)
            .ok_or_else(|| ApiError::UnknownMethod(env.method.clone()))?;
        handler(ctx, env.data).map_err(|e| match e {
            ApiError::Handler(_) => e,
            other => ApiError::Handler(other.to_string()),
        })
    });

    match outcome {
        Ok(value) => value,
        Err(err) => {
            logger::log_dispatch_error(request_path, dispatch_method_name(&err), &err.to_string());
            json!({ "error": err.to_string() })
        }
    }
}

/// Method name for the error log, where one is known
fn dispatch_method_name(err: &ApiError) -> &str {
    match err {
        ApiError::UnknownMethod(name) => name,
        ApiError::InvalidEnvelope(_) | ApiError::Handler(_) => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn dispatch_envelope(body: &[u8]) -> Value {
        let registry = MethodRegistry::builtin();
        let env = HashMap::new();
        let ctx = ApiContext {
            env: &env,
            session_id: "s",
        };
        dispatch(&registry, Envelope::from_json_slice(body), &ctx, "/bp/post/read")
    }

    #[test]
    fn test_echo_roundtrip() {
        let out = dispatch_envelope(br#"{"method":"echo","data":{"x":1}}"#);
        assert_eq!(out, json!({"x": 1}));
    }

    #[test]
    fn test_unknown_method_yields_error_key() {
        let out = dispatch_envelope(br#"{"method":"missing","data":{}}"#);
        let error = out.get("error").and_then(Value::as_str).expect("error key");
        assert!(error.contains("unknown method"));
        assert!(error.contains("missing"));
    }

    #[test]
    fn test_invalid_envelope_yields_error_key() {
        let out = dispatch_envelope(b"not json at all");
        let error = out.get("error").and_then(Value::as_str).expect("error key");
        assert!(error.starts_with("invalid envelope"));
    }
}
