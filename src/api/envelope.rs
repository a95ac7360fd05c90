// Request envelope module
// The `{method, data}` structure accepted by the dispatch endpoints

use serde::Deserialize;
use serde_json::Value;

use super::registry::ApiError;

/// Dispatch request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub method: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Envelope {
    /// Parse a JSON request body (`POST .../post/read`)
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ApiError> {
        if body.is_empty() {
            return Err(ApiError::InvalidEnvelope("empty body".to_string()));
        }
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidEnvelope(e.to_string()))
    }

    /// Build an envelope from query parameters (`GET .../get/read`)
    ///
    /// `method` comes from the parameter of that name. A `data` parameter is
    /// parsed as JSON, falling back to its raw string; without one, the
    /// remaining parameters become a string-valued object.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let pairs = parse_query_pairs(query);

        let method = pairs
            .iter()
            .find(|(name, _)| name == "method")
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ApiError::InvalidEnvelope("missing method parameter".to_string()))?;

        let data = pairs.iter().find(|(name, _)| name == "data").map_or_else(
            || {
                let rest: serde_json::Map<String, Value> = pairs
                    .iter()
                    .filter(|(name, _)| name != "method")
                    .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                    .collect();
                Value::Object(rest)
            },
            |(_, raw)| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
        );

        Ok(Self { method, data })
    }
}

/// Split a query string into decoded name/value pairs
fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(name), percent_decode(value))
        })
        .collect()
}

/// Decode percent escapes plus `+` as space
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                // Needs two hex digits; malformed escapes stay literal
                if let Some(decoded) = bytes.get(i + 1..i + 3).and_then(decode_hex_pair) {
                    out.push(decoded);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn decode_hex_pair(hex: &[u8]) -> Option<u8> {
    let hi = char::from(*hex.first()?).to_digit(16)?;
    let lo = char::from(*hex.get(1)?).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_slice() {
        let env = Envelope::from_json_slice(br#"{"method":"echo","data":{"x":1}}"#).unwrap();
        assert_eq!(env.method, "echo");
        assert_eq!(env.data, json!({"x": 1}));
    }

    #[test]
    fn test_from_json_data_defaults_to_object() {
        let env = Envelope::from_json_slice(br#"{"method":"ping"}"#).unwrap();
        assert_eq!(env.data, json!({}));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            Envelope::from_json_slice(b"not json"),
            Err(ApiError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            Envelope::from_json_slice(b""),
            Err(ApiError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_from_query_params_become_data() {
        let env = Envelope::from_query("method=echo&x=1&name=ada").unwrap();
        assert_eq!(env.method, "echo");
        assert_eq!(env.data, json!({"x": "1", "name": "ada"}));
    }

    #[test]
    fn test_from_query_data_param_parsed_as_json() {
        let env = Envelope::from_query("method=echo&data=%7B%22x%22%3A1%7D").unwrap();
        assert_eq!(env.data, json!({"x": 1}));
    }

    #[test]
    fn test_from_query_data_param_falls_back_to_string() {
        let env = Envelope::from_query("method=echo&data=plain+text").unwrap();
        assert_eq!(env.data, json!("plain text"));
    }

    #[test]
    fn test_from_query_missing_method() {
        assert!(matches!(
            Envelope::from_query("x=1"),
            Err(ApiError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a+b%20c"), "a b c");
        assert_eq!(percent_decode("100%25"), "100%");
        // Malformed escapes stay literal
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%2"), "%2");
    }
}
