//! Template resolution and rendering module
//!
//! Pages are keyed by URL path: the resolver turns a request path into a
//! template path (mount prefix and query string stripped), the renderer
//! reads the template file and substitutes `$path`, `$env.*` and `$data.*`
//! variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;

use crate::config::SiteConfig;

/// Resolve a request path into a template path
///
/// Drops the query string, strips one trailing slash and removes the mount
/// prefix segment. `/bp/foo/bar` with prefix `/bp` resolves to `foo/bar`.
/// An empty resolution (the prefix root) resolves to `index`.
pub fn resolve(request_path: &str, mount_prefix: &str) -> String {
    let path = request_path.split('?').next().unwrap_or(request_path);
    let path = path.strip_suffix('/').unwrap_or(path);

    let prefix = mount_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    let rest = rest.trim_start_matches('/');

    if rest.is_empty() {
        "index".to_string()
    } else {
        rest.to_string()
    }
}

/// Template filename for a resolved template path, e.g. `foo/bar.htm`
pub fn filename(template_path: &str, ext: &str) -> String {
    format!("{template_path}.{ext}")
}

/// Filesystem location of a template, confined to the template directory
///
/// Returns None for paths that would escape the directory.
fn locate(site: &SiteConfig, template_path: &str) -> Option<PathBuf> {
    if template_path
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return None;
    }
    Some(Path::new(&site.template_dir).join(filename(template_path, &site.template_ext)))
}

/// Render a template: read the file and substitute variables
///
/// Substitutions:
/// - `$path` - the resolved template path
/// - `$env.KEY` - entries of the site env map
/// - `$data.KEY` - entries of the per-request data object
///
/// Unresolved `$env.*` / `$data.*` references become empty strings.
/// Returns None when the template file does not exist (a 404 to the caller).
pub async fn render(
    site: &SiteConfig,
    template_path: &str,
    env: &HashMap<String, String>,
    data: &Value,
) -> Option<String> {
    let file = locate(site, template_path)?;
    let text = fs::read_to_string(&file).await.ok()?;
    Some(substitute(&text, template_path, env, data))
}

/// Variable substitution over template text
pub fn substitute(
    text: &str,
    template_path: &str,
    env: &HashMap<String, String>,
    data: &Value,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let (replacement, consumed) = expand_variable(rest, template_path, env, data);
        match replacement {
            Some(value) => {
                out.push_str(&value);
                rest = &rest[consumed..];
            }
            None => {
                // Not a recognized variable, keep the dollar sign literal
                out.push('$');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Expand one `$variable` at the start of `text`
///
/// Returns the replacement (if the variable is recognized) and the number
/// of bytes consumed from the input.
fn expand_variable(
    text: &str,
    template_path: &str,
    env: &HashMap<String, String>,
    data: &Value,
) -> (Option<String>, usize) {
    if let Some(rest) = text.strip_prefix("$env.") {
        let key = leading_identifier(rest);
        if key.is_empty() {
            return (None, 0);
        }
        let value = env.get(key).cloned().unwrap_or_default();
        return (Some(value), "$env.".len() + key.len());
    }

    if let Some(rest) = text.strip_prefix("$data.") {
        let key = leading_identifier(rest);
        if key.is_empty() {
            return (None, 0);
        }
        let value = data.get(key).map(json_to_text).unwrap_or_default();
        return (Some(value), "$data.".len() + key.len());
    }

    if text.starts_with("$path") {
        return (Some(template_path.to_string()), "$path".len());
    }

    (None, 0)
}

/// Longest leading identifier run (letters, digits, underscore)
fn leading_identifier(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(s.len());
    &s[..end]
}

/// Render a JSON value as template text: bare strings without quotes,
/// everything else in JSON notation.
fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_strips_prefix() {
        assert_eq!(resolve("/bp/foo/bar", "/bp"), "foo/bar");
        assert_eq!(filename(&resolve("/bp/foo/bar", "/bp"), "htm"), "foo/bar.htm");
    }

    #[test]
    fn test_resolve_trailing_slash_and_query() {
        assert_eq!(resolve("/bp/foo/bar/", "/bp"), "foo/bar");
        assert_eq!(resolve("/bp/foo?x=1", "/bp"), "foo");
    }

    #[test]
    fn test_resolve_prefix_root_is_index() {
        assert_eq!(resolve("/bp", "/bp"), "index");
        assert_eq!(resolve("/bp/", "/bp"), "index");
        assert_eq!(resolve("/", ""), "index");
    }

    #[test]
    fn test_resolve_empty_prefix() {
        assert_eq!(resolve("/foo/bar", ""), "foo/bar");
    }

    #[test]
    fn test_locate_rejects_traversal() {
        let site = SiteConfig {
            mount_prefix: "/bp".to_string(),
            template_dir: "templates".to_string(),
            template_ext: "htm".to_string(),
            static_prefix: "/static".to_string(),
            static_dir: "static".to_string(),
            env: HashMap::new(),
        };
        assert!(locate(&site, "../etc/passwd").is_none());
        assert!(locate(&site, "foo/../bar").is_none());
        assert!(locate(&site, "foo//bar").is_none());
        assert!(locate(&site, "foo/bar").is_some());
    }

    #[test]
    fn test_substitute_path_env_data() {
        let mut env = HashMap::new();
        env.insert("title".to_string(), "Demo".to_string());
        let data = json!({"x": 1, "name": "ada"});

        let out = substitute(
            "<h1>$env.title</h1><p>$path</p><p>$data.name=$data.x</p>",
            "foo/bar",
            &env,
            &data,
        );
        assert_eq!(out, "<h1>Demo</h1><p>foo/bar</p><p>ada=1</p>");
    }

    #[test]
    fn test_substitute_unknown_keys_are_empty() {
        let env = HashMap::new();
        let out = substitute("[$env.missing][$data.missing]", "p", &env, &json!({}));
        assert_eq!(out, "[][]");
    }

    #[test]
    fn test_substitute_keeps_literal_dollars() {
        let env = HashMap::new();
        let out = substitute("price: $5, $unknown", "p", &env, &json!({}));
        assert_eq!(out, "price: $5, $unknown");
    }

    #[tokio::test]
    async fn test_render_missing_template_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let site = SiteConfig {
            mount_prefix: "/bp".to_string(),
            template_dir: dir.path().to_string_lossy().into_owned(),
            template_ext: "htm".to_string(),
            static_prefix: "/static".to_string(),
            static_dir: "static".to_string(),
            env: HashMap::new(),
        };
        let env = HashMap::new();
        assert!(render(&site, "nope", &env, &json!({})).await.is_none());
    }

    #[tokio::test]
    async fn test_render_reads_and_substitutes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("foo")).expect("mkdir");
        std::fs::write(dir.path().join("foo/bar.htm"), "path=$path").expect("write");

        let site = SiteConfig {
            mount_prefix: "/bp".to_string(),
            template_dir: dir.path().to_string_lossy().into_owned(),
            template_ext: "htm".to_string(),
            static_prefix: "/static".to_string(),
            static_dir: "static".to_string(),
            env: HashMap::new(),
        };
        let env = HashMap::new();
        let out = render(&site, "foo/bar", &env, &json!({})).await;
        assert_eq!(out.as_deref(), Some("path=foo/bar"));
    }
}
