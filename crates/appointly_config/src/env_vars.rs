//! Secrets kept out of the config files.
//!
//! A config value of `secret_from_env` is a placeholder. [`inject_env_vars`]
//! replaces it with `APPOINTLY_SECRET_<PATH>` or, if that is unset, the bare
//! `<PATH>`, where `<PATH>` is the value's dotted config path upper-cased with
//! `_` between segments. `google_oauth.client_secret` thus reads
//! `APPOINTLY_SECRET_GOOGLE_OAUTH_CLIENT_SECRET`, then
//! `GOOGLE_OAUTH_CLIENT_SECRET`.

use serde_json::Value;
use std::env;
use tracing::{debug, warn};

/// Prefix of the `APPOINTLY__SECTION__KEY` overrides layered by `load_config`.
pub const CONFIG_PREFIX: &str = "APPOINTLY";

/// Separator of the layered overrides.
pub const CONFIG_SEPARATOR: &str = "__";

/// Config value replaced from the environment at load time.
pub const SECRET_MARKER: &str = "secret_from_env";

pub const SECRET_PREFIX: &str = "APPOINTLY_SECRET";

/// Environment variable names tried for the secret at `path`, in order.
pub fn secret_env_vars(path: &str) -> [String; 2] {
    let bare = path.replace('.', "_").to_uppercase();
    [format!("{}_{}", SECRET_PREFIX, bare), bare]
}

fn lookup_secret(path: &str) -> Option<String> {
    secret_env_vars(path).into_iter().find_map(|name| {
        let value = env::var(&name).ok().filter(|v| !v.is_empty())?;
        debug!("Secret {} read from {}", path, name);
        Some(value)
    })
}

/// Replaces every [`SECRET_MARKER`] in `value` from the environment.
///
/// Returns whether anything was replaced. Markers without a matching
/// variable are left in place and logged.
pub fn inject_env_vars(value: &mut Value) -> bool {
    fn walk(path: &mut Vec<String>, value: &mut Value) -> bool {
        match value {
            Value::Object(map) => {
                let mut replaced = false;
                for (key, child) in map.iter_mut() {
                    path.push(key.clone());
                    replaced |= walk(path, child);
                    path.pop();
                }
                replaced
            }
            Value::String(s) if s == SECRET_MARKER => {
                let dotted = path.join(".");
                match lookup_secret(&dotted) {
                    Some(secret) => {
                        *s = secret;
                        true
                    }
                    None => {
                        warn!("No environment value for secret {}", dotted);
                        false
                    }
                }
            }
            _ => false,
        }
    }

    walk(&mut Vec::new(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_env_var_names() {
        assert_eq!(
            secret_env_vars("google_oauth.client_secret"),
            [
                "APPOINTLY_SECRET_GOOGLE_OAUTH_CLIENT_SECRET".to_string(),
                "GOOGLE_OAUTH_CLIENT_SECRET".to_string()
            ]
        );
    }

    #[test]
    fn test_inject_env_vars_replaces_marker() {
        env::set_var(
            "APPOINTLY_SECRET_GOOGLE_OAUTH_CLIENT_SECRET",
            "from-the-environment",
        );
        let mut value = json!({
            "google_oauth": {
                "client_id": "abc.apps.googleusercontent.com",
                "client_secret": "secret_from_env"
            }
        });

        assert!(inject_env_vars(&mut value));
        assert_eq!(
            value["google_oauth"]["client_secret"],
            json!("from-the-environment")
        );
        assert_eq!(
            value["google_oauth"]["client_id"],
            json!("abc.apps.googleusercontent.com")
        );
        env::remove_var("APPOINTLY_SECRET_GOOGLE_OAUTH_CLIENT_SECRET");
    }

    #[test]
    fn test_inject_env_vars_falls_back_to_bare_name() {
        env::set_var("APPOINTLY_TEST_FIREBASE_API_KEY", "bare");
        let mut value = json!({"appointly_test": {"firebase": {"api_key": "secret_from_env"}}});

        assert!(inject_env_vars(&mut value));
        assert_eq!(value["appointly_test"]["firebase"]["api_key"], json!("bare"));
        env::remove_var("APPOINTLY_TEST_FIREBASE_API_KEY");
    }

    #[test]
    fn test_inject_env_vars_leaves_unresolved_marker() {
        let mut value = json!({"nothing_here": {"token": "secret_from_env"}});
        assert!(!inject_env_vars(&mut value));
        assert_eq!(value["nothing_here"]["token"], json!("secret_from_env"));
    }
}
