// --- File: crates/appointly_config/src/lib.rs ---
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod env_vars;
pub mod models;

pub use env_vars::SECRET_MARKER;
pub use models::*;

/// Loads the layered application configuration.
///
/// Sources, later ones winning:
/// 1. `config/default.{toml,yaml,json}`
/// 2. `config/{RUN_ENV}.*` (`RUN_ENV` defaults to `debug`)
/// 3. environment variables `APPOINTLY__SECTION__KEY`
///
/// The config directory is `CONFIG_DIR` if set, otherwise `config/` at the
/// workspace root. Afterwards every `secret_from_env` value is resolved, see
/// [`env_vars::inject_env_vars`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let config_dir = config_dir();

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading configuration from {} (RUN_ENV={})",
        config_dir.display(),
        run_env
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(env_vars::CONFIG_PREFIX)
                .prefix_separator(env_vars::CONFIG_SEPARATOR)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        );

    let mut raw: serde_json::Value = builder.build()?.try_deserialize()?;
    env_vars::inject_env_vars(&mut raw);

    serde_json::from_value(raw)
        .map_err(|err| ConfigError::Message(format!("invalid configuration: {err}")))
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    // crates/appointly_config -> workspace root
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(|root| root.join("config"))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("config"))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// The file is taken from `DOTENV_OVERRIDE`, else from the first command line
/// argument if it starts with `.env`, else `.env`. Returns the path used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
