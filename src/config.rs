use std::path::PathBuf;
use std::{env, fmt::Display, str::FromStr};

use tracing::info;

/// Startup configuration, loaded once and passed into the app state.
/// Handlers never read the environment themselves.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// When unset, the in-memory store is used instead of MongoDB.
    pub mongo_uri: Option<String>,
    pub mongo_db: String,
    pub token_expiration_hours: i64,
    /// Root for stored images; `profile/images` and `post/images` live
    /// under it and are served back at the matching static paths.
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PERCH_PORT", "5000"),
            mongo_uri: env::var("PERCH_MONGO_URI").ok(),
            mongo_db: try_load("PERCH_MONGO_DB", "perch"),
            token_expiration_hours: try_load("PERCH_TOKEN_EXPIRATION_HOURS", "720"),
            upload_dir: PathBuf::from(try_load::<String>("PERCH_UPLOAD_DIR", "uploads")),
        }
    }

    pub fn profile_image_dir(&self) -> PathBuf {
        self.upload_dir.join("profile/images")
    }

    pub fn post_image_dir(&self) -> PathBuf {
        self.upload_dir.join("post/images")
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .unwrap_or_else(|e| panic!("Invalid {key} value: {e}"))
}
