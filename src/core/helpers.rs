use std::collections::HashMap;
use std::path::Path;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::multipart::Multipart;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use regex::Regex;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Case-insensitive substring matcher used by both store backends.
pub fn search_pattern(query: &str) -> Regex {
    Regex::new(&format!("(?i){}", regex::escape(query))).expect("escaped pattern is valid")
}

// === Stored images ===

const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// Stored filename for an upload: epoch millis plus the original extension.
/// Returns None when the extension is not an accepted image type.
pub fn image_filename(original: &str) -> Option<String> {
    let ext = Path::new(original).extension()?.to_str()?.to_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(format!("{}.{}", Utc::now().timestamp_millis(), ext))
}

/// A validated image upload pulled out of a multipart form.
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Collects the text fields of a multipart form. The field named
/// `file_field` is treated as the image upload; anything that is not an
/// accepted image type is rejected outright.
pub async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(HashMap<String, String>, Option<ImageUpload>), crate::core::errors::ApiError> {
    use crate::core::errors::ApiError;

    let mut fields = HashMap::new();
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field {
            let original = field.file_name().unwrap_or_default().to_string();
            if original.is_empty() {
                // File input submitted without a selection.
                continue;
            }
            let filename = image_filename(&original)
                .ok_or_else(|| ApiError::BadRequest("Only image files are allowed".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            image = Some(ImageUpload {
                filename,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }
    Ok((fields, image))
}

pub async fn save_image(dir: &Path, filename: &str, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(filename), bytes).await?;
    Ok(())
}

/// Best-effort removal; a missing file is not an error.
pub async fn remove_image(dir: &Path, filename: &str) {
    if let Err(e) = tokio::fs::remove_file(dir.join(filename)).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove image {filename}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn search_pattern_is_case_insensitive_substring() {
        let p = search_pattern("ali");
        assert!(p.is_match("Alice123"));
        assert!(p.is_match("natALIe"));
        assert!(!p.is_match("bob"));
    }

    #[test]
    fn search_pattern_escapes_regex_metacharacters() {
        let p = search_pattern("a.b");
        assert!(p.is_match("A.B"));
        assert!(!p.is_match("axb"));
    }

    #[test]
    fn image_filename_accepts_known_extensions_only() {
        assert!(image_filename("selfie.PNG").unwrap().ends_with(".png"));
        assert!(image_filename("pic.jpeg").is_some());
        assert!(image_filename("script.exe").is_none());
        assert!(image_filename("noextension").is_none());
    }
}
