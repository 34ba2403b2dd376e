//! Storage key layout: `{user_id}/{yyyy_mm_dd}/{hh_mm}_{uuid}.{ext}`

use chrono::{DateTime, Utc};
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 5;

/// Build a collision-free key that sorts chronologically per user.
///
/// The extension comes from the uploaded file name when it is a short
/// alphanumeric suffix, then from the content type, and falls back to `jpg`.
pub fn avatar_key(
    user_id: Uuid,
    filename: Option<&str>,
    content_type: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}/{}/{}_{}.{}",
        user_id,
        now.format("%Y_%m_%d"),
        now.format("%H_%M"),
        Uuid::new_v4(),
        extension(filename, content_type)
    )
}

fn extension(filename: Option<&str>, content_type: &str) -> String {
    // client-supplied, must not add path segments to the key
    if let Some((_, ext)) = filename.and_then(|name| name.rsplit_once('.'))
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return ext.to_lowercase();
    }
    match mime_guess::get_mime_extensions_str(content_type) {
        Some(exts) if exts.contains(&DEFAULT_EXTENSION) => DEFAULT_EXTENSION.to_string(),
        Some([first, ..]) => first.to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_layout() {
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 0).unwrap();
        let key = avatar_key(user, Some("Me.PNG"), "image/png", now);

        let prefix = format!("{}/2025_03_07/09_05_", user);
        assert!(key.starts_with(&prefix), "{key}");
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_extension_fallbacks() {
        assert_eq!(extension(Some("photo.jpeg"), "image/jpeg"), "jpeg");
        assert_eq!(extension(Some("noext"), "image/webp"), "webp");
        assert_eq!(extension(None, "image/jpeg"), "jpg");
        assert_eq!(extension(None, "application/x-unknown-thing"), "jpg");
    }

    #[test]
    fn test_unsafe_filename_suffix_is_ignored() {
        let user = Uuid::new_v4();
        let key = avatar_key(user, Some("me.x/../../victim/evil"), "image/png", Utc::now());
        assert_eq!(key.split('/').count(), 3, "{key}");
        assert!(key.ends_with(".png"), "{key}");

        assert_eq!(extension(Some("photo.j pg"), "image/png"), "png");
        assert_eq!(extension(Some("photo.averylongsuffix"), "image/webp"), "webp");
        assert_eq!(extension(Some("photo."), "image/jpeg"), "jpg");
    }

    #[test]
    fn test_keys_do_not_collide() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        assert_ne!(
            avatar_key(user, None, "image/png", now),
            avatar_key(user, None, "image/png", now)
        );
    }
}
