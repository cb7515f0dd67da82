//! Object storage buckets and path rules.
//!
//! Objects live under `<STORAGE_ROOT>/<bucket>/<path>`. Task uploads use
//! `<task_id>/<file_name>` so the owning task can be resolved from the
//! path alone when authorising downloads.

use uuid::Uuid;

use crate::error::CoreError;

pub const BUCKET_TASK_UPLOADS: &str = "task-uploads";
pub const BUCKET_PORTFOLIOS: &str = "portfolios";
pub const BUCKET_PAYMENT_PROOFS: &str = "payment-proofs";

pub const BUCKETS: &[&str] = &[BUCKET_TASK_UPLOADS, BUCKET_PORTFOLIOS, BUCKET_PAYMENT_PROOFS];

/// Maximum length of a single path segment.
const MAX_SEGMENT_LEN: usize = 255;

/// Split and validate a relative object path.
///
/// Rejects empty paths, empty segments, `.`/`..`, backslashes, NUL and
/// other control characters, and over-long segments.
pub fn validate_object_path(path: &str) -> Result<Vec<&str>, CoreError> {
    if path.is_empty() {
        return Err(CoreError::Validation("object path must not be empty".into()));
    }
    if path.starts_with('/') {
        return Err(CoreError::Validation("object path must be relative".into()));
    }

    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments {
        if segment.is_empty() || *segment == "." || *segment == ".." {
            return Err(CoreError::Validation(format!(
                "invalid path segment '{segment}'"
            )));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(CoreError::Validation("path segment too long".into()));
        }
        if segment.contains('\\') || segment.chars().any(char::is_control) {
            return Err(CoreError::Validation(
                "path segment contains forbidden characters".into(),
            ));
        }
    }
    Ok(segments)
}

/// Resolve the owning task from a `task-uploads` object path.
pub fn task_id_from_upload_path(path: &str) -> Result<Uuid, CoreError> {
    let segments = validate_object_path(path)?;
    if segments.len() < 2 {
        return Err(CoreError::Validation(
            "task upload paths are <task_id>/<file_name>".into(),
        ));
    }
    Uuid::parse_str(segments[0])
        .map_err(|_| CoreError::Validation("task upload path must start with a task id".into()))
}

/// Reduce a client-supplied file name to a safe single segment.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes
/// `_`. Leading dots are stripped so uploads can never be hidden files.
pub fn sanitize_file_name(name: &str) -> Result<String, CoreError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.len() > MAX_SEGMENT_LEN {
        return Err(CoreError::Validation("invalid file name".into()));
    }
    Ok(cleaned)
}

/// Guess a `Content-Type` from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected() {
        assert!(validate_object_path("../etc/passwd").is_err());
        assert!(validate_object_path("a/../../b").is_err());
        assert!(validate_object_path("/abs/path").is_err());
        assert!(validate_object_path("a//b").is_err());
        assert!(validate_object_path("a\\..\\b").is_err());
        assert!(validate_object_path("").is_err());
    }

    #[test]
    fn nested_paths_are_accepted() {
        let segments = validate_object_path("abc/def/clip.mp4").unwrap();
        assert_eq!(segments, vec!["abc", "def", "clip.mp4"]);
    }

    #[test]
    fn task_id_is_taken_from_first_segment() {
        let id = "0f8fad5b-d9cb-469f-a165-70867728950e";
        let parsed = task_id_from_upload_path(&format!("{id}/final.mp4")).unwrap();
        assert_eq!(parsed.to_string(), id);
        assert!(task_id_from_upload_path(id).is_err());
        assert!(task_id_from_upload_path("not-a-task/final.mp4").is_err());
    }

    #[test]
    fn file_names_are_sanitised() {
        assert_eq!(sanitize_file_name("My Clip (1).mp4").unwrap(), "My_Clip__1_.mp4");
        assert_eq!(sanitize_file_name("../../.env").unwrap(), "env");
        assert_eq!(sanitize_file_name("C:\\Users\\x\\a.png").unwrap(), "a.png");
        assert!(sanitize_file_name("...").is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a/b/clip.MP4"), "video/mp4");
        assert_eq!(content_type_for("proof.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
