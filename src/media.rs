//! Storage for uploaded files.

use std::io::ErrorKind;
use std::path::Path;

use axum::body::Bytes;
use axum_typed_multipart::FieldData;
use rand::SeedableRng;
use rand::distr::{Alphanumeric, Distribution};
use rand::rngs::StdRng;
use tokio::io::AsyncWriteExt;

/// Directory for announcement and meeting uploads.
pub const UPLOAD_DIR: &str = "uploads/files";
/// Directory for abstract media.
pub const ABSTRACT_MEDIA_DIR: &str = "meetings/files";

/// Returns the upload if a file was actually chosen. Browsers send an empty
/// part for file inputs left blank.
pub fn nonempty_upload(field: Option<FieldData<Bytes>>) -> Option<FieldData<Bytes>> {
    field.filter(|f| !f.contents.is_empty())
}

/// Writes an uploaded file under `media_root/dir`, picking a new name if the
/// file name is taken. Returns the path relative to `media_root`.
pub async fn save_upload(
    media_root: &Path,
    dir: &str,
    file_name: Option<&str>,
    contents: &[u8],
) -> std::io::Result<String> {
    let dir_path = media_root.join(dir);
    tokio::fs::create_dir_all(&dir_path).await?;

    let file_name = sanitize_file_name(file_name.unwrap_or_default());
    let mut candidate = file_name.clone();
    loop {
        let open_result = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir_path.join(&candidate))
            .await;
        match open_result {
            Ok(mut file) => {
                file.write_all(contents).await?;
                file.flush().await?;
                let stored = format!("{dir}/{candidate}");
                tracing::info!(path = stored, bytes = contents.len(), "saved upload");
                return Ok(stored);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = with_random_suffix(&file_name);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Files saved while handling one form. If the form is not stored, the
/// files are removed again.
#[derive(Debug)]
pub struct UploadBatch<'a> {
    media_root: &'a Path,
    saved: Vec<String>,
}

impl<'a> UploadBatch<'a> {
    pub fn new(media_root: &'a Path) -> Self {
        Self {
            media_root,
            saved: vec![],
        }
    }

    /// Saves a multipart upload, if there is one.
    pub async fn save(
        &mut self,
        dir: &str,
        field: Option<FieldData<Bytes>>,
    ) -> std::io::Result<Option<String>> {
        match nonempty_upload(field) {
            Some(field) => self
                .save_contents(dir, field.metadata.file_name.as_deref(), &field.contents)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    async fn save_contents(
        &mut self,
        dir: &str,
        file_name: Option<&str>,
        contents: &[u8],
    ) -> std::io::Result<String> {
        match save_upload(self.media_root, dir, file_name, contents).await {
            Ok(path) => {
                self.saved.push(path.clone());
                Ok(path)
            }
            Err(e) => {
                self.remove_saved().await;
                Err(e)
            }
        }
    }

    /// Keeps the saved files if `result` is `Ok`, and removes them otherwise.
    pub async fn finish<T, E>(mut self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.remove_saved().await;
        }
        result
    }

    async fn remove_saved(&mut self) {
        for path in self.saved.drain(..) {
            match tokio::fs::remove_file(self.media_root.join(&path)).await {
                Ok(()) => tracing::info!(path, "removed unused upload"),
                Err(e) => tracing::warn!(path, "error removing unused upload: {e}"),
            }
        }
    }
}

/// Keeps only the last path component and replaces characters that are
/// awkward in URLs.
fn sanitize_file_name(name: &str) -> String {
    let name = crate::util::basename(name.trim());
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_random_suffix(file_name: &str) -> String {
    let mut rng = StdRng::from_os_rng();
    let suffix = String::from_iter((0..7).map(|_| Alphanumeric.sample(&mut rng) as char));
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{file_name}_{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\My Files\\flyer 2016.pdf"), "flyer_2016.pdf");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn colliding_names_get_a_suffix() -> std::io::Result<()> {
        let media_root = tempfile::tempdir()?;

        let first = save_upload(media_root.path(), UPLOAD_DIR, Some("flyer.pdf"), b"one").await?;
        let second = save_upload(media_root.path(), UPLOAD_DIR, Some("flyer.pdf"), b"two").await?;

        assert_eq!(first, "uploads/files/flyer.pdf");
        assert_ne!(first, second);
        assert!(second.starts_with("uploads/files/flyer_"));
        assert!(second.ends_with(".pdf"));
        assert_eq!(std::fs::read(media_root.path().join(&first))?, b"one");
        assert_eq!(std::fs::read(media_root.path().join(&second))?, b"two");
        Ok(())
    }

    #[tokio::test]
    async fn failed_batch_removes_its_files() -> std::io::Result<()> {
        let media_root = tempfile::tempdir()?;

        let mut batch = UploadBatch::new(media_root.path());
        let kept = batch.save_contents(UPLOAD_DIR, Some("kept.pdf"), b"one").await?;
        batch.finish(Ok::<_, ()>(())).await.unwrap();
        assert!(media_root.path().join(&kept).exists());

        let mut batch = UploadBatch::new(media_root.path());
        let program = batch.save_contents(UPLOAD_DIR, Some("program.pdf"), b"two").await?;
        let flyer = batch.save_contents(UPLOAD_DIR, Some("flyer.pdf"), b"three").await?;
        assert!(batch.finish(Err::<(), _>("duplicate year")).await.is_err());
        assert!(!media_root.path().join(&program).exists());
        assert!(!media_root.path().join(&flyer).exists());
        assert!(media_root.path().join(&kept).exists());
        Ok(())
    }

    #[tokio::test]
    async fn empty_file_inputs_are_ignored() -> std::io::Result<()> {
        let media_root = tempfile::tempdir()?;
        let saved = UploadBatch::new(media_root.path()).save(UPLOAD_DIR, None).await?;
        assert_eq!(saved, None);
        Ok(())
    }
}
