use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::{Component, Path};

use super::media::MediaKind;

const OCTET_STREAM: &str = "application/octet-stream";

/// A file selected by the user, before validation.
///
/// `size` is the declared byte size. It matches `data.len()` for files built
/// with [`CandidateFile::new`] or [`CandidateFile::from_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub data: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Build a file whose declared size differs from the bytes held, e.g. a
    /// handle whose content is streamed later.
    pub fn from_parts(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            data: data.into(),
        }
    }

    /// Read a local file. The MIME type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string();

        Ok(Self::new(name, mime_type, data))
    }

    /// Lowercase file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Declared MIME type, normalized and without parameters. Empty or
    /// generic binary types are resolved from the file extension; unknown
    /// extensions yield `""`.
    pub fn effective_mime_type(&self) -> String {
        let declared = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !declared.is_empty() && declared != OCTET_STREAM {
            return declared;
        }

        mime_guess::from_path(&self.name)
            .first_raw()
            .map(|m| m.to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime_type(&self.effective_mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_takes_size_from_data() {
        let file = CandidateFile::new("a.png", "image/png", vec![1u8, 2, 3]);
        assert_eq!(file.size, 3);
        assert_eq!(file.kind(), MediaKind::Image);
    }

    #[test]
    fn test_effective_mime_type_falls_back_to_extension() {
        let file = CandidateFile::new("report.PDF", "", Vec::new());
        assert_eq!(file.effective_mime_type(), "application/pdf");

        let file = CandidateFile::new("clip.mp4", "application/octet-stream", Vec::new());
        assert_eq!(file.effective_mime_type(), "video/mp4");

        let file = CandidateFile::new("mystery", "", Vec::new());
        assert_eq!(file.effective_mime_type(), "");
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        let file = CandidateFile::new("photo.txt", " Image/PNG ", Vec::new());
        assert_eq!(file.effective_mime_type(), "image/png");
    }

    #[test]
    fn test_mime_parameters_ignored() {
        let file = CandidateFile::new("notes.txt", "text/plain; charset=utf-8", Vec::new());
        assert_eq!(file.effective_mime_type(), "text/plain");

        let file = CandidateFile::new("clip.mp4", "application/octet-stream; x=1", Vec::new());
        assert_eq!(file.effective_mime_type(), "video/mp4");
    }

    #[test]
    fn test_extension_lowercased() {
        let file = CandidateFile::new("Archive.ZIP", "", Vec::new());
        assert_eq!(file.extension().as_deref(), Some("zip"));
        assert_eq!(CandidateFile::new("noext", "", Vec::new()).extension(), None);
    }

    #[test]
    fn test_from_path_reads_bytes_and_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"a,b\n1,2\n").unwrap();

        let file = CandidateFile::from_path(&path).unwrap();
        assert_eq!(file.name, "notes.csv");
        assert_eq!(file.mime_type, "text/csv");
        assert_eq!(file.size, 8);
    }

    #[test]
    fn test_from_path_rejects_parent_components() {
        assert!(CandidateFile::from_path("../etc/passwd").is_err());
    }
}
