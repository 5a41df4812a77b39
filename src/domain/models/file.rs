#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// Maximum number of documents a single session may hold.
pub const MAX_FILES: usize = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Txt,
    Docx,
}

impl DocumentType {
    pub fn parse(extension: &str) -> Option<DocumentType> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        return DocumentType::iter().find(|e| return e.to_string() == extension);
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentType::Pdf => return "application/pdf",
            DocumentType::Txt => return "text/plain",
            DocumentType::Docx => {
                return "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn accepted() -> String {
        return DocumentType::iter()
            .map(|e| return format!(".{e}"))
            .collect::<Vec<String>>()
            .join(", ");
    }
}

/// A locally chosen document that has not been submitted yet. The contents are
/// only read when the upload request is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    pub path: path::PathBuf,
    pub name: String,
    pub document_type: DocumentType,
}

impl FileHandle {
    pub fn from_path(file_path: &str) -> Result<FileHandle> {
        let path = path::PathBuf::from(file_path);
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => bail!(format!("{file_path} is not a file")),
        };

        let extension = path
            .extension()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_default();

        let document_type = match DocumentType::parse(&extension) {
            Some(document_type) => document_type,
            None => bail!(format!(
                "{name} is not a supported document. Accepted types are {}",
                DocumentType::accepted()
            )),
        };

        if !path.is_file() {
            bail!(format!("No file found at {file_path}"));
        }

        return Ok(FileHandle {
            path,
            name,
            document_type,
        });
    }
}

/// A document the backend confirmed as ingested for the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
}

impl UploadedFile {
    /// Builds the inventory in server order. A name the server repeats keeps its
    /// first position.
    pub fn from_names(names: Vec<String>) -> Vec<UploadedFile> {
        let mut files: Vec<UploadedFile> = vec![];
        for name in names {
            if files.iter().any(|e| return e.name == name) {
                continue;
            }
            files.push(UploadedFile { name });
        }

        return files;
    }
}
