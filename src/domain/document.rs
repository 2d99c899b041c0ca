//! Folder and Document Entities
//!
//! Documents live in folders scoped to one area and one dashboard module.
//! The file bytes sit in object storage; these rows are the metadata.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use super::entity::Entity;

/// A document folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Hex color, e.g. "#2563EB"
    pub color: String,
    /// `dd/mm/yyyy`
    pub date: String,
    pub area_id: Uuid,
    pub module_type: String,
}

impl Entity for Folder {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Input for creating a folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewFolder {
    pub name: String,
    pub category: String,
    pub color: String,
    /// Defaults to today when empty
    pub date: String,
    pub area_id: Uuid,
    pub module_type: String,
}

/// Metadata row for a stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub folder_id: Uuid,
    pub file_type: String,
    pub file_size: i64,
    pub file_url: String,
    /// Object key inside the bucket
    pub storage_path: String,
    pub area_id: Uuid,
    pub module_type: String,
    pub created_at: Option<String>,
}

impl Entity for Document {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// File handed over by the UI for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type reported by the browser, if any
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
            content_type: None,
        }
    }

    /// Lowercase extension, `bin` when the name has none
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Reported MIME type, else guessed from the file name
    pub fn mime_type(&self) -> String {
        match self.content_type.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(c) => c.to_string(),
            None => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// Object key: `documentos/{areaId}/{moduleType}/{folderId}/{generatedId}.{ext}`
pub fn object_key(folder: &Folder, generated_id: Uuid, extension: &str) -> String {
    format!(
        "documentos/{}/{}/{}/{}.{}",
        folder.area_id, folder.module_type, folder.id, generated_id, extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_and_mime() {
        let file = UploadFile::new("Informe Final.PDF", vec![1, 2, 3]);
        assert_eq!(file.extension(), "pdf");
        assert_eq!(file.mime_type(), "application/pdf");

        let bare = UploadFile::new("LEEME", vec![]);
        assert_eq!(bare.extension(), "bin");
        assert_eq!(bare.mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_reported_content_type_wins() {
        let mut file = UploadFile::new("foto.png", vec![]);
        file.content_type = Some("image/webp".into());
        assert_eq!(file.mime_type(), "image/webp");
    }

    #[test]
    fn test_object_key_layout() {
        let folder = Folder {
            id: Uuid::from_u128(2),
            name: "Actas".into(),
            category: "Soportes".into(),
            color: "#000000".into(),
            date: "01/01/2025".into(),
            area_id: Uuid::from_u128(1),
            module_type: "plan-accion".into(),
        };
        let key = object_key(&folder, Uuid::from_u128(3), "pdf");
        assert_eq!(
            key,
            format!(
                "documentos/{}/plan-accion/{}/{}.pdf",
                Uuid::from_u128(1),
                Uuid::from_u128(2),
                Uuid::from_u128(3)
            )
        );
    }
}
