//! Create and edit forms.
//!
//! Forms own their field values until the request they produce succeeds.
//! A failed submit leaves every field intact for a retry.

use complib_gateway::{Component, ComponentPatch};
use complib_ids::ComponentId;
use std::fs;
use std::path::Path;

use super::error::CatalogError;
use super::tags::TagEditor;

/// Largest preview image accepted at selection time (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A preview image picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Read an image from disk.
    ///
    /// The size limit is checked against file metadata before any bytes are
    /// read, so oversize files are never loaded.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let unreadable = |reason: String| CatalogError::ImageUnreadable {
            path: path.display().to_string(),
            reason,
        };
        let metadata = fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
        if !metadata.is_file() {
            return Err(unreadable("not a regular file".to_string()));
        }
        check_image_size(metadata.len())?;
        let bytes = fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, bytes))
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn check_image_size(size: u64) -> Result<(), CatalogError> {
    if size > MAX_IMAGE_BYTES {
        return Err(CatalogError::ImageTooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

fn require_text(name: &str, code: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if code.trim().is_empty() {
        return Err(CatalogError::EmptyCode);
    }
    Ok(())
}

/// Validated payload of a create submit.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub code: String,
    pub tags: Vec<String>,
    pub image: ImageFile,
}

/// The "add component" form.
#[derive(Debug, Clone, Default)]
pub struct CreateForm {
    pub name: String,
    pub code: String,
    pub tags: TagEditor,
    image: Option<ImageFile>,
    busy: bool,
    error: Option<String>,
}

impl CreateForm {
    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    /// Record the chosen image. Oversize files are refused and the previous
    /// selection, if any, is kept.
    pub fn select_image(&mut self, image: ImageFile) -> Result<(), CatalogError> {
        check_image_size(image.size())?;
        self.image = Some(image);
        Ok(())
    }

    pub fn select_image_path(&mut self, path: &Path) -> Result<(), CatalogError> {
        let image = ImageFile::from_path(path)?;
        self.select_image(image)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Validate the fields into a request without consuming them.
    pub fn prepare(&self) -> Result<CreateRequest, CatalogError> {
        let image = self.image.clone().ok_or(CatalogError::MissingImage)?;
        require_text(&self.name, &self.code)?;
        Ok(CreateRequest {
            name: self.name.clone(),
            code: self.code.clone(),
            tags: self.tags.tags().to_vec(),
            image,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The "edit component" form. The image is not editable here.
#[derive(Debug, Clone)]
pub struct EditForm {
    id: ComponentId,
    original_name: String,
    pub name: String,
    pub code: String,
    pub tags: TagEditor,
    busy: bool,
    error: Option<String>,
}

impl EditForm {
    pub fn from_component(component: &Component) -> Self {
        Self {
            id: component.id.clone(),
            original_name: component.name.clone(),
            name: component.name.clone(),
            code: component.code.clone(),
            tags: TagEditor::new(component.tags.clone()),
            busy: false,
            error: None,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Partial update carrying name, code and tags.
    pub fn prepare(&self) -> Result<ComponentPatch, CatalogError> {
        require_text(&self.name, &self.code)?;
        Ok(ComponentPatch {
            name: Some(self.name.clone()),
            code: Some(self.code.clone()),
            tags: Some(self.tags.tags().to_vec()),
        })
    }
}
