//! Document and collection locators.
//!
//! A path alternates collection and document segments: a document path has an
//! even number of segments (`version/1/user/abc`), a collection path an odd one
//! (`version/1/user`). References are plain values; they carry the project
//! they belong to but no store handle.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::OdmError;

const AUTO_ID_LENGTH: usize = 20;
const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random 20 character document id.
pub fn auto_id() -> String {
    let mut rng = rand::rng();
    (0..AUTO_ID_LENGTH)
        .map(|_| AUTO_ID_ALPHABET[rng.random_range(0..AUTO_ID_ALPHABET.len())] as char)
        .collect()
}

fn segments(path: &str) -> Result<Vec<&str>, OdmError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(OdmError::InvalidPath(format!("empty path '{}'", path)));
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(OdmError::InvalidPath(format!("empty segment in '{}'", path)));
    }
    Ok(parts)
}

fn check_project(project_id: &str) -> Result<(), OdmError> {
    if project_id.is_empty() {
        return Err(OdmError::InvalidPath("empty project id".into()));
    }
    Ok(())
}

/// Locates a single document: project + document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    project_id: String,
    path: String,
}

impl DocumentReference {
    pub fn new(project_id: impl Into<String>, path: impl AsRef<str>) -> Result<Self, OdmError> {
        let project_id = project_id.into();
        check_project(&project_id)?;
        let parts = segments(path.as_ref())?;
        if parts.len() % 2 != 0 {
            return Err(OdmError::InvalidPath(format!(
                "'{}' is not a document path",
                path.as_ref()
            )));
        }
        Ok(DocumentReference {
            project_id,
            path: parts.join("/"),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The terminal path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The collection that contains this document.
    pub fn parent(&self) -> CollectionReference {
        let parent = match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        };
        CollectionReference {
            project_id: self.project_id.clone(),
            path: parent.to_string(),
        }
    }

    /// A collection nested under this document. `path` may itself span several
    /// segments as long as it names a collection.
    pub fn collection(&self, path: &str) -> Result<CollectionReference, OdmError> {
        CollectionReference::new(self.project_id.clone(), format!("{}/{}", self.path, path))
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/documents/{}", self.project_id, self.path)
    }
}

/// Locates a collection: project + collection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionReference {
    project_id: String,
    path: String,
}

impl CollectionReference {
    pub fn new(project_id: impl Into<String>, path: impl AsRef<str>) -> Result<Self, OdmError> {
        let project_id = project_id.into();
        check_project(&project_id)?;
        let parts = segments(path.as_ref())?;
        if parts.len() % 2 == 0 {
            return Err(OdmError::InvalidPath(format!(
                "'{}' is not a collection path",
                path.as_ref()
            )));
        }
        Ok(CollectionReference {
            project_id,
            path: parts.join("/"),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The document owning this collection, `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference> {
        let idx = self.path.rfind('/')?;
        Some(DocumentReference {
            project_id: self.project_id.clone(),
            path: self.path[..idx].to_string(),
        })
    }

    /// A new document with a generated id.
    pub fn doc(&self) -> DocumentReference {
        DocumentReference {
            project_id: self.project_id.clone(),
            path: format!("{}/{}", self.path, auto_id()),
        }
    }

    /// The document with the given id (or relative document path).
    pub fn doc_with_id(&self, id: &str) -> Result<DocumentReference, OdmError> {
        DocumentReference::new(self.project_id.clone(), format!("{}/{}", self.path, id))
    }
}

impl fmt::Display for CollectionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/documents/{}", self.project_id, self.path)
    }
}
