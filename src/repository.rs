//! Repository marker and properties
//!
//! A directory is a repository when it holds the marker file. The marker is a
//! small TOML document carrying the repository properties.

use crate::error::ApiError;
use crate::types::{DEFAULT_FOLDER_SIZE, ERROR_FOLDER_NAME, MARKER_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Properties stored in the marker file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryProperties {
    #[serde(rename = "folderSize", default = "default_folder_size")]
    pub folder_size: usize,
}

fn default_folder_size() -> usize {
    DEFAULT_FOLDER_SIZE
}

impl Default for RepositoryProperties {
    fn default() -> Self {
        Self {
            folder_size: DEFAULT_FOLDER_SIZE,
        }
    }
}

impl RepositoryProperties {
    /// Property keys that `set` accepts
    pub const MODIFIABLE: [&'static str; 1] = ["folderSize"];

    /// Apply one `key=value` assignment
    pub fn set(&mut self, assignment: &str) -> Result<(), ApiError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ApiError::InvalidProperty(format!("value is missing for property {}", assignment))
        })?;
        match key.trim() {
            "folderSize" => {
                self.folder_size = parse_folder_size(value.trim())?;
                Ok(())
            }
            other => Err(ApiError::InvalidProperty(format!(
                "unknown or read-only property {}",
                other
            ))),
        }
    }
}

/// Positive folder size threshold
pub fn parse_folder_size(value: &str) -> Result<usize, ApiError> {
    match value.parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ApiError::InvalidProperty(format!(
            "folderSize must be a positive integer, got '{}'",
            value
        ))),
    }
}

/// An initialized repository root
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    properties: RepositoryProperties,
}

impl Repository {
    /// Mark `dir` as a repository and create its error folder
    pub fn init(dir: &Path, folder_size: Option<usize>) -> Result<Self, ApiError> {
        let root = dunce::canonicalize(dir)?;
        let marker = root.join(MARKER_FILE_NAME);
        if marker.exists() {
            return Err(ApiError::AlreadyInitialized(root));
        }
        let properties = RepositoryProperties {
            folder_size: match folder_size {
                Some(0) => {
                    return Err(ApiError::InvalidProperty(
                        "folderSize must be a positive integer, got '0'".to_string(),
                    ))
                }
                Some(size) => size,
                None => DEFAULT_FOLDER_SIZE,
            },
        };

        let repository = Self { root, properties };
        repository.save()?;
        fs::create_dir_all(repository.error_folder())?;
        info!(
            root = %repository.root.display(),
            folder_size = repository.properties.folder_size,
            "Initialized repository"
        );
        Ok(repository)
    }

    /// Open the repository at `dir`; only the marker file is required
    pub fn open(dir: &Path) -> Result<Self, ApiError> {
        let root = match dunce::canonicalize(dir) {
            Ok(root) => root,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ApiError::NotARepository(dir.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        let marker = root.join(MARKER_FILE_NAME);
        let contents = match fs::read_to_string(&marker) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::NotARepository(root)),
            Err(e) => return Err(e.into()),
        };
        let properties: RepositoryProperties = toml::from_str(&contents)?;
        if properties.folder_size == 0 {
            return Err(ApiError::InvalidProperty(
                "folderSize must be a positive integer, got '0'".to_string(),
            ));
        }
        Ok(Self { root, properties })
    }

    /// Whether `dir` holds both the marker file and the error folder
    pub fn is_valid(dir: &Path) -> bool {
        dir.join(MARKER_FILE_NAME).is_file() && dir.join(ERROR_FOLDER_NAME).is_dir()
    }

    /// Fail unless the error folder exists next to the marker
    pub fn require_valid(&self) -> Result<(), ApiError> {
        if Self::is_valid(&self.root) {
            Ok(())
        } else {
            Err(ApiError::NotARepository(self.root.clone()))
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn properties(&self) -> &RepositoryProperties {
        &self.properties
    }

    pub fn threshold(&self) -> usize {
        self.properties.folder_size
    }

    pub fn error_folder(&self) -> PathBuf {
        self.root.join(ERROR_FOLDER_NAME)
    }

    /// Apply `key=value` assignments and persist them; nothing is written if one is invalid
    pub fn set_properties<S: AsRef<str>>(&mut self, assignments: &[S]) -> Result<(), ApiError> {
        if assignments.is_empty() {
            return Err(ApiError::InvalidArgument("property arguments missing".to_string()));
        }
        let mut updated = self.properties.clone();
        for assignment in assignments {
            updated.set(assignment.as_ref())?;
        }
        self.properties = updated;
        self.save()
    }

    fn save(&self) -> Result<(), ApiError> {
        let contents = toml::to_string(&self.properties)?;
        fs::write(self.root.join(MARKER_FILE_NAME), contents)?;
        Ok(())
    }

    /// Remove the marker and the error folder if empty.
    ///
    /// Returns `false` when the error folder still holds files and was kept.
    pub fn delete(self) -> Result<bool, ApiError> {
        fs::remove_file(self.root.join(MARKER_FILE_NAME))?;
        let error_folder = self.error_folder();
        let removed = match fs::remove_dir(&error_folder) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %error_folder.display(), error = %e, "Keeping error folder");
                false
            }
        };
        info!(root = %self.root.display(), "Deleted repository");
        Ok(removed)
    }
}
