//! Launch import: a client-held list of files, each validated on entry and
//! uploaded independently.

use futures::{stream::FuturesUnordered, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::Result,
    orchestrator::Context,
    transport::UploadRequest,
    urls, ClientEvent,
};

pub const DEFAULT_IMPORT_PLUGIN: &str = "JUnit";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 32 * 1024 * 1024;
const DEFAULT_MIME_TYPES: &[&str] = &[
    "text/xml",
    "application/xml",
    "application/zip",
    "application/x-zip-compressed",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPluginDetails {
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub accept_file_mime_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportPlugin {
    pub name: String,
    #[serde(default)]
    pub details: ImportPluginDetails,
}

/// Picks the requested plugin, falling back to JUnit and then to the first one.
pub fn select_plugin<'a>(plugins: &'a [ImportPlugin], name: Option<&str>) -> Option<&'a ImportPlugin> {
    let by_name = |wanted: &str| plugins.iter().find(|plugin| plugin.name == wanted);
    name.and_then(by_name)
        .or_else(|| by_name(DEFAULT_IMPORT_PLUGIN))
        .or_else(|| plugins.first())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRules {
    pub max_file_size: u64,
    /// Empty means any type is accepted.
    pub accepted_mime_types: Vec<String>,
}

impl Default for ImportRules {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_mime_types: DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ImportRules {
    pub fn for_plugin(plugin: &ImportPlugin) -> Self {
        let defaults = Self::default();
        Self {
            max_file_size: plugin.details.max_file_size.unwrap_or(defaults.max_file_size),
            accepted_mime_types: if plugin.details.accept_file_mime_types.is_empty() {
                defaults.accepted_mime_types
            } else {
                plugin.details.accept_file_mime_types.clone()
            },
        }
    }

    pub fn validate(&self, name: &str, size: u64) -> std::result::Result<(), String> {
        if size > self.max_file_size {
            return Err(format!(
                "File size is more than {} Mb",
                self.max_file_size / (1024 * 1024)
            ));
        }
        if self.accepted_mime_types.is_empty() {
            return Ok(());
        }
        let accepted = mime_guess::from_path(name).iter().any(|mime| {
            self.accepted_mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mime.essence_str()))
        });
        if accepted {
            Ok(())
        } else {
            Err(format!("Incorrect file format: {name}"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub id: Uuid,
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
    pub valid: bool,
    pub validation_error: Option<String>,
    pub is_loading: bool,
    /// Settled, successfully or not.
    pub uploaded: bool,
    pub upload_failed: bool,
    pub upload_fail_reason: Option<String>,
}

impl ImportFile {
    fn needs_upload(&self) -> bool {
        self.valid && !(self.uploaded && !self.upload_failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub uploaded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    rules: ImportRules,
    files: Vec<ImportFile>,
}

impl ImportBatch {
    pub fn new(rules: ImportRules) -> Self {
        Self {
            rules,
            files: Vec::new(),
        }
    }

    /// Adds a candidate file; invalid files stay in the list with their reason.
    pub fn add_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Uuid {
        let name = name.into();
        let validation = self.rules.validate(&name, bytes.len() as u64);
        let id = Uuid::new_v4();
        self.files.push(ImportFile {
            id,
            mime_type: mime_guess::from_path(&name).first().map(|m| m.to_string()),
            name,
            bytes,
            valid: validation.is_ok(),
            validation_error: validation.err(),
            is_loading: false,
            uploaded: false,
            upload_failed: false,
            upload_fail_reason: None,
        });
        id
    }

    pub fn remove_file(&mut self, id: Uuid) -> Option<ImportFile> {
        let index = self.files.iter().position(|file| file.id == id)?;
        Some(self.files.remove(index))
    }

    pub fn files(&self) -> &[ImportFile] {
        &self.files
    }

    pub fn file(&self, id: Uuid) -> Option<&ImportFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn valid_files(&self) -> impl Iterator<Item = &ImportFile> {
        self.files.iter().filter(|file| file.valid)
    }

    pub fn is_upload_in_progress(&self) -> bool {
        self.valid_files().any(|file| file.is_loading)
    }

    /// True once every valid file has settled. A batch with no valid files is
    /// never finished.
    pub fn is_upload_finished(&self) -> bool {
        let mut valid = self.valid_files().peekable();
        valid.peek().is_some() && valid.all(|file| file.uploaded)
    }

    /// Uploads every valid file that has not been imported yet, one request per
    /// file. Failed files keep their reason and are retried only by calling
    /// this again.
    pub async fn upload(&mut self, ctx: &Context, plugin: &str) -> Result<ImportSummary> {
        let project = ctx.project()?;
        let path = urls::plugin_file_import(&project, plugin);

        let mut pending = FuturesUnordered::new();
        for file in self.files.iter_mut().filter(|file| file.needs_upload()) {
            file.is_loading = true;
            file.uploaded = false;
            file.upload_failed = false;
            file.upload_fail_reason = None;

            let request = UploadRequest {
                path: path.clone(),
                file_name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                bytes: file.bytes.clone(),
            };
            let id = file.id;
            let transport = &ctx.transport;
            pending.push(async move { (id, transport.upload(request).await) });
        }

        info!(project = %project, plugin, files = pending.len(), "import: uploading files");
        let mut summary = ImportSummary::default();
        while let Some((id, result)) = pending.next().await {
            let Some(file) = self.files.iter_mut().find(|file| file.id == id) else {
                continue;
            };
            file.is_loading = false;
            file.uploaded = true;
            match result {
                Ok(_) => {
                    summary.uploaded += 1;
                    file.upload_failed = false;
                    info!(file = %file.name, "import: file imported");
                    ctx.emit(ClientEvent::FileImported {
                        id,
                        name: file.name.clone(),
                    });
                }
                Err(err) => {
                    summary.failed += 1;
                    let reason = err.message();
                    warn!(file = %file.name, error = %reason, "import: upload failed");
                    ctx.notifications.error_text(reason.clone());
                    file.upload_failed = true;
                    file.upload_fail_reason = Some(reason);
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "tests/import_tests.rs"]
mod tests;
