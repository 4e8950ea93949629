//! Import orchestration: connect, identify the project, scan, and transmit.
//!
//! [`Importer`] sequences the console client, the classifier, and the command
//! generator. One logical operation is in flight at a time; a new connect
//! supersedes and disposes any previous connection before proceeding, so two
//! live connections never coexist. Status is surfaced to the caller as a
//! stream of human-readable strings over an unbounded channel; the importer
//! makes no assumption about which task consumes them.

use crate::classify::{collect_audio_files, group_files};
use crate::commands::{generate_commands, ScriptTemplates};
use crate::config::Settings;
use crate::console::{extract_project_path, ConsoleClient};
use crate::error::{AppResult, ImporterError};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// Console command that echoes the open project's file path.
pub const PROJECT_PATH_QUERY: &str = "studio.project.filePath";

/// Read bound for the project-path reply.
const PROJECT_PATH_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrator lifecycle. `Connected` and `Importing` carry the project
/// path resolved at connect time, when one was resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImporterState {
    Disconnected,
    Connecting,
    Connected { project_path: Option<String> },
    Importing { project_path: Option<String> },
}

/// Drives one import pipeline against one console connection.
pub struct Importer {
    settings: Settings,
    templates: Option<ScriptTemplates>,
    client: Option<ConsoleClient>,
    state: ImporterState,
    status_tx: mpsc::UnboundedSender<String>,
}

impl Importer {
    /// Creates an importer, loading the script templates from the configured
    /// scripts directory. A template load failure is reported and remembered;
    /// imports are then rejected until the caller rebuilds the importer.
    ///
    /// Returns the importer and the receiving end of its status stream.
    pub fn new(settings: Settings) -> (Self, mpsc::UnboundedReceiver<String>) {
        let templates = match ScriptTemplates::load(Path::new(&settings.scripts_dir)) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::error!("Failed to load script templates: {}", e);
                None
            }
        };
        Self::with_templates(settings, templates)
    }

    /// Creates an importer with templates supplied directly.
    pub fn with_templates(
        settings: Settings,
        templates: Option<ScriptTemplates>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let importer = Self {
            settings,
            templates,
            client: None,
            state: ImporterState::Disconnected,
            status_tx,
        };
        (importer, status_rx)
    }

    pub fn state(&self) -> &ImporterState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(ConsoleClient::is_connected)
    }

    /// Project path resolved during the last successful connect, if any.
    pub fn project_path(&self) -> Option<&str> {
        match &self.state {
            ImporterState::Connected { project_path }
            | ImporterState::Importing { project_path } => project_path.as_deref(),
            _ => None,
        }
    }

    /// Connects to the console, queries the project identity, and sends the
    /// global setup script once.
    ///
    /// Any previous connection is disposed first. On failure the importer
    /// returns to `Disconnected` with all resources released. A failure to
    /// send the global setup script is reported but leaves the importer
    /// connected in a degraded state.
    pub async fn connect(&mut self, host: &str, port: u16) -> AppResult<()> {
        if let Some(mut old) = self.client.take() {
            old.disconnect();
            self.status("Connection disposed");
        }
        self.state = ImporterState::Connecting;
        self.status(format!("Connecting to {}:{}...", host, port));

        let mut client = ConsoleClient::new(host, port);
        if let Err(e) = client.connect().await {
            self.state = ImporterState::Disconnected;
            match &e {
                ImporterError::ConnectTimeout { .. } => {
                    self.status("Connection failed (Timeout)");
                }
                other => self.status(format!("Connection failed ({})", other)),
            }
            return Err(e);
        }

        let project_path = self.query_project_path(&mut client).await;
        match &project_path {
            Some(path) => {
                let name = Path::new(path)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                self.status(format!("Connected (Project: {})", name));
            }
            None => self.status("Connected (No project info)"),
        }

        self.send_global_setup(&mut client).await;

        self.client = Some(client);
        self.state = ImporterState::Connected { project_path };
        Ok(())
    }

    /// Asks the console for the open project's path. Failures here are never
    /// fatal; the import flow continues without project identity.
    async fn query_project_path(&self, client: &mut ConsoleClient) -> Option<String> {
        if let Err(e) = client.write_single(PROJECT_PATH_QUERY).await {
            tracing::warn!("Project path query failed to send: {}", e);
            return None;
        }
        match client.read_response(PROJECT_PATH_READ_TIMEOUT).await {
            Ok(raw) => {
                let parsed = extract_project_path(&raw);
                if parsed.is_none() {
                    tracing::warn!("Could not parse project path from console reply");
                }
                parsed
            }
            Err(e) => {
                tracing::warn!("Project path query failed: {}", e);
                None
            }
        }
    }

    /// Sends the global setup script as one atomic block. Sent exactly once
    /// per connection, immediately after connect.
    async fn send_global_setup(&self, client: &mut ConsoleClient) {
        match &self.templates {
            Some(templates) => {
                tracing::info!("Sending global setup script");
                let block = [templates.global_setup.clone()];
                if let Err(e) = client.write_batch(&block).await {
                    tracing::error!("Failed to send global setup script: {}", e);
                    self.status("Error: failed to send global setup script");
                }
            }
            None => {
                self.status("Error: Global script missing.");
            }
        }
    }

    /// Scans `folder`, groups its audio files, and transmits the generated
    /// command batch.
    ///
    /// Rejected without side effects when not connected, when the templates
    /// failed to load, or when `folder` is not an existing directory. A
    /// transport fault during transmission leaves the importer disconnected;
    /// every other outcome returns it to `Connected`.
    pub async fn import_folder(&mut self, folder: &Path) -> AppResult<()> {
        if !self.is_connected() {
            self.status("Error: Not connected");
            return Err(ImporterError::NotConnected);
        }
        if self.templates.is_none() {
            self.status("Error: scripts not loaded.");
            return Err(ImporterError::TemplatesNotLoaded);
        }
        if !folder.is_dir() {
            self.status("Error: Invalid folder");
            return Err(ImporterError::InvalidImportFolder(folder.to_path_buf()));
        }

        let project_path = match &self.state {
            ImporterState::Connected { project_path } => project_path.clone(),
            _ => None,
        };
        if project_path.is_none() {
            self.status("Warning: Unknown project path. Import may fail.");
        }
        self.state = ImporterState::Importing {
            project_path: project_path.clone(),
        };

        let result = self.run_import(folder).await;

        self.state = if self.is_connected() {
            ImporterState::Connected { project_path }
        } else {
            ImporterState::Disconnected
        };

        match &result {
            Ok(()) => self.status("Import process finished."),
            Err(e) => self.status(format!("Error during import: {}", e)),
        }
        result
    }

    async fn run_import(&mut self, folder: &Path) -> AppResult<()> {
        let scan_root = folder.canonicalize()?;
        let folder_name = scan_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| scan_root.display().to_string());
        self.status(format!("Scanning folder: {}...", folder_name));

        let files = collect_audio_files(&scan_root);
        self.status(format!("Found {} audio files.", files.len()));
        if files.is_empty() {
            self.status("No audio files found.");
            return Ok(());
        }

        let groups = group_files(&files, &scan_root, &self.settings.suffixes);
        self.status(format!("Processing {} file groups.", groups.len()));

        let templates = self
            .templates
            .as_ref()
            .ok_or(ImporterError::TemplatesNotLoaded)?;
        let batch = generate_commands(&groups, templates)?;

        self.status(format!(
            "Sending {} command blocks to FMOD Studio...",
            batch.len()
        ));
        let client = self.client.as_mut().ok_or(ImporterError::NotConnected)?;
        client.write_batch(&batch).await?;

        Ok(())
    }

    /// Disposes the connection and returns to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.disconnect();
            self.status("Connection disposed");
        }
        self.state = ImporterState::Disconnected;
    }

    fn status(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("Status: {}", message);
        // The receiver may be gone; status is fire-and-forget.
        let _ = self.status_tx.send(message);
    }
}

impl Drop for Importer {
    fn drop(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer_with(
        templates: Option<ScriptTemplates>,
    ) -> (Importer, mpsc::UnboundedReceiver<String>) {
        Importer::with_templates(Settings::default(), templates)
    }

    #[tokio::test]
    async fn import_rejected_when_not_connected() {
        let templates = ScriptTemplates::from_parts("g();", "{EVENT_NAME}");
        let (mut importer, mut rx) = importer_with(Some(templates));

        let result = importer.import_folder(Path::new("/tmp")).await;
        assert!(matches!(result, Err(ImporterError::NotConnected)));
        assert_eq!(*importer.state(), ImporterState::Disconnected);
        assert_eq!(rx.recv().await.unwrap(), "Error: Not connected");
    }

    #[tokio::test]
    async fn connect_failure_returns_to_disconnected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let templates = ScriptTemplates::from_parts("g();", "{EVENT_NAME}");
        let (mut importer, _rx) = importer_with(Some(templates));

        assert!(importer.connect("127.0.0.1", port).await.is_err());
        assert_eq!(*importer.state(), ImporterState::Disconnected);
        assert!(!importer.is_connected());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (mut importer, _rx) = importer_with(None);
        importer.disconnect();
        importer.disconnect();
        assert_eq!(*importer.state(), ImporterState::Disconnected);
    }
}
