//! Watch command implementation
//!
//! Polls the workspace, hashing each file's content. When anything changed,
//! every document is rescheduled on the debounced publisher, since an edit in
//! one file can change another file's interface or duplicate diagnostics.

use std::collections::HashMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::analysis::Validator;
use crate::app::App;
use crate::infra::hash_content;
use crate::models::document::uri_to_path;
use crate::services::publisher::{DiagnosticsPublisher, PublishDiagnostics};
use crate::services::workspace::{WorkspaceService, build_trees, siblings_of};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Override the debounce delay in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

#[derive(Serialize)]
struct PublishEvent<'a> {
    file: String,
    count: usize,
    #[serde(flatten)]
    publication: &'a PublishDiagnostics,
}

/// Content hash per document URI from the previous scan
#[derive(Default)]
struct Snapshot {
    hashes: HashMap<String, u64>,
}

impl Snapshot {
    /// Rescan and schedule validation; returns the number of documents scheduled
    async fn rescan(&mut self, workspace: &dyn WorkspaceService, publisher: &DiagnosticsPublisher) -> usize {
        let documents = workspace.load_all().await;
        let hashes: HashMap<String, u64> = documents
            .iter()
            .map(|document| (document.uri.clone(), hash_content(&document.text)))
            .collect();

        let removed: Vec<&String> = self
            .hashes
            .keys()
            .filter(|uri| !hashes.contains_key(*uri))
            .collect();
        for uri in &removed {
            publisher.document_closed(uri).await;
        }

        let changed = hashes
            .iter()
            .any(|(uri, hash)| self.hashes.get(uri) != Some(hash));
        if !changed && removed.is_empty() {
            return 0;
        }
        tracing::debug!(
            "Workspace changed ({} removed), revalidating {} documents",
            removed.len(),
            documents.len()
        );

        let trees = build_trees(&documents);
        for document in &documents {
            publisher
                .document_changed(&document.uri, document.text.clone(), siblings_of(&trees, &document.uri))
                .await;
        }
        self.hashes = hashes;
        documents.len()
    }
}

pub async fn execute(args: WatchArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let runtime = app.runtime();
    let delay = args
        .debounce_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or(runtime.debounce);

    let (publisher, mut receiver) =
        DiagnosticsPublisher::new(Validator::new(runtime.validation.clone()), delay);
    let mut snapshot = Snapshot::default();
    let mut ticker = tokio::time::interval(runtime.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Watching {} every {:?}", app.root().display(), runtime.poll_interval);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            Some(publication) = receiver.recv() => {
                let file = ctx.relative_path(&uri_to_path(&publication.uri));
                ctx.print_event(PublishEvent {
                    file,
                    count: publication.diagnostics.len(),
                    publication: &publication,
                });
            }
            _ = ticker.tick() => {
                snapshot.rescan(app.workspace.as_ref(), &publisher).await;
            }
        }
    }

    tracing::debug!("Watch stopped with {} pending validations", publisher.pending().await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::models::config::SimpleVbConfig;
    use crate::services::workspace::DefaultWorkspaceService;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn workspace_at(root: &std::path::Path) -> DefaultWorkspaceService {
        let config = SimpleVbConfig::default();
        DefaultWorkspaceService::new(root, &config.workspace, &RuntimeConfig::from(&config))
    }

    #[tokio::test]
    async fn test_rescan_publishes_on_change_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::write(root.join("A.vb"), "Class A\n").unwrap();
        fs::write(root.join("B.vb"), "Module B\nEnd Module\n").unwrap();

        let workspace = workspace_at(&root);
        let (publisher, mut receiver) =
            DiagnosticsPublisher::new(Validator::default(), Duration::from_millis(10));
        let mut snapshot = Snapshot::default();

        assert_eq!(snapshot.rescan(&workspace, &publisher).await, 2);
        let mut first = vec![
            timeout(WAIT, receiver.recv()).await.unwrap().unwrap(),
            timeout(WAIT, receiver.recv()).await.unwrap().unwrap(),
        ];
        first.sort_by(|a, b| a.uri.cmp(&b.uri));
        assert_eq!(first[0].diagnostics.len(), 1);
        assert!(first[1].diagnostics.is_empty());

        // Nothing changed
        assert_eq!(snapshot.rescan(&workspace, &publisher).await, 0);

        fs::write(root.join("A.vb"), "Class A\nEnd Class\n").unwrap();
        assert_eq!(snapshot.rescan(&workspace, &publisher).await, 2);
        for _ in 0..2 {
            let published = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
            assert!(published.diagnostics.is_empty());
        }
    }

    #[tokio::test]
    async fn test_rescan_clears_removed_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::write(root.join("A.vb"), "Class A\n").unwrap();

        let workspace = workspace_at(&root);
        let (publisher, mut receiver) =
            DiagnosticsPublisher::new(Validator::default(), Duration::from_millis(10));
        let mut snapshot = Snapshot::default();

        snapshot.rescan(&workspace, &publisher).await;
        let published = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
        assert_eq!(published.diagnostics.len(), 1);

        fs::remove_file(root.join("A.vb")).unwrap();
        snapshot.rescan(&workspace, &publisher).await;
        let cleared = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
        assert!(cleared.uri.ends_with("A.vb"));
        assert!(cleared.diagnostics.is_empty());
    }

    #[test]
    fn test_event_shape() {
        let publication = PublishDiagnostics {
            uri: "file:///w/A.vb".to_string(),
            diagnostics: Vec::new(),
        };
        let event = PublishEvent {
            file: "A.vb".to_string(),
            count: 0,
            publication: &publication,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["file"], "A.vb");
        assert_eq!(json["uri"], "file:///w/A.vb");
        assert!(json["diagnostics"].as_array().unwrap().is_empty());
    }
}
