//! Debounced background diagnostics
//!
//! Edits to a document are coalesced per URI; only the last edit inside the
//! debounce window is validated and published.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::analysis::Validator;
use crate::infra::debounce::Debouncer;
use crate::models::diagnostic::Diagnostic;
use crate::models::document::SiblingTree;

/// One publication for a document; an empty list clears earlier results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishDiagnostics {
    pub uri: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DiagnosticsPublisher {
    debouncer: Debouncer,
    delay: Duration,
    validator: Arc<Validator>,
    sender: mpsc::UnboundedSender<PublishDiagnostics>,
}

impl DiagnosticsPublisher {
    pub fn new(
        validator: Validator,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PublishDiagnostics>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let publisher = Self {
            debouncer: Debouncer::new(),
            delay,
            validator: Arc::new(validator),
            sender,
        };
        (publisher, receiver)
    }

    /// Schedule validation of the new text, superseding any pending run
    pub async fn document_changed(&self, uri: &str, text: String, siblings: Vec<SiblingTree>) {
        let validator = Arc::clone(&self.validator);
        let sender = self.sender.clone();
        let uri_owned = uri.to_string();

        self.debouncer
            .schedule(uri, self.delay, async move {
                let diagnostics = validator.validate(&text, &siblings);
                tracing::debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri_owned);
                if sender
                    .send(PublishDiagnostics {
                        uri: uri_owned,
                        diagnostics,
                    })
                    .is_err()
                {
                    tracing::trace!("Diagnostics receiver dropped");
                }
            })
            .await;
    }

    /// Cancel pending work and clear the document's diagnostics
    pub async fn document_closed(&self, uri: &str) {
        self.debouncer.cancel(uri).await;
        let cleared = PublishDiagnostics {
            uri: uri.to_string(),
            diagnostics: Vec::new(),
        };
        if self.sender.send(cleared).is_err() {
            tracing::trace!("Diagnostics receiver dropped");
        }
    }

    pub async fn pending(&self) -> usize {
        self.debouncer.pending_count().await
    }
}
