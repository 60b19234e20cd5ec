//! Tracking-label extraction from Kubernetes manifests and kustomizations

use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// The two document shapes that can carry a tracking label
///
/// ```yaml
/// # HasMetadataLabels: any Kubernetes manifest
/// metadata:
///   labels:
///     argocd.argoproj.io/instance: web
/// ---
/// # HasLabelPairsList: a kustomization.yaml
/// labels:
///   - pairs:
///       argocd.argoproj.io/instance: web
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum LabelDocument {
    /// Top-level `metadata.labels` mapping
    HasMetadataLabels(Mapping),
    /// `pairs` mappings found in a top-level `labels` sequence, in order
    HasLabelPairsList(Vec<Mapping>),
    /// Neither shape
    Unrecognized,
}

impl LabelDocument {
    /// Every shape a parsed document carries, in lookup order
    ///
    /// A document may carry both shapes; `metadata.labels` is consulted
    /// first. `[Unrecognized]` when it carries neither.
    pub fn classify(document: &Value) -> Vec<Self> {
        let mut shapes = Vec::new();

        if let Some(labels) = document
            .get("metadata")
            .and_then(|metadata| metadata.get("labels"))
            .and_then(Value::as_mapping)
        {
            shapes.push(Self::HasMetadataLabels(labels.clone()));
        }

        if let Some(entries) = document.get("labels").and_then(Value::as_sequence) {
            let pairs = entries
                .iter()
                .filter_map(|entry| entry.get("pairs"))
                .filter_map(Value::as_mapping)
                .cloned()
                .collect();
            shapes.push(Self::HasLabelPairsList(pairs));
        }

        if shapes.is_empty() {
            shapes.push(Self::Unrecognized);
        }
        shapes
    }

    /// Value of `key` according to the document's shape
    pub fn label(&self, key: &str) -> Option<String> {
        match self {
            Self::HasMetadataLabels(labels) => labels.get(key).and_then(scalar_to_string),
            Self::HasLabelPairsList(pairs) => pairs
                .iter()
                .find_map(|pair| pair.get(key).and_then(scalar_to_string)),
            Self::Unrecognized => None,
        }
    }
}

/// Label values are strings in Kubernetes; YAML may still type them as numbers or booleans
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse every document of a YAML stream
fn parse_documents(content: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    serde_yaml::Deserializer::from_str(content)
        .map(Value::deserialize)
        .collect()
}

fn first_label(documents: &[Value], tracking_key: &str) -> Option<String> {
    documents.iter().find_map(|document| {
        LabelDocument::classify(document)
            .iter()
            .find_map(|shape| shape.label(tracking_key))
    })
}

/// Extract the tracking label from YAML content
///
/// Returns `None` when the content does not parse, when no document has a
/// recognized shape, or when the key is missing. Never fails.
pub fn extract_tracking_label(content: &str, tracking_key: &str) -> Option<String> {
    match parse_documents(content) {
        Ok(documents) => first_label(&documents, tracking_key),
        Err(e) => {
            warn!("Skipping unparseable YAML content: {}", e);
            None
        }
    }
}

/// Read a file and extract its tracking label
///
/// Missing or unreadable files (e.g. deleted by the pull request) yield `None`.
pub fn read_tracking_label(path: &Path, tracking_key: &str) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };

    let label = extract_tracking_label(&content, tracking_key);
    debug!("{}: {} = {:?}", path.display(), tracking_key, label);
    label
}
