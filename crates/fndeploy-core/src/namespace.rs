//! Resolve a human-chosen namespace label to the platform's namespace id,
//! creating the namespace when no listing row matches.

use crate::doctl::Doctl;
use crate::error::{DeployError, Result};
use crate::types::Namespace;

// ---------------------------------------------------------------------------
// Listing parser
// ---------------------------------------------------------------------------

/// Parse `doctl serverless namespaces list --format ID,Label` output.
///
/// Contract: an optional header row whose first column is `ID`, then one row
/// per namespace with an id column followed by the label (which may contain
/// spaces when created outside this tool). Blank lines are ignored. Any row
/// with fewer than two columns is rejected as unparsable.
pub fn parse_listing(raw: &str) -> Result<Vec<Namespace>> {
    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut cols = trimmed.split_whitespace();
        let first = cols.next().unwrap_or_default();
        if idx == 0 && first.eq_ignore_ascii_case("id") {
            continue;
        }
        let label = cols.collect::<Vec<_>>().join(" ");
        if label.is_empty() {
            return Err(DeployError::UnparsableListing {
                line: idx + 1,
                content: line.to_string(),
            });
        }
        out.push(Namespace {
            id: first.to_string(),
            label,
            region: None,
        });
    }
    Ok(out)
}

/// Pick the namespace for `label`: an exact label match wins, otherwise the
/// first row whose label contains `label`.
pub fn find_by_label<'a>(namespaces: &'a [Namespace], label: &str) -> Option<&'a Namespace> {
    namespaces
        .iter()
        .find(|ns| ns.label == label)
        .or_else(|| namespaces.iter().find(|ns| ns.label.contains(label)))
}

// ---------------------------------------------------------------------------
// NamespaceResolver
// ---------------------------------------------------------------------------

pub struct NamespaceResolver<'a> {
    doctl: &'a Doctl<'a>,
}

impl<'a> NamespaceResolver<'a> {
    pub fn new(doctl: &'a Doctl<'a>) -> Self {
        Self { doctl }
    }

    pub fn list(&self) -> Result<Vec<Namespace>> {
        let raw = self.doctl.list_namespaces()?;
        parse_listing(&raw)
    }

    /// Return the namespace for `label`, creating it in `region` if absent.
    pub fn resolve(&self, label: &str, region: &str) -> Result<Namespace> {
        self.resolve_inner(label, region)
            .map_err(|e| DeployError::NamespaceResolution {
                label: label.to_string(),
                source: Box::new(e),
            })
    }

    fn resolve_inner(&self, label: &str, region: &str) -> Result<Namespace> {
        let existing = self.list()?;
        if let Some(ns) = find_by_label(&existing, label) {
            tracing::debug!(label, id = %ns.id, "namespace found");
            return Ok(ns.clone());
        }

        tracing::info!(label, region, "namespace not found, creating");
        let created = self.doctl.create_namespace(label, region)?;

        // Only trust an exact row from the create output; free-form text
        // falls through to a fresh listing.
        let reported = parse_listing(&created)
            .ok()
            .and_then(|rows| rows.into_iter().find(|ns| ns.label == label));
        let id = match reported {
            Some(ns) => ns.id,
            None => match find_by_label(&self.list()?, label) {
                Some(ns) => ns.id.clone(),
                None => {
                    tracing::warn!(
                        label,
                        "created namespace did not report an id; using the label"
                    );
                    label.to_string()
                }
            },
        };

        tracing::info!(label, id = %id, "namespace created");
        Ok(Namespace {
            id,
            label: label.to_string(),
            region: Some(region.to_string()),
        })
    }
}
