//! Freight and Warehouse types
//!
//! Freight identity is a blake3 hash over the canonical rendering of its
//! origin and artifact set: the same content always yields the same
//! identity, which is what makes Freight creation idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reference to the Warehouse that produced a piece of Freight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseRef {
    pub project: String,
    pub name: String,
}

impl WarehouseRef {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WarehouseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.name)
    }
}

/// A Warehouse declares artifact subscriptions and produces Freight.
///
/// Discovery itself (which tags, which semver range, which chart versions)
/// happens outside this core; a Warehouse here is the origin unit Freight
/// points back at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub project: String,
    pub name: String,
    /// Opaque subscription descriptors, owned by the discovery layer.
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

impl Warehouse {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            subscriptions: Vec::new(),
        }
    }

    pub fn as_ref(&self) -> WarehouseRef {
        WarehouseRef::new(self.project.clone(), self.name.clone())
    }
}

/// A git commit reference carried by Freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub repo_url: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// A container image reference carried by Freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub repo_url: String,
    pub tag: String,
    pub digest: String,
}

/// A Helm chart version carried by Freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRef {
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: String,
}

/// Marker recording that a Stage manually approved this Freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approved_at: DateTime<Utc>,
}

/// Marker recording that a Stage verified this Freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub verified_at: DateTime<Utc>,
}

/// Mutable status of a piece of Freight.
///
/// Stage reconciliation (external to this core) appends entries; entries
/// are never content-modified once written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreightStatus {
    /// Stage name -> manual approval marker.
    #[serde(default)]
    pub approved_for: BTreeMap<String, ApprovalRecord>,
    /// Stage name -> verification marker.
    #[serde(default)]
    pub verified_in: BTreeMap<String, VerificationRecord>,
}

/// An immutable, content-identified bundle of source references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freight {
    /// Deterministic content identity; see [`Freight::content_id`].
    pub id: String,
    /// Optional human alias, unique per Project, mutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub origin: WarehouseRef,
    #[serde(default)]
    pub commits: Vec<GitCommit>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub charts: Vec<ChartRef>,
    #[serde(default)]
    pub status: FreightStatus,
}

impl Freight {
    /// Build Freight from its artifact set, deriving the content identity.
    pub fn new(
        origin: WarehouseRef,
        commits: Vec<GitCommit>,
        images: Vec<ImageRef>,
        charts: Vec<ChartRef>,
    ) -> Self {
        let id = Self::content_id(&origin, &commits, &images, &charts);
        Self {
            id,
            alias: None,
            origin,
            commits,
            images,
            charts,
            status: FreightStatus::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Compute the deterministic content identity for an artifact set.
    ///
    /// Artifacts are rendered in sorted order so identity is independent of
    /// the order discovery emitted them in.
    pub fn content_id(
        origin: &WarehouseRef,
        commits: &[GitCommit],
        images: &[ImageRef],
        charts: &[ChartRef],
    ) -> String {
        let mut parts: Vec<String> = Vec::new();
        for c in commits {
            parts.push(format!("git:{}:{}", c.repo_url, c.id));
        }
        for i in images {
            parts.push(format!("img:{}:{}:{}", i.repo_url, i.tag, i.digest));
        }
        for c in charts {
            parts.push(format!(
                "chart:{}:{}:{}",
                c.repo_url,
                c.name.as_deref().unwrap_or(""),
                c.version
            ));
        }
        parts.sort();

        let mut hasher = blake3::Hasher::new();
        hasher.update(origin.project.as_bytes());
        hasher.update(b"/");
        hasher.update(origin.name.as_bytes());
        for part in &parts {
            hasher.update(b"\n");
            hasher.update(part.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Whether this Freight carries a manual approval for the named Stage.
    pub fn is_approved_for(&self, stage: &str) -> bool {
        self.status.approved_for.contains_key(stage)
    }

    /// Whether this Freight carries a verification marker for the named Stage.
    pub fn is_verified_in(&self, stage: &str) -> bool {
        self.status.verified_in.contains_key(stage)
    }

    /// When the named Stage verified this Freight, if it has.
    pub fn verified_at(&self, stage: &str) -> Option<DateTime<Utc>> {
        self.status.verified_in.get(stage).map(|r| r.verified_at)
    }

    /// Record a verification marker. Additive only; an existing marker for
    /// the same Stage keeps its original timestamp.
    pub fn mark_verified_in(&mut self, stage: impl Into<String>, verified_at: DateTime<Utc>) {
        self.status
            .verified_in
            .entry(stage.into())
            .or_insert(VerificationRecord { verified_at });
    }

    /// Record a manual approval marker.
    pub fn mark_approved_for(&mut self, stage: impl Into<String>, approved_at: DateTime<Utc>) {
        self.status
            .approved_for
            .entry(stage.into())
            .or_insert(ApprovalRecord { approved_at });
    }

    /// Short form of the content identity, used in Promotion names.
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(7);
        &self.id[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(repo: &str, id: &str) -> GitCommit {
        GitCommit {
            repo_url: repo.to_string(),
            id: id.to_string(),
            branch: None,
            tag: None,
        }
    }

    #[test]
    fn test_content_id_deterministic() {
        let origin = WarehouseRef::new("p", "web");
        let a = Freight::new(origin.clone(), vec![commit("r1", "abc")], vec![], vec![]);
        let b = Freight::new(origin, vec![commit("r1", "abc")], vec![], vec![]);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_content_id_order_independent() {
        let origin = WarehouseRef::new("p", "web");
        let a = Freight::new(
            origin.clone(),
            vec![commit("r1", "abc"), commit("r2", "def")],
            vec![],
            vec![],
        );
        let b = Freight::new(
            origin,
            vec![commit("r2", "def"), commit("r1", "abc")],
            vec![],
            vec![],
        );
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_content_id_distinguishes_content() {
        let origin = WarehouseRef::new("p", "web");
        let a = Freight::new(origin.clone(), vec![commit("r1", "abc")], vec![], vec![]);
        let b = Freight::new(origin, vec![commit("r1", "abd")], vec![], vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_status_markers() {
        let mut freight = Freight::new(
            WarehouseRef::new("p", "web"),
            vec![commit("r1", "abc")],
            vec![],
            vec![],
        );
        assert!(!freight.is_verified_in("test"));

        let t0 = Utc::now();
        freight.mark_verified_in("test", t0);
        assert!(freight.is_verified_in("test"));
        assert_eq!(freight.verified_at("test"), Some(t0));

        // Additive: a second marker for the same Stage keeps the original.
        freight.mark_verified_in("test", t0 + chrono::Duration::hours(1));
        assert_eq!(freight.verified_at("test"), Some(t0));

        freight.mark_approved_for("prod", t0);
        assert!(freight.is_approved_for("prod"));
        assert!(!freight.is_approved_for("test"));
    }

    #[test]
    fn test_short_id() {
        let freight = Freight::new(
            WarehouseRef::new("p", "web"),
            vec![commit("r1", "abc")],
            vec![],
            vec![],
        );
        assert_eq!(freight.short_id().len(), 7);
        assert!(freight.id.starts_with(freight.short_id()));
    }
}
