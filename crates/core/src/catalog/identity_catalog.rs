use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::NEW_IDENTITY_PREFIX;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("enrollment directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("failed to read enrollment directory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Known identities, keyed by label and by integer identifier.
///
/// Identifiers are positions in the sorted label list, so they are stable
/// for one load and across reloads of an unchanged directory tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityCatalog {
    labels: Vec<String>,
}

impl IdentityCatalog {
    /// Builds the catalog from the immediate subdirectories of `root`.
    ///
    /// Plain files in `root` are ignored. An empty root is a valid, empty
    /// catalog; a missing root is an error.
    pub fn load(root: &Path) -> Result<Self, CatalogError> {
        if !root.is_dir() {
            return Err(CatalogError::MissingRoot(root.to_path_buf()));
        }
        let read_err = |e| CatalogError::Read {
            path: root.to_path_buf(),
            source: e,
        };

        let mut labels = Vec::new();
        for entry in fs::read_dir(root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => labels.push(name),
                Err(name) => log::warn!("Skipping non UTF-8 identity folder {name:?}"),
            }
        }
        labels.sort();
        log::info!("Loaded {} known identities: {:?}", labels.len(), labels);
        Ok(Self { labels })
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, identifier: u32) -> Option<&str> {
        self.labels.get(identifier as usize).map(String::as_str)
    }

    pub fn identifier(&self, label: &str) -> Option<u32> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
            .map(|i| i as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (i as u32, l.as_str()))
    }

    /// A label for a brand-new identity derived from `timestamp`, suffixed
    /// with `_2`, `_3`, ... until it collides with no known label.
    pub fn fresh_label(&self, timestamp: u64) -> String {
        let base = format!("{NEW_IDENTITY_PREFIX}_{timestamp}");
        if self.identifier(&base).is_none() {
            return base;
        }
        (2u32..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.identifier(candidate).is_none())
            .unwrap_or(base)
    }
}
