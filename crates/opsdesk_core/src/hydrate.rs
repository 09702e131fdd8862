//! Reference hydration: document references to display labels.
//!
//! # Responsibility
//! - Resolve each distinct referenced document with one read.
//! - Derive a label and a contact line per collection.
//!
//! # Invariants
//! - A `LabelMap` holds exactly one entry per requested distinct path.
//! - Entries for missing or unreadable documents carry only the fallback
//!   label and `resolved == false`.
//! - Read failures are logged and never abort hydration.

use crate::model::customer::{self, Customer};
use crate::model::document::{DocPath, Document};
use crate::model::partner::{self, Partner};
use crate::store::DocumentStore;
use log::{debug, warn};
use serde::Serialize;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_UNKNOWN_LABEL: &str = "Unknown";

const GENERIC_LABEL_FIELDS: &[&str] = &["display_name", "name", "title", "code", "email"];

/// Label shown in place of a document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayInfo {
    pub label: String,
    pub secondary: Option<String>,
    pub resolved: bool,
}

impl DisplayInfo {
    pub fn resolved(label: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            label: label.into(),
            secondary,
            resolved: true,
        }
    }

    pub fn unknown(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            secondary: None,
            resolved: false,
        }
    }
}

/// Resolved labels keyed by reference path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<DocPath, DisplayInfo>,
    fallback: String,
}

impl LabelMap {
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    pub fn get(&self, path: &DocPath) -> Option<&DisplayInfo> {
        self.entries.get(path)
    }

    /// Display info for an optional reference; absent references and paths
    /// outside the map get the fallback label.
    pub fn display(&self, path: Option<&DocPath>) -> DisplayInfo {
        path.and_then(|path| self.entries.get(path))
            .cloned()
            .unwrap_or_else(|| DisplayInfo::unknown(self.fallback.as_str()))
    }

    pub fn label(&self, path: Option<&DocPath>) -> &str {
        path.and_then(|path| self.entries.get(path))
            .map_or(self.fallback.as_str(), |info| info.label.as_str())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|info| !info.resolved).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocPath, &DisplayInfo)> {
        self.entries.iter()
    }
}

/// Resolves references against one store, counting the reads it issues.
pub struct ReferenceResolver<'s, S: ?Sized> {
    store: &'s S,
    fallback_label: String,
    reads: Cell<usize>,
}

impl<'s, S> ReferenceResolver<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: &'s S, fallback_label: impl Into<String>) -> Self {
        Self {
            store,
            fallback_label: fallback_label.into(),
            reads: Cell::new(0),
        }
    }

    /// Reads issued so far by this resolver.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Resolves each distinct path once.
    pub fn resolve<'p>(&self, paths: impl IntoIterator<Item = &'p DocPath>) -> LabelMap {
        let unique = paths.into_iter().collect::<BTreeSet<_>>();
        let mut map = LabelMap::empty(self.fallback_label.as_str());

        for path in unique {
            self.reads.set(self.reads.get() + 1);
            let info = match self.store.get(path) {
                Ok(Some(doc)) => describe_document(&doc)
                    .unwrap_or_else(|| DisplayInfo::unknown(self.fallback_label.as_str())),
                Ok(None) => {
                    debug!("event=hydrate_ref module=hydrate status=missing path={path}");
                    DisplayInfo::unknown(self.fallback_label.as_str())
                }
                Err(err) => {
                    warn!(
                        "event=hydrate_ref module=hydrate status=error path={} error={}",
                        path, err
                    );
                    DisplayInfo::unknown(self.fallback_label.as_str())
                }
            };
            map.entries.insert(path.clone(), info);
        }

        map
    }
}

/// Derives the label for a document by its collection; `None` when the
/// document has nothing usable.
pub fn describe_document(doc: &Document) -> Option<DisplayInfo> {
    match doc.path.collection() {
        customer::COLLECTION => {
            let customer = Customer::from_document(doc).ok()?;
            let label = customer.display_label()?;
            Some(DisplayInfo::resolved(label, customer.contact()))
        }
        partner::COLLECTION => {
            let partner = Partner::from_document(doc).ok()?;
            let label = partner.display_label()?;
            Some(DisplayInfo::resolved(label, partner.contact()))
        }
        _ => {
            let label = GENERIC_LABEL_FIELDS.iter().find_map(|field| {
                doc.text_field(field).ok().flatten()
            })?;
            let secondary = doc
                .text_field("email")
                .ok()
                .flatten()
                .filter(|email| *email != label)
                .or_else(|| doc.text_field("phone_number").ok().flatten());
            Some(DisplayInfo::resolved(label, secondary))
        }
    }
}
