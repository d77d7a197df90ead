//! Selection-capture state machine.
//!
//! The [`Annotator`] ties the pieces together: it turns a user selection into
//! a pending record, commits it once a color is chosen, edits and deletes
//! committed annotations, and re-renders everything from the store on load.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::config::AnnotateConfig;
use crate::dom::{DocumentTree, NodeKind, TextRange};
use crate::error::{AnnotateError, Result};
use crate::highlight::Highlighter;
use crate::path::resolve_path;
use crate::record::AnnotationRecord;
use crate::span::{carve, range_matches, resolve_span};
use crate::store::AnnotationStore;

/// A user selection, as reported by the host.
///
/// Offsets are in chars within their node.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSnapshot<N> {
    pub anchor_node: N,
    pub anchor_offset: usize,
    pub focus_node: N,
    pub focus_offset: usize,
    pub text: String,
}

impl<N> SelectionSnapshot<N> {
    /// Snapshot of a selection that starts and ends in the same node.
    pub fn within(node: N, anchor_offset: usize, focus_offset: usize, text: impl Into<String>) -> Self
    where
        N: Clone,
    {
        Self {
            anchor_node: node.clone(),
            anchor_offset,
            focus_node: node,
            focus_offset,
            text: text.into(),
        }
    }

    /// Start of the selection, regardless of its direction.
    pub fn start_offset(&self) -> usize {
        self.anchor_offset.min(self.focus_offset)
    }

    /// End of the selection, regardless of its direction.
    ///
    /// Taken from the offsets rather than the text, which may have had its
    /// whitespace collapsed by the host.
    pub fn end_offset(&self) -> usize {
        self.anchor_offset.max(self.focus_offset)
    }
}

/// A captured record waiting for a color, with the live range it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingAnnotation<N> {
    pub record: AnnotationRecord,
    pub range: TextRange<N>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationState<N> {
    Idle,
    /// Record built but neither persisted nor rendered.
    PendingColorChoice(PendingAnnotation<N>),
    /// Record stored and rendered.
    Committed(SmolStr),
    /// A rendered highlight was opened for editing.
    EditingExisting(SmolStr),
}

impl<N> Default for AnnotationState<N> {
    fn default() -> Self {
        AnnotationState::Idle
    }
}

impl<N> AnnotationState<N> {
    /// Id of the committed annotation this state refers to, if any.
    pub fn active_id(&self) -> Option<&SmolStr> {
        match self {
            AnnotationState::Committed(id) | AnnotationState::EditingExisting(id) => Some(id),
            _ => None,
        }
    }
}

/// Outcome of [`Annotator::load`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Ids rendered by this load.
    pub rendered: Vec<SmolStr>,
    /// Ids that already had a highlight in the document.
    pub skipped: Vec<SmolStr>,
    /// Store keys that could not be decoded or re-anchored.
    pub failed: Vec<(String, AnnotateError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns a document, a store and the records anchored in that document.
pub struct Annotator<D: DocumentTree, S: AnnotationStore> {
    doc: D,
    store: S,
    config: AnnotateConfig,
    records: HashMap<SmolStr, AnnotationRecord>,
    state: AnnotationState<D::Node>,
}

impl<D: DocumentTree, S: AnnotationStore> Annotator<D, S> {
    pub fn new(doc: D, store: S, config: AnnotateConfig) -> Self {
        Self {
            doc,
            store,
            config,
            records: HashMap::new(),
            state: AnnotationState::Idle,
        }
    }

    pub fn state(&self) -> &AnnotationState<D::Node> {
        &self.state
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AnnotateConfig {
        &self.config
    }

    pub fn record(&self, id: &str) -> Option<&AnnotationRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.records.values()
    }

    /// The record being created or edited.
    pub fn current(&self) -> Option<&AnnotationRecord> {
        match &self.state {
            AnnotationState::PendingColorChoice(pending) => Some(&pending.record),
            state => state.active_id().and_then(|id| self.records.get(id)),
        }
    }

    /// Start an annotation from a selection.
    ///
    /// Returns `Ok(None)` and leaves the state alone when the selection does
    /// not qualify: empty, spanning several nodes, not in a text node, or
    /// inside an existing highlight.
    pub fn handle_selection(
        &mut self,
        selection: &SelectionSnapshot<D::Node>,
    ) -> Result<Option<&AnnotationRecord>> {
        if !self.qualifies(selection) {
            tracing::trace!(text = %selection.text, "ignoring selection");
            return Ok(None);
        }

        let start = selection.start_offset();
        let end = selection.end_offset();
        let record =
            AnnotationRecord::capture(&self.doc, &selection.anchor_node, start, &selection.text)?;
        tracing::debug!(id = %record.id, path = %record.path, ordinal = record.ordinal, "captured selection");

        self.state = AnnotationState::PendingColorChoice(PendingAnnotation {
            record,
            range: TextRange::new(selection.anchor_node.clone(), start, end),
        });
        Ok(self.current())
    }

    fn qualifies(&self, selection: &SelectionSnapshot<D::Node>) -> bool {
        if selection.text.is_empty() || selection.anchor_node != selection.focus_node {
            return false;
        }
        let anchor = &selection.anchor_node;
        if self.doc.kind(anchor) != NodeKind::Text {
            return false;
        }
        let highlighter = Highlighter::new(&self.config);
        if highlighter.is_highlight(&self.doc, anchor) {
            return false;
        }
        !self
            .doc
            .parent_element(anchor)
            .is_some_and(|parent| highlighter.is_highlight(&self.doc, &parent))
    }

    /// Pick a palette color for the current annotation.
    ///
    /// Commits a pending annotation, or recolors a committed one in place.
    pub fn choose_color(&mut self, index: usize) -> Result<&AnnotationRecord> {
        let color = self.config.color(index);
        match std::mem::take(&mut self.state) {
            AnnotationState::Idle => Err(AnnotateError::NoActiveAnnotation),
            AnnotationState::PendingColorChoice(pending) => {
                let id = self.commit(pending, color)?;
                self.state = AnnotationState::Committed(id.clone());
                self.records
                    .get(&id)
                    .ok_or(AnnotateError::UnknownAnnotation(id))
            }
            state @ (AnnotationState::Committed(_) | AnnotationState::EditingExisting(_)) => {
                let id = state.active_id().cloned().unwrap_or_default();
                self.state = state;
                self.update(&id, |record| record.highlight_color = Some(color.clone()))?;
                Highlighter::new(&self.config).recolor(&mut self.doc, &id, &color)?;
                self.records
                    .get(&id)
                    .ok_or(AnnotateError::UnknownAnnotation(id))
            }
        }
    }

    fn commit(&mut self, pending: PendingAnnotation<D::Node>, color: SmolStr) -> Result<SmolStr> {
        let PendingAnnotation { mut record, range } = pending;
        record.highlight_color = Some(color);
        let json = record.to_json()?;

        let range = if range_matches(&self.doc, &range, &record.pattern) {
            range
        } else {
            tracing::debug!(id = %record.id, "selection range went stale, re-resolving");
            let element = resolve_path(&self.doc, &record.path)?;
            resolve_span(&self.doc, &element, &record.pattern, record.ordinal)?
        };
        let node = carve(&mut self.doc, &range)?;
        Highlighter::new(&self.config).render(&mut self.doc, &node, &record)?;

        if let Err(err) = self.store.set(&record.id, &json) {
            tracing::warn!(id = %record.id, error = %err, "failed to persist annotation");
            Highlighter::new(&self.config).remove(&mut self.doc, &record.id)?;
            return Err(err);
        }
        tracing::debug!(id = %record.id, "committed annotation");
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    /// Set the comment of the current annotation. An empty comment clears it.
    ///
    /// Never touches the document.
    pub fn set_comment(&mut self, comment: &str) -> Result<()> {
        let comment = (!comment.is_empty()).then(|| comment.to_string());
        match &mut self.state {
            AnnotationState::Idle => Err(AnnotateError::NoActiveAnnotation),
            AnnotationState::PendingColorChoice(pending) => {
                pending.record.comment = comment;
                Ok(())
            }
            AnnotationState::Committed(id) | AnnotationState::EditingExisting(id) => {
                let id = id.clone();
                self.update(&id, |record| record.comment = comment)
            }
        }
    }

    /// Mutate a committed record and persist it.
    fn update(&mut self, id: &SmolStr, f: impl FnOnce(&mut AnnotationRecord)) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| AnnotateError::UnknownAnnotation(id.clone()))?;
        f(record);
        self.store.set(&record.id, &record.to_json()?)
    }

    /// Open a rendered highlight for editing.
    ///
    /// Returns `Ok(None)` when `element` is not a highlight.
    pub fn open_highlight(&mut self, element: &D::Node) -> Result<Option<&AnnotationRecord>> {
        let Some(id) = Highlighter::new(&self.config).id_of(&self.doc, element) else {
            return Ok(None);
        };
        let id = SmolStr::new(id);
        if !self.records.contains_key(&id) {
            return Err(AnnotateError::UnknownAnnotation(id));
        }
        self.state = AnnotationState::EditingExisting(id.clone());
        Ok(self.records.get(&id))
    }

    /// Delete the current annotation. A pending one is simply discarded.
    pub fn delete(&mut self) -> Result<()> {
        match std::mem::take(&mut self.state) {
            AnnotationState::Idle => Err(AnnotateError::NoActiveAnnotation),
            AnnotationState::PendingColorChoice(_) => Ok(()),
            AnnotationState::Committed(id) | AnnotationState::EditingExisting(id) => {
                self.delete_by_id(&id)
            }
        }
    }

    /// Remove an annotation from the store, the record table and the
    /// document.
    pub fn delete_by_id(&mut self, id: &str) -> Result<()> {
        let known = self.records.remove(id).is_some();
        let rendered = Highlighter::new(&self.config).remove(&mut self.doc, id)?;
        if !known && !rendered {
            return Err(AnnotateError::UnknownAnnotation(id.into()));
        }
        self.store.delete(id)?;
        if self.state.active_id().is_some_and(|active| active == id) {
            self.state = AnnotationState::Idle;
        }
        tracing::debug!(id, "deleted annotation");
        Ok(())
    }

    /// Close the current tooltip without changing anything.
    pub fn dismiss(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            AnnotationState::EditingExisting(id) => AnnotationState::Committed(id),
            AnnotationState::PendingColorChoice(_) => AnnotationState::Idle,
            state => state,
        };
    }

    /// Re-anchor and render every stored record.
    ///
    /// Records that fail to decode or resolve are reported and skipped.
    /// Records already rendered are left alone, so loading twice is
    /// harmless. Only a failure to read the store itself is an error.
    pub fn load(&mut self) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for (key, value) in self.store.entries()? {
            let record = match AnnotationRecord::from_json(&key, &value) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(key, error = %err, "skipping undecodable record");
                    report.failed.push((key, err));
                    continue;
                }
            };
            if Highlighter::new(&self.config).find(&self.doc, &record.id).is_some() {
                report.skipped.push(record.id.clone());
                self.records.insert(record.id.clone(), record);
                continue;
            }
            match self.render_stored(&record) {
                Ok(()) => {
                    report.rendered.push(record.id.clone());
                    self.records.insert(record.id.clone(), record);
                }
                Err(err) => {
                    tracing::warn!(key, id = %record.id, path = %record.path, error = %err, "failed to re-anchor record");
                    report.failed.push((key, err));
                }
            }
        }
        tracing::debug!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "loaded annotations"
        );
        Ok(report)
    }

    fn render_stored(&mut self, record: &AnnotationRecord) -> Result<()> {
        let element = resolve_path(&self.doc, &record.path)?;
        let range = resolve_span(&self.doc, &element, &record.pattern, record.ordinal)?;
        let node = carve(&mut self.doc, &range)?;
        Highlighter::new(&self.config).render(&mut self.doc, &node, record)?;
        Ok(())
    }

    /// Records of the rendered highlights, in document order.
    pub fn records_in_document_order(&self) -> Vec<&AnnotationRecord> {
        let highlighter = Highlighter::new(&self.config);
        highlighter
            .all(&self.doc)
            .iter()
            .filter_map(|element| highlighter.id_of(&self.doc, element))
            .filter_map(|id| self.records.get(id.as_str()))
            .collect()
    }
}
