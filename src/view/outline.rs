//! Plain-text outline view
//!
//! An in-memory [`TreeView`] that keeps rows, expansion state and selection.
//! Expansion and selection are keyed by node identity, so they survive
//! reloads that rebuild every node. [`OutlineView`] is a cheap handle; the
//! tree owns one clone and callers keep another to inspect or drive it.

use crate::view::decorations::NodeStyle;
use crate::view::sink::{TreeView, ViewRow};
use crate::view::tree::{NodeId, NodeKey};
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Outline {
    rows: Vec<ViewRow>,
    expanded: HashSet<NodeKey>,
    header: String,
    header_expanded: bool,
    selected: Option<NodeKey>,
    rebuilds: usize,
    style_updates: usize,
}

impl Outline {
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_header_expanded(&self) -> bool {
        self.header_expanded
    }

    /// Number of rebuilds so far
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Number of single-row style updates so far
    pub fn style_updates(&self) -> usize {
        self.style_updates
    }

    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn row(&self, node: NodeId) -> Option<&ViewRow> {
        self.rows.iter().find(|r| r.node == node)
    }

    /// Find a row by its display labels from the top level down
    pub fn find(&self, labels: &[&str]) -> Option<&ViewRow> {
        let mut parent = None;
        let mut found = None;
        for label in labels {
            let row = self
                .rows
                .iter()
                .find(|r| r.parent == parent && r.text == *label)?;
            parent = Some(row.node);
            found = Some(row);
        }
        found
    }

    /// Rows whose ancestors are all expanded
    pub fn visible_rows(&self) -> Vec<&ViewRow> {
        if !self.header_expanded {
            return Vec::new();
        }

        let mut visible = Vec::new();
        // Depth below which rows are hidden by a collapsed ancestor
        let mut hidden_below: Option<usize> = None;

        for row in &self.rows {
            if let Some(depth) = hidden_below {
                if row.depth > depth {
                    continue;
                }
                hidden_below = None;
            }
            visible.push(row);
            if row.has_children && !self.expanded.contains(&row.key) {
                hidden_below = Some(row.depth);
            }
        }

        visible
    }

    pub fn selected(&self) -> Option<&ViewRow> {
        let key = self.selected.as_ref()?;
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Header line followed by every visible row
    pub fn render(&self) -> String {
        let marker = if self.header_expanded { '-' } else { '+' };
        let mut out = format!("{marker} {}\n", self.header);

        for row in self.visible_rows() {
            let marker = match (row.has_children, self.expanded.contains(&row.key)) {
                (false, _) => ' ',
                (true, true) => '-',
                (true, false) => '+',
            };
            let mut text = row.text.clone();
            if row.style.bold {
                text = format!("*{text}*");
            }
            out.push_str(&format!(
                "{}{marker} {text} [{}]\n",
                "  ".repeat(row.depth + 1),
                row.style.image
            ));
        }

        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutlineView {
    inner: Rc<RefCell<Outline>>,
}

impl OutlineView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the current state
    pub fn state(&self) -> Ref<'_, Outline> {
        self.inner.borrow()
    }

    pub fn render(&self) -> String {
        self.inner.borrow().render()
    }

    pub fn set_node_expanded(&self, key: &NodeKey, expanded: bool) {
        let mut outline = self.inner.borrow_mut();
        if expanded {
            outline.expanded.insert(key.clone());
        } else {
            outline.expanded.remove(key);
        }
    }

    /// Select a row; returns its node when it exists
    pub fn select(&self, key: &NodeKey) -> Option<NodeId> {
        let mut outline = self.inner.borrow_mut();
        let node = outline.rows.iter().find(|r| &r.key == key)?.node;
        outline.selected = Some(key.clone());
        Some(node)
    }

    /// Select the next visible row
    pub fn select_next(&self) -> Option<NodeId> {
        self.step(1)
    }

    /// Select the previous visible row
    pub fn select_prev(&self) -> Option<NodeId> {
        self.step(-1)
    }

    fn step(&self, delta: isize) -> Option<NodeId> {
        let mut outline = self.inner.borrow_mut();
        let visible: Vec<(NodeKey, NodeId)> = outline
            .visible_rows()
            .into_iter()
            .map(|r| (r.key.clone(), r.node))
            .collect();
        if visible.is_empty() {
            return None;
        }

        let current = outline
            .selected
            .as_ref()
            .and_then(|key| visible.iter().position(|(k, _)| k == key));
        let index = match current {
            Some(pos) => pos.saturating_add_signed(delta).min(visible.len() - 1),
            None => 0,
        };

        let (key, node) = visible[index].clone();
        outline.selected = Some(key);
        Some(node)
    }
}

impl TreeView for OutlineView {
    fn rebuild(&mut self, rows: Vec<ViewRow>) -> Option<NodeId> {
        let mut outline = self.inner.borrow_mut();
        outline.rows = rows;
        outline.rebuilds += 1;

        // Forget expansion of nodes that are gone
        let Outline { rows, expanded, .. } = &mut *outline;
        let live: HashSet<&NodeKey> = rows.iter().map(|r| &r.key).collect();
        expanded.retain(|key| live.contains(key));

        let reselected = outline
            .selected
            .as_ref()
            .and_then(|key| outline.rows.iter().find(|r| &r.key == key))
            .map(|r| r.node);
        if reselected.is_none() {
            outline.selected = None;
        }
        reselected
    }

    fn apply_style(&mut self, node: NodeId, text: &str, style: &NodeStyle) -> bool {
        let mut outline = self.inner.borrow_mut();
        let Some(row) = outline.rows.iter_mut().find(|r| r.node == node) else {
            return false;
        };
        row.text = text.to_string();
        row.style = *style;
        outline.style_updates += 1;
        true
    }

    fn set_header(&mut self, text: &str) {
        self.inner.borrow_mut().header = text.to_string();
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.inner.borrow_mut().header_expanded = expanded;
    }

    fn expand_all(&mut self) {
        let mut outline = self.inner.borrow_mut();
        let keys: Vec<NodeKey> = outline
            .rows
            .iter()
            .filter(|r| r.has_children)
            .map(|r| r.key.clone())
            .collect();
        outline.expanded.extend(keys);
        outline.header_expanded = true;
    }

    fn collapse_all(&mut self) {
        let mut outline = self.inner.borrow_mut();
        outline.expanded.clear();
        outline.header_expanded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::decorations::{ImageKey, NodeStyle};
    use crate::view::tree::VariantTag;

    fn row(id: usize, parent: Option<usize>, depth: usize, text: &str, has_children: bool) -> ViewRow {
        ViewRow {
            node: NodeId(id),
            key: NodeKey::new(VariantTag::BranchPath, text),
            parent: parent.map(NodeId),
            depth,
            text: text.to_string(),
            style: NodeStyle {
                bold: false,
                italic: false,
                image: ImageKey::FolderClosed,
            },
            has_children,
        }
    }

    fn sample() -> Vec<ViewRow> {
        vec![
            row(1, None, 0, "a", true),
            row(2, Some(1), 1, "b", true),
            row(3, Some(2), 2, "c", false),
            row(4, None, 0, "d", false),
        ]
    }

    #[test]
    fn test_visibility_follows_expansion() {
        let mut view = OutlineView::new();
        view.rebuild(sample());
        assert!(view.state().visible_rows().is_empty());

        view.set_expanded(true);
        let texts: Vec<_> = view.state().visible_rows().iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["a", "d"]);

        view.expand_all();
        assert_eq!(view.state().visible_rows().len(), 4);

        view.set_node_expanded(&NodeKey::new(VariantTag::BranchPath, "b"), false);
        let texts: Vec<_> = view.state().visible_rows().iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_expansion_and_selection_survive_rebuild() {
        let mut view = OutlineView::new();
        view.rebuild(sample());
        view.expand_all();
        view.select(&NodeKey::new(VariantTag::BranchPath, "c"));

        // Same keys, new node ids
        let rows: Vec<_> = sample()
            .into_iter()
            .map(|mut r| {
                r.node = NodeId(r.node.0 + 10);
                r.parent = r.parent.map(|p| NodeId(p.0 + 10));
                r
            })
            .collect();
        let reselected = view.rebuild(rows);

        assert_eq!(reselected, Some(NodeId(13)));
        assert_eq!(view.state().visible_rows().len(), 4);
        assert_eq!(view.state().rebuilds(), 2);
    }

    #[test]
    fn test_rebuild_forgets_vanished_expansion() {
        let mut view = OutlineView::new();
        view.rebuild(sample());
        view.expand_all();
        let b = NodeKey::new(VariantTag::BranchPath, "b");
        assert!(view.state().is_expanded(&b));

        view.rebuild(vec![row(1, None, 0, "a", true), row(4, None, 0, "d", false)]);
        assert!(!view.state().is_expanded(&b));
        assert!(view.state().is_expanded(&NodeKey::new(VariantTag::BranchPath, "a")));

        // A node that comes back later starts collapsed
        view.rebuild(sample());
        assert!(!view.state().is_expanded(&b));
    }

    #[test]
    fn test_select_next_prev() {
        let mut view = OutlineView::new();
        view.rebuild(sample());
        view.expand_all();

        assert_eq!(view.select_next(), Some(NodeId(1)));
        assert_eq!(view.select_next(), Some(NodeId(2)));
        assert_eq!(view.select_prev(), Some(NodeId(1)));
        assert_eq!(view.select_prev(), Some(NodeId(1)));
    }

    #[test]
    fn test_apply_style_and_render() {
        let mut view = OutlineView::new();
        view.rebuild(sample());
        view.set_header("Branches");
        view.expand_all();

        let bold = NodeStyle {
            bold: true,
            italic: false,
            image: ImageKey::Branch,
        };
        assert!(view.apply_style(NodeId(4), "d", &bold));
        assert!(!view.apply_style(NodeId(99), "x", &bold));

        let rendered = view.render();
        assert!(rendered.starts_with("- Branches\n"));
        assert!(rendered.contains("  - a [FolderClosed]\n"));
        assert!(rendered.contains("      c [FolderClosed]\n"));
        assert!(rendered.contains("*d* [Branch]"));
        assert_eq!(view.state().find(&["a", "b", "c"]).map(|r| r.node), Some(NodeId(3)));
    }
}
