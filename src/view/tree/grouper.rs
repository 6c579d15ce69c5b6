//! Grouping of flat, path-qualified leaves into a folder hierarchy
//!
//! Branch, tag and submodule trees all arrive as flat lists whose names
//! carry their hierarchy (`feature/ui/button`, `Externals/NBug`). The grouper
//! turns such a list into a forest of synthesized folders and leaves. It does
//! not sort; callers pre-sort the leaves if they want a particular order.

use super::node::{NodeId, NodeKind};
use super::nodes::Nodes;
use crate::error::TreeError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What to do when a leaf's path is also a proper prefix of another leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InnerLeafPolicy {
    /// The leaf itself becomes the parent of the deeper entries
    #[default]
    Nest,
    /// The leaf is attached, then a folder of the same name takes its place
    /// for everything nested below it
    Fold,
    /// Folders are always separate; a leaf and a folder of the same name sit
    /// side by side
    Coexist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind<P> {
    Folder,
    Leaf(P),
}

/// One folder or leaf of a [`Grouping`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry<P> {
    /// Last path segment
    pub segment: String,
    /// Full path of this entry
    pub path: String,
    pub kind: GroupKind<P>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl<P> GroupEntry<P> {
    fn new(segment: String, path: String, kind: GroupKind<P>) -> Self {
        Self {
            segment,
            path,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, GroupKind::Folder)
    }
}

/// Output of [`PathGrouper::group`]: an index-linked forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping<P> {
    separator: char,
    entries: Vec<GroupEntry<P>>,
    roots: Vec<usize>,
}

impl<P> Grouping<P> {
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn entries(&self) -> &[GroupEntry<P>] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&GroupEntry<P>> {
        self.entries.get(index)
    }

    /// Path rebuilt by walking parent links up to the root
    pub fn path_of(&self, index: usize) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            let entry = self.entries.get(i)?;
            segments.push(entry.segment.as_str());
            current = entry.parent;
        }
        segments.reverse();
        Some(segments.join(&self.separator.to_string()))
    }

    pub fn folder_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_folder()).count()
    }

    pub fn leaves(&self) -> impl Iterator<Item = (usize, &P)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match &e.kind {
                GroupKind::Leaf(payload) => Some((i, payload)),
                GroupKind::Folder => None,
            })
    }

    /// Materialize the forest into `nodes` below `parent`
    ///
    /// `folder` builds the node for a synthesized folder from its segment and
    /// path; `leaf` builds the node for a leaf from its path and payload.
    pub fn into_nodes<F, L>(
        self,
        nodes: &mut Nodes,
        parent: Option<NodeId>,
        mut folder: F,
        mut leaf: L,
    ) -> Result<(), TreeError>
    where
        F: FnMut(&str, &str) -> NodeKind,
        L: FnMut(&str, P) -> NodeKind,
    {
        let Grouping { entries, roots, .. } = self;
        let mut slots: Vec<Option<GroupEntry<P>>> = entries.into_iter().map(Some).collect();
        let mut stack: Vec<(usize, Option<NodeId>)> =
            roots.iter().rev().map(|&index| (index, parent)).collect();

        while let Some((index, parent_id)) = stack.pop() {
            let Some(entry) = slots.get_mut(index).and_then(Option::take) else {
                continue;
            };
            let kind = match entry.kind {
                GroupKind::Folder => folder(&entry.segment, &entry.path),
                GroupKind::Leaf(payload) => leaf(&entry.path, payload),
            };
            let id = nodes.add_node(parent_id, kind)?;
            stack.extend(entry.children.iter().rev().map(|&child| (child, Some(id))));
        }

        Ok(())
    }
}

/// Builds folder/leaf forests from flat path lists
#[derive(Debug, Clone, Copy)]
pub struct PathGrouper {
    separator: char,
    policy: InnerLeafPolicy,
}

impl Default for PathGrouper {
    fn default() -> Self {
        Self::new('/')
    }
}

impl PathGrouper {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            policy: InnerLeafPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InnerLeafPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InnerLeafPolicy {
        self.policy
    }

    /// Group `leaves` (full path, payload) into a forest
    ///
    /// Every distinct proper prefix gets exactly one folder (unless a leaf
    /// already owns that path, see [`InnerLeafPolicy`]). Children keep the
    /// order in which the leaves reach them. Empty segments are ignored and a
    /// repeated leaf path keeps its first payload.
    pub fn group<P, I>(&self, leaves: I) -> Grouping<P>
    where
        I: IntoIterator<Item = (String, P)>,
    {
        let sep = self.separator.to_string();
        let mut entries: Vec<GroupEntry<P>> = Vec::new();
        let mut leaf_paths: Vec<(Vec<String>, usize)> = Vec::new();
        let mut leaf_at: HashMap<String, usize> = HashMap::new();

        for (path, payload) in leaves {
            let segments: Vec<String> = path
                .split(self.separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let Some(last) = segments.last().cloned() else {
                tracing::warn!(path = %path, "skipping leaf with an empty path");
                continue;
            };
            let joined = segments.join(&sep);
            if leaf_at.contains_key(&joined) {
                tracing::warn!(path = %joined, "skipping repeated leaf path");
                continue;
            }

            let index = entries.len();
            entries.push(GroupEntry::new(last, joined.clone(), GroupKind::Leaf(payload)));
            leaf_at.insert(joined, index);
            leaf_paths.push((segments, index));
        }

        // Path -> entry used while walking. Leaves shadow folders of the same
        // path unless the policy keeps them apart.
        let mut lookup: HashMap<String, usize> = match self.policy {
            InnerLeafPolicy::Coexist => HashMap::new(),
            InnerLeafPolicy::Nest | InnerLeafPolicy::Fold => leaf_at.clone(),
        };
        let mut inner_prefixes: HashSet<String> = HashSet::new();

        for (segments, _) in &leaf_paths {
            for depth in 0..segments.len() - 1 {
                let prefix = segments[..=depth].join(&sep);
                inner_prefixes.insert(prefix.clone());
                if !lookup.contains_key(&prefix) {
                    let index = entries.len();
                    entries.push(GroupEntry::new(
                        segments[depth].clone(),
                        prefix.clone(),
                        GroupKind::Folder,
                    ));
                    lookup.insert(prefix, index);
                }
            }
        }

        let mut attached = vec![false; entries.len()];
        let mut roots = Vec::new();

        for (segments, leaf_index) in &leaf_paths {
            let mut parent: Option<usize> = None;

            for depth in 0..segments.len() {
                let prefix = segments[..=depth].join(&sep);
                let at_leaf = depth + 1 == segments.len();

                let mut index = if at_leaf && self.policy == InnerLeafPolicy::Coexist {
                    *leaf_index
                } else {
                    match lookup.get(&prefix) {
                        Some(&index) => index,
                        None => break,
                    }
                };

                if !attached[index] {
                    if self.policy == InnerLeafPolicy::Fold
                        && !entries[index].is_folder()
                        && inner_prefixes.contains(&prefix)
                    {
                        attach(&mut entries, &mut roots, &mut attached, parent, index);

                        let folder = entries.len();
                        entries.push(GroupEntry::new(
                            segments[depth].clone(),
                            prefix.clone(),
                            GroupKind::Folder,
                        ));
                        attached.push(false);
                        lookup.insert(prefix, folder);
                        index = folder;
                    }

                    attach(&mut entries, &mut roots, &mut attached, parent, index);
                }

                parent = Some(index);
            }
        }

        Grouping {
            separator: self.separator,
            entries,
            roots,
        }
    }
}

fn attach<P>(
    entries: &mut [GroupEntry<P>],
    roots: &mut Vec<usize>,
    attached: &mut [bool],
    parent: Option<usize>,
    index: usize,
) {
    entries[index].parent = parent;
    match parent {
        Some(p) => entries[p].children.push(index),
        None => roots.push(index),
    }
    attached[index] = true;
}

/// Append a `/` unless the path already ends with one
pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Resolves which enclosing module owns a path
///
/// Candidates are kept in descending lexicographic order. Among the
/// candidates that prefix a path, a deeper one always sorts after a shallower
/// one, so the first match in descending order is the nearest owner.
#[derive(Debug, Clone, Default)]
pub struct AncestorIndex {
    candidates: Vec<String>,
}

impl AncestorIndex {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates: Vec<String> = paths
            .into_iter()
            .map(|p| with_trailing_slash(p.as_ref()))
            .collect();
        candidates.sort_by(|a, b| b.cmp(a));
        candidates.dedup();
        Self { candidates }
    }

    /// Nearest candidate that is a proper path prefix of `path`
    ///
    /// # Errors
    ///
    /// `MissingAncestor` when nothing encloses `path`; upstream handed over a
    /// module that is not inside any known module.
    pub fn owner_of(&self, path: &str) -> Result<&str, TreeError> {
        let path = with_trailing_slash(path);
        self.candidates
            .iter()
            .find(|candidate| **candidate != path && path.starts_with(candidate.as_str()))
            .map(String::as_str)
            .ok_or(TreeError::MissingAncestor { path })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCENARIO: [&str; 3] = [
        "Externals/conemu-inside",
        "Externals/ICSharpCode.TextEditor",
        "Externals/ICSharpCode.TextEditor/gitextensions/Externals/NBug",
    ];

    fn group(policy: InnerLeafPolicy, paths: &[&str]) -> Grouping<usize> {
        PathGrouper::new('/')
            .with_policy(policy)
            .group(paths.iter().enumerate().map(|(i, p)| (p.to_string(), i)))
    }

    /// One line per entry: indent, `+` for folders, `-` for leaves
    fn outline<P>(grouping: &Grouping<P>) -> Vec<String> {
        fn walk<P>(g: &Grouping<P>, index: usize, depth: usize, out: &mut Vec<String>) {
            let entry = &g.entries()[index];
            let marker = if entry.is_folder() { '+' } else { '-' };
            out.push(format!("{}{}{}", "  ".repeat(depth), marker, entry.segment));
            for &child in &entry.children {
                walk(g, child, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        for &root in grouping.roots() {
            walk(grouping, root, 0, &mut out);
        }
        out
    }

    #[test]
    fn test_nested_submodule_scenario() {
        let grouping = group(InnerLeafPolicy::Nest, &SCENARIO);
        assert_eq!(
            outline(&grouping),
            vec![
                "+Externals",
                "  -conemu-inside",
                "  -ICSharpCode.TextEditor",
                "    +gitextensions",
                "      +Externals",
                "        -NBug",
            ]
        );
        assert_eq!(grouping.folder_count(), 3);
    }

    #[test]
    fn test_fold_policy_adds_folder_beside_leaf() {
        let grouping = group(InnerLeafPolicy::Fold, &SCENARIO);
        assert_eq!(
            outline(&grouping),
            vec![
                "+Externals",
                "  -conemu-inside",
                "  -ICSharpCode.TextEditor",
                "  +ICSharpCode.TextEditor",
                "    +gitextensions",
                "      +Externals",
                "        -NBug",
            ]
        );
    }

    #[test]
    fn test_fold_policy_with_deeper_leaf_first() {
        let grouping = group(
            InnerLeafPolicy::Fold,
            &["lib/core/extra", "lib/core", "lib/other"],
        );
        assert_eq!(
            outline(&grouping),
            vec!["+lib", "  -core", "  +core", "    -extra", "  -other"]
        );
    }

    #[test]
    fn test_coexist_policy() {
        let grouping = group(InnerLeafPolicy::Coexist, &["v1", "v1/rc1", "v2"]);
        assert_eq!(outline(&grouping), vec!["-v1", "+v1", "  -rc1", "-v2"]);
    }

    #[test]
    fn test_shared_prefix_folder_created_once() {
        let grouping = group(
            InnerLeafPolicy::Nest,
            &["feature/a", "feature/b", "feature/ui/c", "main"],
        );
        assert_eq!(
            outline(&grouping),
            vec!["+feature", "  -a", "  -b", "  +ui", "    -c", "-main"]
        );
        assert_eq!(grouping.folder_count(), 2);
    }

    #[test]
    fn test_empty_segments_and_duplicates() {
        let grouping = PathGrouper::default().group(vec![
            ("a//b/".to_string(), 1),
            ("a/b".to_string(), 2),
            ("".to_string(), 3),
        ]);
        let payloads: Vec<_> = grouping.leaves().map(|(_, p)| *p).collect();
        assert_eq!(payloads, vec![1]);
        assert_eq!(outline(&grouping), vec!["+a", "  -b"]);
    }

    #[test]
    fn test_other_separator() {
        let grouping = PathGrouper::new('.')
            .group(vec![("net.http.client".to_string(), ())]);
        let (leaf, _) = grouping.leaves().next().unwrap();
        assert_eq!(grouping.path_of(leaf).as_deref(), Some("net.http.client"));
    }

    #[test]
    fn test_into_nodes() {
        use crate::view::tree::node::{BranchPathNode, TagNode};

        let grouping = group(InnerLeafPolicy::Coexist, &["release/1.0", "release/2.0", "v3"]);
        let mut nodes = Nodes::new();
        grouping
            .into_nodes(
                &mut nodes,
                None,
                |_, path| {
                    NodeKind::BranchPath(BranchPathNode {
                        full_path: path.to_string(),
                    })
                },
                |path, i| {
                    NodeKind::Tag(TagNode {
                        full_path: path.to_string(),
                        object_id: i.to_string(),
                    })
                },
            )
            .unwrap();

        let order: Vec<_> = nodes.depth_first().map(|n| n.display_text()).collect();
        assert_eq!(order, vec!["release", "1.0", "2.0", "v3"]);
        assert_eq!(nodes.root_count(), 2);
    }

    #[test]
    fn test_owner_of_picks_nearest() {
        let index = AncestorIndex::new([
            "C:/code/top/",
            "C:/code/top/Externals/ICSharpCode.TextEditor/",
            "C:/code/top/Externals/ICSharpCode.TextEditor/gitextensions/",
            "C:/code/top/Externals/NBug/",
        ]);

        assert_eq!(
            index.owner_of("C:/code/top/Externals/conemu-inside/").unwrap(),
            "C:/code/top/"
        );
        assert_eq!(
            index
                .owner_of("C:/code/top/Externals/ICSharpCode.TextEditor/gitextensions/Externals/NBug/")
                .unwrap(),
            "C:/code/top/Externals/ICSharpCode.TextEditor/gitextensions/"
        );
        assert_eq!(
            index
                .owner_of("C:/code/top/Externals/ICSharpCode.TextEditor/gitextensions")
                .unwrap(),
            "C:/code/top/Externals/ICSharpCode.TextEditor/"
        );
    }

    #[test]
    fn test_owner_of_requires_segment_boundary() {
        let index = AncestorIndex::new(["/repo/ab"]);
        assert!(index.owner_of("/repo/abc/x").is_err());
        assert!(index.owner_of("/repo/ab/x").is_ok());
    }

    #[test]
    fn test_owner_of_missing() {
        let index = AncestorIndex::new(["/repo/"]);
        let err = index.owner_of("/elsewhere/sub").unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingAncestor {
                path: "/elsewhere/sub/".to_string()
            }
        );
        // A path never owns itself
        assert!(index.owner_of("/repo").is_err());
    }

    fn leaf_paths() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::collection::vec("[a-c]{1,2}", 1..5), 0..16)
            .prop_map(|paths| paths.into_iter().map(|p| p.join("/")).collect())
    }

    fn policies() -> impl Strategy<Value = InnerLeafPolicy> {
        prop_oneof![
            Just(InnerLeafPolicy::Nest),
            Just(InnerLeafPolicy::Fold),
            Just(InnerLeafPolicy::Coexist),
        ]
    }

    proptest! {
        #[test]
        fn prop_leaf_paths_survive_grouping(paths in leaf_paths(), policy in policies()) {
            let grouping = PathGrouper::new('/')
                .with_policy(policy)
                .group(paths.iter().map(|p| (p.clone(), p.clone())));

            let mut distinct: Vec<&String> = Vec::new();
            for p in &paths {
                if !distinct.contains(&p) {
                    distinct.push(p);
                }
            }

            let leaves: Vec<_> = grouping.leaves().collect();
            prop_assert_eq!(leaves.len(), distinct.len());
            for (index, original) in leaves {
                let path = grouping.path_of(index);
                prop_assert_eq!(path.as_ref(), Some(original));
            }
        }

        #[test]
        fn prop_folders_are_unique_and_attached(paths in leaf_paths(), policy in policies()) {
            let grouping = PathGrouper::new('/')
                .with_policy(policy)
                .group(paths.iter().map(|p| (p.clone(), ())));

            let mut folder_paths = HashSet::new();
            for entry in grouping.entries().iter().filter(|e| e.is_folder()) {
                prop_assert!(folder_paths.insert(entry.path.clone()), "folder {} twice", entry.path);
            }

            let attached: usize = grouping.roots().len()
                + grouping.entries().iter().map(|e| e.children.len()).sum::<usize>();
            prop_assert_eq!(attached, grouping.entries().len());
        }

        #[test]
        fn prop_grouping_is_deterministic(paths in leaf_paths(), policy in policies()) {
            let grouper = PathGrouper::new('/').with_policy(policy);
            let first = grouper.group(paths.iter().map(|p| (p.clone(), ())));
            let second = grouper.group(paths.iter().map(|p| (p.clone(), ())));
            prop_assert_eq!(first, second);
        }
    }
}
