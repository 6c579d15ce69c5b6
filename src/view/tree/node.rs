use super::nodes::NodeCollection;
use crate::services::repo::{DetailedSubmoduleInfo, SubmoduleInfo};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for a tree node
///
/// Ids are never reused, not even across reloads, so an id captured before a
/// reload can only ever fail to resolve; it never aliases a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub(crate) fn next() -> Self {
        static NEXT_NODE: AtomicUsize = AtomicUsize::new(1);
        NodeId(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Discriminant of a node variant
///
/// Also the key context actions are registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantTag {
    LocalBranch,
    BranchPath,
    RemoteRepo,
    RemoteBranch,
    Tag,
    SubmoduleFolder,
    Submodule,
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantTag::LocalBranch => "local-branch",
            VariantTag::BranchPath => "branch-path",
            VariantTag::RemoteRepo => "remote",
            VariantTag::RemoteBranch => "remote-branch",
            VariantTag::Tag => "tag",
            VariantTag::SubmoduleFolder => "submodule-folder",
            VariantTag::Submodule => "submodule",
        };
        f.write_str(name)
    }
}

/// Identity of a node among its siblings
///
/// Stable across reloads as long as the underlying object is unchanged. The
/// variant is part of the key, so a folder and a leaf sharing one path are
/// distinct siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub variant: VariantTag,
    pub path: String,
}

impl NodeKey {
    pub fn new(variant: VariantTag, path: impl Into<String>) -> Self {
        Self {
            variant,
            path: path.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variant, self.path)
    }
}

/// How a submodule node builds its label, captured when the node is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmoduleLabel {
    /// Last path segment plus the branch part of the status text
    Name,
    /// The status text as delivered
    RawText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBranchNode {
    pub full_path: String,
    pub object_id: String,
    pub is_active: bool,
}

/// Folder grouping branches, remote branches or tags that share a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPathNode {
    pub full_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepoNode {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranchNode {
    pub remote: String,
    /// Branch path below the remote, e.g. `feature/x` for `origin/feature/x`
    pub branch: String,
    pub object_id: String,
}

impl RemoteBranchNode {
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub full_path: String,
    pub object_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleFolderNode {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct SubmoduleNode {
    pub info: SubmoduleInfo,
    pub is_current: bool,
    /// Path of the submodule relative to its super project
    pub local_path: String,
    /// Working directory of the owning super project
    pub super_path: String,
    /// Path relative to the top project, used for grouping and identity
    pub relative_path: String,
    pub label: SubmoduleLabel,
    /// Filled by the detail load that runs after the tree is applied
    pub details: Option<DetailedSubmoduleInfo>,
}

impl SubmoduleNode {
    /// The current module cannot be opened again
    pub fn can_open(&self) -> bool {
        !self.is_current
    }
}

/// Closed set of node variants
#[derive(Debug, Clone)]
pub enum NodeKind {
    LocalBranch(LocalBranchNode),
    BranchPath(BranchPathNode),
    RemoteRepo(RemoteRepoNode),
    RemoteBranch(RemoteBranchNode),
    Tag(TagNode),
    SubmoduleFolder(SubmoduleFolderNode),
    Submodule(SubmoduleNode),
}

impl NodeKind {
    pub fn tag(&self) -> VariantTag {
        match self {
            NodeKind::LocalBranch(_) => VariantTag::LocalBranch,
            NodeKind::BranchPath(_) => VariantTag::BranchPath,
            NodeKind::RemoteRepo(_) => VariantTag::RemoteRepo,
            NodeKind::RemoteBranch(_) => VariantTag::RemoteBranch,
            NodeKind::Tag(_) => VariantTag::Tag,
            NodeKind::SubmoduleFolder(_) => VariantTag::SubmoduleFolder,
            NodeKind::Submodule(_) => VariantTag::Submodule,
        }
    }

    /// Path that identifies this node within its tree
    pub fn identity_path(&self) -> String {
        match self {
            NodeKind::LocalBranch(n) => n.full_path.clone(),
            NodeKind::BranchPath(n) => n.full_path.clone(),
            NodeKind::RemoteRepo(n) => n.name.clone(),
            NodeKind::RemoteBranch(n) => n.full_path(),
            NodeKind::Tag(n) => n.full_path.clone(),
            NodeKind::SubmoduleFolder(n) => n.path.clone(),
            NodeKind::Submodule(n) => n.relative_path.clone(),
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.tag(), self.identity_path())
    }

    /// Label shown in the view
    pub fn display_text(&self) -> String {
        match self {
            NodeKind::LocalBranch(n) => last_segment(&n.full_path).to_string(),
            NodeKind::BranchPath(n) => last_segment(&n.full_path).to_string(),
            NodeKind::RemoteRepo(n) => n.name.clone(),
            NodeKind::RemoteBranch(n) => last_segment(&n.branch).to_string(),
            NodeKind::Tag(n) => last_segment(&n.full_path).to_string(),
            NodeKind::SubmoduleFolder(n) => n.name.clone(),
            NodeKind::Submodule(n) => submodule_text(&n.info.text, n.label),
        }
    }

    /// Whether this node only groups other nodes
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::BranchPath(_) | NodeKind::SubmoduleFolder(_))
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `"Externals/conemu-inside [no branch]"` becomes `"conemu-inside [no branch]"`.
///
/// The branch part is absent until the submodule has been initialised.
fn submodule_text(text: &str, label: SubmoduleLabel) -> String {
    if label == SubmoduleLabel::RawText {
        return text.to_string();
    }

    match text.split_once(' ') {
        Some((path, branch)) => format!("{} {}", last_segment(path), branch),
        None => last_segment(text).to_string(),
    }
}

/// Typed access to one variant of [`NodeKind`]
pub trait NodeVariant {
    const TAG: VariantTag;

    fn from_kind(kind: &NodeKind) -> Option<&Self>;

    fn from_kind_mut(kind: &mut NodeKind) -> Option<&mut Self>;
}

macro_rules! node_variant {
    ($ty:ty, $variant:ident) => {
        impl NodeVariant for $ty {
            const TAG: VariantTag = VariantTag::$variant;

            fn from_kind(kind: &NodeKind) -> Option<&Self> {
                match kind {
                    NodeKind::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_kind_mut(kind: &mut NodeKind) -> Option<&mut Self> {
                match kind {
                    NodeKind::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

node_variant!(LocalBranchNode, LocalBranch);
node_variant!(BranchPathNode, BranchPath);
node_variant!(RemoteRepoNode, RemoteRepo);
node_variant!(RemoteBranchNode, RemoteBranch);
node_variant!(TagNode, Tag);
node_variant!(SubmoduleFolderNode, SubmoduleFolder);
node_variant!(SubmoduleNode, Submodule);

/// Represents a node in a repository object tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Variant payload
    pub kind: NodeKind,
    /// Parent node ID (None for roots)
    pub parent: Option<NodeId>,
    /// Ordered children
    pub children: NodeCollection,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            parent,
            children: NodeCollection::default(),
        }
    }

    pub fn key(&self) -> NodeKey {
        self.kind.key()
    }

    pub fn display_text(&self) -> String {
        self.kind.display_text()
    }

    pub fn variant(&self) -> VariantTag {
        self.kind.tag()
    }

    /// Typed view of this node, `None` when it is another variant
    pub fn as_variant<T: NodeVariant>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
