//! Node decorations: font and icon, derived from node state alone

use crate::services::repo::{DetailedSubmoduleInfo, SubmoduleStatus};
use crate::view::tree::NodeKind;
use std::fmt;

/// Icon shown in front of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKey {
    FolderClosed,
    Branch,
    Tag,
    Remote,
    RemoteDisabled,
    FolderSubmodule,
    SubmoduleRevisionUp,
    SubmoduleRevisionUpDirty,
    SubmoduleRevisionDown,
    SubmoduleRevisionDownDirty,
    SubmoduleRevisionSemiUp,
    SubmoduleRevisionSemiUpDirty,
    SubmoduleRevisionSemiDown,
    SubmoduleRevisionSemiDownDirty,
    SubmoduleDirty,
    FileStatusModified,
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
    pub bold: bool,
    pub italic: bool,
    pub image: ImageKey,
}

impl NodeStyle {
    fn plain(image: ImageKey) -> Self {
        Self {
            bold: false,
            italic: false,
            image,
        }
    }
}

/// Style for a node in its current state
pub fn node_style(kind: &NodeKind) -> NodeStyle {
    match kind {
        NodeKind::BranchPath(_) | NodeKind::SubmoduleFolder(_) => NodeStyle {
            italic: true,
            ..NodeStyle::plain(ImageKey::FolderClosed)
        },
        NodeKind::LocalBranch(branch) => NodeStyle {
            bold: branch.is_active,
            ..NodeStyle::plain(ImageKey::Branch)
        },
        NodeKind::RemoteBranch(_) => NodeStyle::plain(ImageKey::Branch),
        NodeKind::Tag(_) => NodeStyle::plain(ImageKey::Tag),
        NodeKind::RemoteRepo(remote) if remote.enabled => NodeStyle::plain(ImageKey::Remote),
        NodeKind::RemoteRepo(_) => NodeStyle::plain(ImageKey::RemoteDisabled),
        NodeKind::Submodule(submodule) => NodeStyle {
            bold: submodule.is_current,
            ..NodeStyle::plain(match &submodule.details {
                Some(details) => submodule_image(details),
                None => ImageKey::FolderSubmodule,
            })
        },
    }
}

/// Icon for a submodule whose detailed status has arrived
pub fn submodule_image(details: &DetailedSubmoduleInfo) -> ImageKey {
    let dirty = details.is_dirty;
    let pick = |clean, when_dirty| if dirty { when_dirty } else { clean };

    match details.status {
        None => ImageKey::FolderSubmodule,
        Some(SubmoduleStatus::FastForward) => {
            pick(ImageKey::SubmoduleRevisionUp, ImageKey::SubmoduleRevisionUpDirty)
        }
        Some(SubmoduleStatus::Rewind) => {
            pick(ImageKey::SubmoduleRevisionDown, ImageKey::SubmoduleRevisionDownDirty)
        }
        Some(SubmoduleStatus::NewerTime) => pick(
            ImageKey::SubmoduleRevisionSemiUp,
            ImageKey::SubmoduleRevisionSemiUpDirty,
        ),
        Some(SubmoduleStatus::OlderTime) => pick(
            ImageKey::SubmoduleRevisionSemiDown,
            ImageKey::SubmoduleRevisionSemiDownDirty,
        ),
        Some(_) => pick(ImageKey::FileStatusModified, ImageKey::SubmoduleDirty),
    }
}
