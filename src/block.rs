//! Block - the flat, user-editable unit of document content
//!
//! Blocks are what the editing surface manipulates: an ordered list of
//! indented entries, each either an AI instruction, a text body, or a bare
//! heading. The nested section tree is always derived from this list, never
//! the other way around (except on import).

use crate::outline::Resource;

/// A resource attachment as seen from a block: the path is the identity,
/// the registry owns the shared title/description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub path: String,
    pub title: String,
    pub description: String,
}

impl ResourceRef {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

impl From<&Resource> for ResourceRef {
    fn from(resource: &Resource) -> Self {
        Self {
            path: resource.path.clone(),
            title: resource.title.clone(),
            description: resource.description.clone(),
        }
    }
}

/// Block variant. The payload shapes enforce the structural invariants:
/// AI blocks may hold many resources, text blocks at most one, and only
/// text blocks carry the hand-edited flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Ai {
        instruction: String,
        resources: Vec<ResourceRef>,
    },
    Text {
        body: String,
        resource: Option<ResourceRef>,
        edited: bool,
    },
    Heading,
}

/// Discriminant-only view of a block kind, used for conversion requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKindTag {
    Ai,
    Text,
    Heading,
}

/// Per-kind payload stash so converting a block's kind and back restores
/// the previously entered text, attachments, and edited state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KindCache {
    ai: Option<(String, Vec<ResourceRef>)>,
    text: Option<(String, Option<ResourceRef>, bool)>,
}

/// Flat editing unit with an indent level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Opaque unique token, stable across edits
    pub id: String,
    /// Display title (may be empty)
    pub heading: String,
    /// Nesting depth, constrained relative to the predecessor block
    pub indent_level: usize,
    pub kind: BlockKind,
    cache: KindCache,
}

impl Block {
    pub fn new_ai(id: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            heading: heading.into(),
            indent_level: 0,
            kind: BlockKind::Ai {
                instruction: String::new(),
                resources: Vec::new(),
            },
            cache: KindCache::default(),
        }
    }

    pub fn new_text(id: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            heading: heading.into(),
            indent_level: 0,
            kind: BlockKind::Text {
                body: String::new(),
                resource: None,
                edited: false,
            },
            cache: KindCache::default(),
        }
    }

    pub fn new_heading(id: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            heading: heading.into(),
            indent_level: 0,
            kind: BlockKind::Heading,
            cache: KindCache::default(),
        }
    }

    pub fn kind_tag(&self) -> BlockKindTag {
        match self.kind {
            BlockKind::Ai { .. } => BlockKindTag::Ai,
            BlockKind::Text { .. } => BlockKindTag::Text,
            BlockKind::Heading => BlockKindTag::Heading,
        }
    }

    /// Current text content: the instruction for AI blocks, the body for
    /// text blocks, empty for headings.
    pub fn content(&self) -> &str {
        match &self.kind {
            BlockKind::Ai { instruction, .. } => instruction,
            BlockKind::Text { body, .. } => body,
            BlockKind::Heading => "",
        }
    }

    /// Replace the text content. A text block is marked edited: its body no
    /// longer mirrors whatever resource originally backed it. Headings have
    /// no content; the call is ignored for them.
    pub fn set_content(&mut self, content: impl Into<String>) {
        match &mut self.kind {
            BlockKind::Ai { instruction, .. } => *instruction = content.into(),
            BlockKind::Text { body, edited, .. } => {
                *body = content.into();
                *edited = true;
            }
            BlockKind::Heading => {}
        }
    }

    pub fn is_edited(&self) -> bool {
        matches!(self.kind, BlockKind::Text { edited: true, .. })
    }

    /// Attached resources in order. Text blocks expose at most one.
    pub fn resources(&self) -> &[ResourceRef] {
        match &self.kind {
            BlockKind::Ai { resources, .. } => resources,
            BlockKind::Text { resource, .. } => {
                resource.as_ref().map(std::slice::from_ref).unwrap_or(&[])
            }
            BlockKind::Heading => &[],
        }
    }

    /// Attach a resource reference. AI blocks accumulate (replacing a
    /// previous attachment of the same path); text blocks hold a single
    /// reference, so attaching replaces it. Headings take no attachments.
    pub fn attach_resource(&mut self, resource_ref: ResourceRef) {
        match &mut self.kind {
            BlockKind::Ai { resources, .. } => {
                if let Some(existing) = resources.iter_mut().find(|r| r.path == resource_ref.path) {
                    *existing = resource_ref;
                } else {
                    resources.push(resource_ref);
                }
            }
            BlockKind::Text { resource, .. } => *resource = Some(resource_ref),
            BlockKind::Heading => {}
        }
    }

    /// Detach the resource with the given path. Returns whether anything
    /// was removed.
    pub fn detach_resource(&mut self, path: &str) -> bool {
        match &mut self.kind {
            BlockKind::Ai { resources, .. } => {
                let before = resources.len();
                resources.retain(|r| r.path != path);
                resources.len() != before
            }
            BlockKind::Text { resource, .. } => {
                if resource.as_ref().map(|r| r.path == path).unwrap_or(false) {
                    *resource = None;
                    true
                } else {
                    false
                }
            }
            BlockKind::Heading => false,
        }
    }

    /// A filler block exists only as an editing placeholder: no heading,
    /// no content, no attachments. The tree builder drops these.
    pub fn is_filler(&self) -> bool {
        self.heading.is_empty() && self.content().is_empty() && self.resources().is_empty()
    }

    /// Convert this block to another kind, stashing the current payload so
    /// a later conversion back restores it.
    pub fn convert_to(&mut self, target: BlockKindTag) {
        if self.kind_tag() == target {
            return;
        }

        let previous = std::mem::replace(&mut self.kind, BlockKind::Heading);
        match previous {
            BlockKind::Ai {
                instruction,
                resources,
            } => self.cache.ai = Some((instruction, resources)),
            BlockKind::Text {
                body,
                resource,
                edited,
            } => self.cache.text = Some((body, resource, edited)),
            BlockKind::Heading => {}
        }

        self.kind = match target {
            BlockKindTag::Ai => {
                let (instruction, resources) = self.cache.ai.take().unwrap_or_default();
                BlockKind::Ai {
                    instruction,
                    resources,
                }
            }
            BlockKindTag::Text => {
                let (body, resource, edited) = self.cache.text.take().unwrap_or_default();
                BlockKind::Text {
                    body,
                    resource,
                    edited,
                }
            }
            BlockKindTag::Heading => BlockKind::Heading,
        };
    }
}
