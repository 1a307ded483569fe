//! Canonical outline model and interchange format
//!
//! The outline is the nested, derived form of the flat block list: a tree of
//! sections plus the resource table they reference by key. This is the shape
//! the document-generation executor consumes and the shape persisted inside
//! a docpack archive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants as C;

// === Errors ===

/// Structural validation error for outline data
#[derive(Debug, Clone)]
pub enum OutlineError {
    /// A section carries both a prompt and a resource key
    ConflictingModes { title: String },
    /// The interchange JSON could not be parsed
    Malformed { message: String },
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlineError::ConflictingModes { title } => {
                write!(
                    f,
                    "Section {:?} has both a prompt and a resource key (expected exactly one mode)",
                    title
                )
            }
            OutlineError::Malformed { message } => {
                write!(f, "Malformed outline JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for OutlineError {}

// === Resources ===

/// How a resource's content is merged into the generation context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    #[default]
    Concat,
    Dict,
}

/// A named reference to file or URL content usable by one or more sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable per-outline identifier sections use to reference this entry
    pub key: String,
    /// File path or URL; the identity blocks reference, distinct from the key
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merge_mode: MergeMode,
    /// True for resources materialized from hand-edited text
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_inline: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Whether a resource key names a materialized inline resource
pub fn is_inline_key(key: &str) -> bool {
    key.starts_with(C::INLINE_KEY_PREFIX)
}

// === Sections ===

/// Content mode of a section: AI-generated, bound to one static resource,
/// or a bare structural heading. A section never holds both a prompt and a
/// resource key; that shape is rejected at deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Prompt { prompt: String, refs: Vec<String> },
    Static { resource_key: String },
    Bare,
}

/// Canonical nested unit of the outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SectionRepr", into = "SectionRepr")]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
    pub children: Vec<Section>,
}

impl Section {
    pub fn prompt(title: impl Into<String>, prompt: impl Into<String>, refs: Vec<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Prompt {
                prompt: prompt.into(),
                refs,
            },
            children: Vec::new(),
        }
    }

    pub fn static_(title: impl Into<String>, resource_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Static {
                resource_key: resource_key.into(),
            },
            children: Vec::new(),
        }
    }

    pub fn bare(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Bare,
            children: Vec::new(),
        }
    }
}

/// Wire shape of a section: optional mode fields validated on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SectionRepr {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sections: Vec<SectionRepr>,
}

impl TryFrom<SectionRepr> for Section {
    type Error = OutlineError;

    fn try_from(repr: SectionRepr) -> Result<Self, Self::Error> {
        let has_prompt = repr.prompt.is_some() || !repr.refs.is_empty();
        if has_prompt && repr.resource_key.is_some() {
            return Err(OutlineError::ConflictingModes { title: repr.title });
        }

        let body = if has_prompt {
            SectionBody::Prompt {
                prompt: repr.prompt.unwrap_or_default(),
                refs: repr.refs,
            }
        } else if let Some(resource_key) = repr.resource_key {
            SectionBody::Static { resource_key }
        } else {
            SectionBody::Bare
        };

        let children = repr
            .sections
            .into_iter()
            .map(Section::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Section {
            title: repr.title,
            body,
            children,
        })
    }
}

impl From<Section> for SectionRepr {
    fn from(section: Section) -> Self {
        let (prompt, refs, resource_key) = match section.body {
            SectionBody::Prompt { prompt, refs } => (Some(prompt), refs, None),
            SectionBody::Static { resource_key } => (None, Vec::new(), Some(resource_key)),
            SectionBody::Bare => (None, Vec::new(), None),
        };

        SectionRepr {
            title: section.title,
            prompt,
            refs,
            resource_key,
            sections: section.children.into_iter().map(SectionRepr::from).collect(),
        }
    }
}

// === Outline ===

/// The canonical, derived document outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Outline {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub general_instruction: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Outline {
    /// Parse the interchange JSON form
    pub fn from_json(json: &str) -> Result<Self, OutlineError> {
        serde_json::from_str(json).map_err(|e| OutlineError::Malformed {
            message: e.to_string(),
        })
    }

    /// Serialize to the interchange JSON form
    pub fn to_json(&self) -> Result<String, OutlineError> {
        serde_json::to_string_pretty(self).map_err(|e| OutlineError::Malformed {
            message: e.to_string(),
        })
    }

    /// The shape handed to the rendering/editing layer: inline resources are
    /// omitted because their content already lives inside the edited blocks.
    pub fn without_inline_resources(&self) -> Outline {
        Outline {
            title: self.title.clone(),
            general_instruction: self.general_instruction.clone(),
            resources: self
                .resources
                .iter()
                .filter(|r| !r.is_inline)
                .cloned()
                .collect(),
            sections: self.sections.clone(),
        }
    }

    /// Look up a resource by key
    pub fn resource_by_key(&self, key: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.key == key)
    }
}
