//! OutlineEngine - the session-scoped mutation surface
//!
//! Every user edit mutates the in-memory block list, then unconditionally
//! triggers a full rebuild of the canonical outline: materialize edited
//! text, collect unreferenced resources, re-assign keys, and recompute the
//! section tree from scratch. Edits are processed to completion before the
//! next one is accepted; a failed edit leaves the last-good derived outline
//! in place.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::block::{Block, BlockKindTag, ResourceRef};
use crate::builder::build_tree;
use crate::bundle::{self, BundleError, BundleManifest};
use crate::flatten::flatten_outline;
use crate::generate::{GenerateError, GenerationExecutor};
use crate::indent::{apply_indent, IndentDirection};
use crate::materialize::materialize_edited_blocks;
use crate::outline::{MergeMode, Outline, OutlineError};
use crate::registry::ResourceRegistry;
use crate::session::Session;
use crate::util;

// === Errors ===

/// Unified error surface of the engine
#[derive(Debug)]
pub enum EngineError {
    Outline(OutlineError),
    Bundle(BundleError),
    Io(io::Error),
    /// A mutation targeted a block id that does not exist
    UnknownBlock { id: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Outline(e) => write!(f, "{}", e),
            EngineError::Bundle(e) => write!(f, "{}", e),
            EngineError::Io(e) => write!(f, "I/O error: {}", e),
            EngineError::UnknownBlock { id } => write!(f, "Unknown block id: {}", id),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<OutlineError> for EngineError {
    fn from(e: OutlineError) -> Self {
        EngineError::Outline(e)
    }
}

impl From<BundleError> for EngineError {
    fn from(e: BundleError) -> Self {
        EngineError::Bundle(e)
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

// === Upload Report ===

/// A file skipped during a batch upload, with the reason
#[derive(Debug, Clone)]
pub struct UploadSkip {
    pub file: String,
    pub reason: String,
}

/// Outcome of a batch upload: skipped files do not fail the batch
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Session-local paths of the resources that were registered
    pub added: Vec<String>,
    pub skipped: Vec<UploadSkip>,
}

// === OutlineEngine ===

/// Core engine for one editing session
pub struct OutlineEngine {
    session: Session,
    title: String,
    general_instruction: String,
    blocks: Vec<Block>,
    registry: ResourceRegistry,
    outline: Outline,
    next_block_id: usize,
}

impl OutlineEngine {
    /// Create an engine over the given session, creating its directories
    pub fn new(session: Session) -> io::Result<Self> {
        session.create()?;
        Ok(Self {
            session,
            title: String::new(),
            general_instruction: String::new(),
            blocks: Vec::new(),
            registry: ResourceRegistry::new(),
            outline: Outline::default(),
            next_block_id: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The canonical derived outline as of the last successful rebuild
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// The outline shape handed to the rendering/editing layer
    pub fn outline_for_editor(&self) -> Outline {
        self.outline.without_inline_resources()
    }

    fn next_id(&mut self) -> String {
        self.next_block_id += 1;
        format!("block_{}", self.next_block_id)
    }

    fn block_index(&self, id: &str) -> EngineResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| EngineError::UnknownBlock { id: id.to_string() })
    }

    fn references(&self, path: &str) -> bool {
        self.blocks
            .iter()
            .any(|b| b.resources().iter().any(|r| r.path == path))
    }

    /// Drop the registry entry for a path if no block references it anymore
    fn collect_if_unreferenced(&mut self, path: &str) {
        if !self.references(path) {
            self.registry.remove(path);
        }
    }

    // === Block Mutations ===

    /// Insert a new block at `at` (or the end). The block inherits its
    /// predecessor's indent level, which the validator always permits.
    pub fn add_block(&mut self, kind: BlockKindTag, at: Option<usize>) -> EngineResult<String> {
        let id = self.next_id();
        let index = at.unwrap_or(self.blocks.len()).min(self.blocks.len());

        let mut block = match kind {
            BlockKindTag::Ai => Block::new_ai(&id, ""),
            BlockKindTag::Text => Block::new_text(&id, ""),
            BlockKindTag::Heading => Block::new_heading(&id, ""),
        };
        block.indent_level = if index == 0 {
            0
        } else {
            self.blocks[index - 1].indent_level
        };

        self.blocks.insert(index, block);
        self.rebuild()?;
        Ok(id)
    }

    /// Remove a block and collect registry entries it alone referenced,
    /// including its materialized inline resource if it had one.
    pub fn remove_block(&mut self, id: &str) -> EngineResult<()> {
        let index = self.block_index(id)?;
        let removed = self.blocks.remove(index);

        for resource_ref in removed.resources() {
            self.collect_if_unreferenced(&resource_ref.path);
        }
        let inline_name = util::inline_file_name(&removed.id);
        if let Some(path) = self
            .registry
            .key_for_file_name(&inline_name)
            .and_then(|key| self.registry.get_by_key(key))
            .map(|r| r.path.clone())
        {
            self.registry.remove(&path);
        }

        self.rebuild()
    }

    pub fn set_heading(&mut self, id: &str, heading: impl Into<String>) -> EngineResult<()> {
        let index = self.block_index(id)?;
        self.blocks[index].heading = heading.into();
        self.rebuild()
    }

    /// Replace a block's text content. For text blocks this marks the block
    /// edited, which the next rebuild materializes into an inline resource.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> EngineResult<()> {
        let index = self.block_index(id)?;
        self.blocks[index].set_content(content);
        self.rebuild()
    }

    /// Convert a block to another kind; prior per-kind content is cached
    /// and restored when converting back.
    pub fn convert_block(&mut self, id: &str, kind: BlockKindTag) -> EngineResult<()> {
        let index = self.block_index(id)?;
        self.blocks[index].convert_to(kind);
        self.rebuild()
    }

    /// Request an indent change. An illegal request is a no-op, not an
    /// error; returns whether anything changed.
    pub fn indent(&mut self, id: &str, direction: IndentDirection) -> EngineResult<bool> {
        let index = self.block_index(id)?;
        let changed = apply_indent(&mut self.blocks, index, direction);
        if changed {
            self.rebuild()?;
        }
        Ok(changed)
    }

    // === Resource Mutations ===

    /// Attach a registered or new resource to a block
    pub fn attach_resource(
        &mut self,
        id: &str,
        path: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        merge_mode: MergeMode,
    ) -> EngineResult<()> {
        let index = self.block_index(id)?;
        let path = path.into();
        let title = title.into();
        let description = description.into();

        self.registry
            .register(path.clone(), title.clone(), description.clone(), merge_mode);
        self.blocks[index].attach_resource(ResourceRef::new(path, title, description));
        self.rebuild()
    }

    /// Detach a resource from a block; the registry entry is collected once
    /// no block references the path.
    pub fn detach_resource(&mut self, id: &str, path: &str) -> EngineResult<()> {
        let index = self.block_index(id)?;
        self.blocks[index].detach_resource(path);
        self.collect_if_unreferenced(path);
        self.rebuild()
    }

    /// Update the shared description of a resource. Every block holding a
    /// reference to the path sees the change.
    pub fn set_resource_description(
        &mut self,
        path: &str,
        description: impl Into<String>,
    ) -> EngineResult<()> {
        let description = description.into();
        self.registry.set_description(path, description.clone());
        for block in &mut self.blocks {
            if block.resources().iter().any(|r| r.path == path) {
                block.attach_resource(ResourceRef::new(
                    path,
                    self.registry
                        .get(path)
                        .map(|r| r.title.clone())
                        .unwrap_or_default(),
                    description.clone(),
                ));
            }
        }
        self.rebuild()
    }

    /// Register a URL resource without attaching it to a block yet
    pub fn add_url_resource(
        &mut self,
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> EngineResult<()> {
        self.registry
            .register(url, title, description, MergeMode::Concat);
        self.rebuild()
    }

    /// Copy a batch of files into the session's files directory and
    /// register them. An unreadable or protected file is skipped with a
    /// warning; the rest of the batch proceeds.
    pub fn upload_resources(&mut self, paths: &[PathBuf]) -> EngineResult<UploadReport> {
        let files_dir = self.session.files_dir();
        fs::create_dir_all(&files_dir)?;

        let mut used: Vec<String> = existing_file_names(&files_dir)?;
        let mut report = UploadReport::default();

        for source in paths {
            let source_display = util::display_path(source);
            let data = match fs::read(source) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(file = %source_display, "skipping unreadable upload: {}", e);
                    report.skipped.push(UploadSkip {
                        file: source_display,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let original_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            let stored_name = util::unique_file_name(&original_name, &used);
            used.push(stored_name.clone());

            let destination = files_dir.join(&stored_name);
            fs::write(&destination, &data)?;

            let content = String::from_utf8_lossy(&data);
            let title = util::title_from_content(source, &content);
            let stored_path = util::display_path(&destination);
            self.registry
                .register(stored_path.clone(), title, "", MergeMode::Concat);
            report.added.push(stored_path);
        }

        self.rebuild()?;
        Ok(report)
    }

    // === Rebuild ===

    /// Full recompute of the canonical outline from the block list. Runs
    /// after every mutation; on failure the previous outline stays visible.
    pub fn rebuild(&mut self) -> EngineResult<()> {
        let files_dir = self.session.files_dir();
        fs::create_dir_all(&files_dir)?;

        // Durable inline writes happen before any reference changes
        let detached =
            materialize_edited_blocks(&mut self.blocks, &mut self.registry, &files_dir)?;
        for path in detached {
            self.collect_if_unreferenced(&path);
        }

        self.registry.assign_keys();
        let sections = build_tree(&self.blocks, &self.registry);
        self.outline = Outline {
            title: self.title.clone(),
            general_instruction: self.general_instruction.clone(),
            resources: self.registry.resources().to_vec(),
            sections,
        };
        Ok(())
    }

    // === Outline Metadata ===

    pub fn set_title(&mut self, title: impl Into<String>) -> EngineResult<()> {
        self.title = title.into();
        self.rebuild()
    }

    pub fn set_general_instruction(&mut self, instruction: impl Into<String>) -> EngineResult<()> {
        self.general_instruction = instruction.into();
        self.rebuild()
    }

    // === Import / Export ===

    /// Serialize the canonical outline to its interchange JSON form
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(self.outline.to_json()?)
    }

    /// Import an outline from interchange JSON. A malformed document leaves
    /// the engine at its last-good state. Returns per-resource warnings.
    pub fn import_json(&mut self, json: &str) -> EngineResult<Vec<String>> {
        let outline = Outline::from_json(json)?;
        self.import_outline(outline)
    }

    fn import_outline(&mut self, outline: Outline) -> EngineResult<Vec<String>> {
        let (blocks, warnings) = flatten_outline(&outline, self.next_block_id);
        self.next_block_id += blocks.len();

        self.title = outline.title;
        self.general_instruction = outline.general_instruction;
        self.registry.absorb(&outline.resources);
        self.blocks = blocks;

        self.rebuild()?;
        Ok(warnings)
    }

    // === Docpack ===

    /// Write the current outline and all referenced resource files to one
    /// portable archive.
    pub fn save_bundle(&self, destination: &Path) -> EngineResult<BundleManifest> {
        Ok(bundle::bundle(&self.outline, destination)?)
    }

    /// Import a docpack archive into this session. All-or-nothing: a
    /// disallowed resource extension aborts before anything changes.
    pub fn load_bundle(
        &mut self,
        archive: &Path,
        allowed_extensions: &[&str],
    ) -> EngineResult<Vec<String>> {
        let outline = bundle::unbundle(archive, &self.session.files_dir(), allowed_extensions)?;
        self.import_outline(outline)
    }

    // === Generation ===

    /// Hand the finished outline to the generation executor. Failures are
    /// propagated without interpretation.
    pub async fn generate(
        &self,
        executor: &dyn GenerationExecutor,
    ) -> Result<String, GenerateError> {
        executor.generate(&self.outline).await
    }
}

fn existing_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
