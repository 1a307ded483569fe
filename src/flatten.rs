//! Tree Flattener - nested sections back to flat blocks, used on import
//!
//! Depth-first pre-order traversal: each section becomes one block at
//! `indent_level = depth`, so indent levels are consistent by construction
//! and no validation pass runs on this direction. Resource resolution
//! failures (unknown key, missing file) are reported per-resource and never
//! abort the siblings.

use std::fs;

use crate::block::{Block, BlockKind, ResourceRef};
use crate::outline::{is_inline_key, Outline, Section, SectionBody};
use crate::util;

/// Flatten an outline into the block list the editing surface works on.
/// Block ids are issued sequentially starting at `id_seed`. Returns the
/// blocks plus a warning per resource that failed to resolve.
pub fn flatten_outline(outline: &Outline, id_seed: usize) -> (Vec<Block>, Vec<String>) {
    let mut blocks = Vec::new();
    let mut warnings = Vec::new();
    let mut next_id = id_seed;

    walk(outline, &outline.sections, 0, &mut blocks, &mut warnings, &mut next_id);

    (blocks, warnings)
}

fn walk(
    outline: &Outline,
    sections: &[Section],
    depth: usize,
    blocks: &mut Vec<Block>,
    warnings: &mut Vec<String>,
    next_id: &mut usize,
) {
    for section in sections {
        *next_id += 1;
        let id = format!("block_{}", *next_id);

        let mut block = match &section.body {
            SectionBody::Prompt { prompt, refs } => {
                let mut block = Block::new_ai(id, &section.title);
                block.set_content(prompt.clone());
                for key in refs {
                    match outline.resource_by_key(key) {
                        Some(resource) => block.attach_resource(ResourceRef::from(resource)),
                        None => warn(
                            warnings,
                            format!(
                                "section {:?}: ref {:?} matches no resource, skipping",
                                section.title, key
                            ),
                        ),
                    }
                }
                block
            }
            SectionBody::Static { resource_key } => {
                static_block(outline, section, resource_key, id, warnings)
            }
            SectionBody::Bare => Block::new_heading(id, &section.title),
        };

        block.indent_level = depth;
        blocks.push(block);

        walk(outline, &section.children, depth + 1, blocks, warnings, next_id);
    }
}

fn static_block(
    outline: &Outline,
    section: &Section,
    resource_key: &str,
    id: String,
    warnings: &mut Vec<String>,
) -> Block {
    let mut block = Block::new_text(id, &section.title);
    if resource_key.is_empty() {
        return block;
    }

    let Some(resource) = outline.resource_by_key(resource_key) else {
        warn(
            warnings,
            format!(
                "section {:?}: resource key {:?} matches no resource",
                section.title, resource_key
            ),
        );
        return block;
    };

    if resource.is_inline || is_inline_key(resource_key) {
        // Hand-edited content lives in the inline file; load it straight
        // into the block and keep the edited flag so it materializes again.
        match fs::read_to_string(&resource.path) {
            Ok(content) => block.set_content(content),
            Err(e) => warn(
                warnings,
                format!(
                    "section {:?}: inline resource file {:?} unreadable: {}",
                    section.title, resource.path, e
                ),
            ),
        }
        return block;
    }

    block.attach_resource(ResourceRef::from(resource));
    if util::is_url(&resource.path) {
        return block;
    }

    // Load the file content for display without marking the block edited
    match fs::read_to_string(&resource.path) {
        Ok(content) => {
            if let BlockKind::Text { body, .. } = &mut block.kind {
                *body = content;
            }
        }
        Err(e) => warn(
            warnings,
            format!(
                "section {:?}: resource file {:?} unreadable: {}",
                section.title, resource.path, e
            ),
        ),
    }

    block
}

fn warn(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{}", message);
    warnings.push(message);
}
