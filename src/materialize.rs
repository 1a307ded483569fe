//! Inline Resource Materializer
//!
//! When a text block's content has been hand-edited away from its backing
//! resource, the content is promoted to a standalone "inline" resource: a
//! real file under the session's files directory plus a registry entry with
//! an inline_resource_K key. The write happens before any in-memory
//! reference changes, so materialization never discards content. The
//! original resource is detached from the block but stays registered while
//! other blocks still use it.

use std::fs;
use std::io;
use std::path::Path;

use crate::block::{Block, BlockKind};
use crate::constants as C;
use crate::registry::ResourceRegistry;
use crate::util;

/// Materialize every edited, non-empty text block in the list. Called at
/// the start of each rebuild, before key assignment and tree construction.
/// Returns the paths of original resources detached from their blocks, so
/// the caller can collect entries no other block references.
pub fn materialize_edited_blocks(
    blocks: &mut [Block],
    registry: &mut ResourceRegistry,
    files_dir: &Path,
) -> io::Result<Vec<String>> {
    let mut detached = Vec::new();
    for block in blocks.iter_mut() {
        let title = if block.heading.is_empty() {
            C::DEFAULT_INLINE_TITLE.to_string()
        } else {
            block.heading.clone()
        };
        let file_name = util::inline_file_name(&block.id);

        let BlockKind::Text {
            body,
            resource,
            edited,
        } = &mut block.kind
        else {
            continue;
        };
        if !*edited || body.is_empty() {
            continue;
        }

        // The file name is derived from the block id, so re-materializing
        // the same block overwrites instead of accumulating copies.
        let path = files_dir.join(&file_name);
        fs::write(&path, body.as_bytes())?;

        registry.register_inline(util::display_path(&path), title);

        // Detach the original file reference; the registry keeps the entry
        // while any other block still references its path.
        if let Some(original) = resource.take() {
            detached.push(original.path);
        }
    }

    Ok(detached)
}
