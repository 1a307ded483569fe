//! Tree Builder - flat, indent-annotated blocks to nested sections
//!
//! The forward direction of the sync engine: whenever the block list
//! changes, the whole tree is recomputed from scratch. Recursive descent
//! over the flat list, parameterized by the parent's indent level.

use crate::block::{Block, BlockKind};
use crate::outline::Section;
use crate::registry::ResourceRegistry;
use crate::util;

/// Build the nested section tree from the flat block list. Empty filler
/// blocks are dropped; an indent gap left behind by an importer or stale
/// state is clamped to one level below its parent rather than losing the
/// block's content.
pub fn build_tree(blocks: &[Block], registry: &ResourceRegistry) -> Vec<Section> {
    let (sections, _) = build_sections(blocks, 0, -1, registry);
    sections
}

fn build_sections(
    blocks: &[Block],
    start: usize,
    parent_level: i64,
    registry: &ResourceRegistry,
) -> (Vec<Section>, usize) {
    let mut sections = Vec::new();
    let mut index = start;

    while index < blocks.len() {
        let block = &blocks[index];
        let level = block.indent_level as i64;

        // Subtree closed; leave the block for an outer call
        if level <= parent_level {
            break;
        }

        if block.is_filler() {
            tracing::debug!(block_id = %block.id, "dropping empty filler block");
            index += 1;
            continue;
        }

        if level > parent_level + 1 {
            tracing::warn!(
                block_id = %block.id,
                level,
                parent_level,
                "indent gap: clamping block to one level below its parent"
            );
        }

        let mut section = section_for_block(block, registry);
        // Children nest relative to the block's original level, so a
        // clamped block keeps its own subtree intact.
        let (children, next) = build_sections(blocks, index + 1, level, registry);
        section.children = children;
        sections.push(section);
        index = next;
    }

    (sections, index)
}

fn section_for_block(block: &Block, registry: &ResourceRegistry) -> Section {
    match &block.kind {
        BlockKind::Ai {
            instruction,
            resources,
        } => {
            // Refs whose path is no longer registered are omitted
            let refs = resources
                .iter()
                .filter_map(|r| registry.resolve_key(&r.path))
                .map(String::from)
                .collect();
            Section::prompt(&block.heading, instruction, refs)
        }
        BlockKind::Text {
            body,
            resource,
            edited,
        } => {
            let inline_name = util::inline_file_name(&block.id);
            let resource_key = if *edited && !body.is_empty() {
                registry
                    .key_for_file_name(&inline_name)
                    .map(String::from)
                    .unwrap_or_default()
            } else {
                resource
                    .as_ref()
                    .and_then(|r| registry.resolve_key(&r.path))
                    .map(String::from)
                    .unwrap_or_default()
            };
            Section::static_(&block.heading, resource_key)
        }
        BlockKind::Heading => Section::bare(&block.heading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ResourceRef;
    use crate::outline::{MergeMode, SectionBody};

    fn registry_with(paths: &[&str]) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        for path in paths {
            registry.register(*path, "title", "", MergeMode::Concat);
        }
        registry
    }

    fn ai_block(id: &str, heading: &str, content: &str, level: usize) -> Block {
        let mut block = Block::new_ai(id, heading);
        block.set_content(content);
        block.indent_level = level;
        block
    }

    fn text_block(id: &str, heading: &str, path: Option<&str>, level: usize) -> Block {
        let mut block = Block::new_text(id, heading);
        if let Some(path) = path {
            block.attach_resource(ResourceRef::new(path, "title", ""));
        }
        block.indent_level = level;
        block
    }

    #[test]
    fn test_scenario_ai_parent_text_child() {
        let registry = registry_with(&["notes.txt"]);
        let blocks = vec![
            ai_block("b1", "Intro", "Write the intro", 0),
            text_block("b2", "Body", Some("notes.txt"), 1),
        ];

        let sections = build_tree(&blocks, &registry);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Intro");
        assert!(matches!(
            sections[0].body,
            SectionBody::Prompt { ref prompt, .. } if prompt == "Write the intro"
        ));
        assert_eq!(sections[0].children.len(), 1);
        assert_eq!(
            sections[0].children[0].body,
            SectionBody::Static {
                resource_key: "resource_1".to_string()
            }
        );
    }

    #[test]
    fn test_sibling_order_preserved() {
        let registry = ResourceRegistry::new();
        let blocks = vec![
            ai_block("b1", "One", "p", 0),
            ai_block("b2", "Two", "p", 0),
            ai_block("b3", "Three", "p", 0),
        ];

        let titles: Vec<_> = build_tree(&blocks, &registry)
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_filler_blocks_dropped() {
        let registry = ResourceRegistry::new();
        let blocks = vec![
            ai_block("b1", "Intro", "p", 0),
            text_block("b2", "", None, 0),
            ai_block("b3", "End", "p", 0),
        ];

        let sections = build_tree(&blocks, &registry);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[1].title, "End");
    }

    #[test]
    fn test_indent_gap_clamped_not_dropped() {
        let registry = ResourceRegistry::new();
        // Level jumps from 0 straight to 2: the gap block is kept as a
        // direct child, and its own child still nests beneath it.
        let blocks = vec![
            ai_block("b1", "Root", "p", 0),
            ai_block("b2", "Gapped", "p", 2),
            ai_block("b3", "Under gap", "p", 3),
        ];

        let sections = build_tree(&blocks, &registry);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].children.len(), 1);
        assert_eq!(sections[0].children[0].title, "Gapped");
        assert_eq!(sections[0].children[0].children[0].title, "Under gap");
    }

    #[test]
    fn test_unregistered_ref_omitted() {
        let registry = registry_with(&["known.txt"]);
        let mut block = ai_block("b1", "Intro", "p", 0);
        block.attach_resource(ResourceRef::new("known.txt", "K", ""));
        block.attach_resource(ResourceRef::new("gone.txt", "G", ""));

        let sections = build_tree(&[block], &registry);
        match &sections[0].body {
            SectionBody::Prompt { refs, .. } => {
                assert_eq!(refs, &vec!["resource_1".to_string()]);
            }
            other => panic!("expected prompt body, got {:?}", other),
        }
    }

    #[test]
    fn test_text_without_resource_has_empty_key() {
        let registry = ResourceRegistry::new();
        let blocks = vec![text_block("b1", "Loose", None, 0)];
        let sections = build_tree(&blocks, &registry);
        assert_eq!(
            sections[0].body,
            SectionBody::Static {
                resource_key: String::new()
            }
        );
    }

    #[test]
    fn test_edited_block_resolves_inline_key() {
        let mut registry = registry_with(&["notes.txt"]);
        let inline_path = format!("/session/files/{}", util::inline_file_name("b1"));
        registry.register_inline(inline_path, "Edited text");

        let mut block = text_block("b1", "Body", None, 0);
        block.set_content("typed over");

        let sections = build_tree(&[block], &registry);
        assert_eq!(
            sections[0].body,
            SectionBody::Static {
                resource_key: "inline_resource_1".to_string()
            }
        );
    }

    #[test]
    fn test_heading_block_becomes_bare_section() {
        let registry = ResourceRegistry::new();
        let mut heading = Block::new_heading("b1", "Part One");
        heading.indent_level = 0;

        let sections = build_tree(&[heading], &registry);
        assert_eq!(sections[0].body, SectionBody::Bare);
    }

    #[test]
    fn test_rebuild_idempotent() {
        let registry = registry_with(&["notes.txt"]);
        let blocks = vec![
            ai_block("b1", "Intro", "p", 0),
            text_block("b2", "Body", Some("notes.txt"), 1),
            ai_block("b3", "Next", "p", 1),
            ai_block("b4", "End", "p", 0),
        ];

        let first = build_tree(&blocks, &registry);
        let second = build_tree(&blocks, &registry);
        assert_eq!(first, second);
    }
}
