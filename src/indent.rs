//! Indent Validator - legal indent transitions on the flat block list
//!
//! A block may only nest one level deeper than its immediate predecessor,
//! and never deeper than MAX_INDENT_LEVEL. Illegal requests are no-ops, not
//! errors: state is left unchanged and the caller re-derives the outline
//! regardless.

use crate::block::Block;
use crate::constants::MAX_INDENT_LEVEL;

/// Direction of an indent request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentDirection {
    In,
    Out,
}

/// Whether the indent change is legal for the block at `index`
pub fn indent_allowed(blocks: &[Block], index: usize, direction: IndentDirection) -> bool {
    let Some(block) = blocks.get(index) else {
        return false;
    };

    match direction {
        IndentDirection::In => {
            // The first block has no possible parent
            if index == 0 {
                return false;
            }
            let cap = MAX_INDENT_LEVEL.min(blocks[index - 1].indent_level + 1);
            block.indent_level < cap
        }
        IndentDirection::Out => block.indent_level > 0,
    }
}

/// Apply an indent change if legal. Returns whether anything changed.
pub fn apply_indent(blocks: &mut [Block], index: usize, direction: IndentDirection) -> bool {
    if !indent_allowed(blocks, index, direction) {
        return false;
    }

    match direction {
        IndentDirection::In => blocks[index].indent_level += 1,
        IndentDirection::Out => blocks[index].indent_level -= 1,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks_with_levels(levels: &[usize]) -> Vec<Block> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                let mut block = Block::new_text(format!("block_{}", i), format!("B{}", i));
                block.indent_level = level;
                block
            })
            .collect()
    }

    #[test]
    fn test_first_block_cannot_indent_in() {
        let mut blocks = blocks_with_levels(&[0, 0]);
        assert!(!apply_indent(&mut blocks, 0, IndentDirection::In));
        assert_eq!(blocks[0].indent_level, 0);
    }

    #[test]
    fn test_indent_in_capped_by_predecessor() {
        // Predecessor at 0 caps this block at 1
        let mut blocks = blocks_with_levels(&[0, 0]);
        assert!(apply_indent(&mut blocks, 1, IndentDirection::In));
        assert_eq!(blocks[1].indent_level, 1);

        // Requesting "in" again is rejected
        assert!(!apply_indent(&mut blocks, 1, IndentDirection::In));
        assert_eq!(blocks[1].indent_level, 1);
    }

    #[test]
    fn test_indent_in_beside_deeper_predecessor() {
        let mut blocks = blocks_with_levels(&[0, 1, 1]);
        assert!(apply_indent(&mut blocks, 2, IndentDirection::In));
        assert_eq!(blocks[2].indent_level, 2);
        assert!(!apply_indent(&mut blocks, 2, IndentDirection::In));
    }

    #[test]
    fn test_depth_cap() {
        let mut blocks = blocks_with_levels(&[0, 1, 2, 3, 4, 5, 5]);
        // Block already at the cap
        assert!(!apply_indent(&mut blocks, 5, IndentDirection::In));
        // Even with a predecessor at 5, the cap holds
        assert!(!apply_indent(&mut blocks, 6, IndentDirection::In));
        assert_eq!(blocks[6].indent_level, 5);
    }

    #[test]
    fn test_indent_out() {
        let mut blocks = blocks_with_levels(&[0, 2]);
        assert!(apply_indent(&mut blocks, 1, IndentDirection::Out));
        assert_eq!(blocks[1].indent_level, 1);
        assert!(apply_indent(&mut blocks, 1, IndentDirection::Out));
        assert_eq!(blocks[1].indent_level, 0);
        assert!(!apply_indent(&mut blocks, 1, IndentDirection::Out));
        assert_eq!(blocks[1].indent_level, 0);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut blocks = blocks_with_levels(&[0]);
        assert!(!apply_indent(&mut blocks, 3, IndentDirection::In));
        assert!(!apply_indent(&mut blocks, 3, IndentDirection::Out));
    }

    #[test]
    fn test_indent_bound_invariant_after_edits() {
        let mut blocks = blocks_with_levels(&[0, 1, 1, 2]);
        for index in 0..blocks.len() {
            apply_indent(&mut blocks, index, IndentDirection::In);
        }
        assert_eq!(blocks[0].indent_level, 0);
        for i in 1..blocks.len() {
            assert!(blocks[i].indent_level <= MAX_INDENT_LEVEL.min(blocks[i - 1].indent_level + 1));
        }
    }
}
