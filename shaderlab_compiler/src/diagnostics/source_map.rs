//! Generated-offset → original-offset translation
//!
//! Each preprocessing level records which ranges of its output were
//! rewritten and where they came from. A rewritten range either points at a
//! literal range of some file (macro invocation, stripped comment) or at the
//! nested map of a recursively processed region (conditional branch,
//! included chunk). Text between rewritten ranges was copied verbatim and
//! maps linearly.

use crate::config::compile_time::diagnostics::MAX_SOURCE_MAP_DEPTH;
use serde::{Deserialize, Serialize};

/// Half-open byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl OffsetRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockInfo {
    /// Resolves to the start of `range` (absolute) in `source_file`
    Literal {
        source_file: String,
        range: OffsetRange,
    },
    /// Resolves through another map, relative to the generated range start
    Nested(Box<SourceMap>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRange {
    /// Range in this map's output
    pub generated: OffsetRange,
    /// Replaced range, relative to the map's `base_offset`
    pub original: OffsetRange,
    pub block: BlockInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappedPosition {
    pub source_file: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub source_file: String,
    /// Absolute offset of the processed region in `source_file`
    pub base_offset: usize,
    /// Sorted by `generated.start`, non-overlapping
    pub ranges: Vec<MapRange>,
}

impl SourceMap {
    pub fn new(source_file: &str, base_offset: usize) -> Self {
        Self {
            source_file: source_file.to_string(),
            base_offset,
            ranges: Vec::new(),
        }
    }

    pub fn push(&mut self, range: MapRange) {
        self.ranges.push(range);
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Nesting depth of the map chain (1 for a flat map)
    pub fn depth(&self) -> usize {
        1 + self
            .ranges
            .iter()
            .filter_map(|r| match &r.block {
                BlockInfo::Nested(map) => Some(map.depth()),
                BlockInfo::Literal { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Trace a generated offset back to its originating file and offset
    pub fn map(&self, generated: usize) -> MappedPosition {
        self.map_at_depth(generated, 0)
    }

    fn map_at_depth(&self, generated: usize, depth: usize) -> MappedPosition {
        let mut preceding: Option<&MapRange> = None;

        for range in &self.ranges {
            if generated < range.generated.start {
                break;
            }
            if range.generated.contains(generated) {
                match &range.block {
                    BlockInfo::Literal { source_file, range } => {
                        return MappedPosition {
                            source_file: source_file.clone(),
                            index: range.start,
                        }
                    }
                    BlockInfo::Nested(nested) if depth < MAX_SOURCE_MAP_DEPTH => {
                        return nested.map_at_depth(generated - range.generated.start, depth + 1)
                    }
                    BlockInfo::Nested(_) => {
                        return MappedPosition {
                            source_file: self.source_file.clone(),
                            index: range.original.start + self.base_offset,
                        }
                    }
                }
            }
            preceding = Some(range);
        }

        let index = match preceding {
            Some(range) => range.original.end + (generated - range.generated.end),
            None => generated,
        };

        MappedPosition {
            source_file: self.source_file.clone(),
            index: index + self.base_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(file: &str, start: usize, end: usize) -> BlockInfo {
        BlockInfo::Literal {
            source_file: file.to_string(),
            range: OffsetRange::new(start, end),
        }
    }

    #[test]
    fn test_identity_without_ranges() {
        let map = SourceMap::new("main.shader", 0);
        assert_eq!(
            map.map(42),
            MappedPosition {
                source_file: "main.shader".to_string(),
                index: 42
            }
        );
    }

    #[test]
    fn test_linear_mapping_after_rewrite() {
        // "FOO bar" with FOO (3 bytes) expanded to "12345" (5 bytes)
        let mut map = SourceMap::new("main.shader", 0);
        map.push(MapRange {
            generated: OffsetRange::new(0, 5),
            original: OffsetRange::new(0, 3),
            block: literal("main.shader", 0, 3),
        });

        assert_eq!(map.map(2).index, 0);
        // 'b' of "bar": generated 6, original 4
        assert_eq!(map.map(6).index, 4);
    }

    #[test]
    fn test_zero_length_range_anchors_following_text() {
        // "// c\nx" where the comment was stripped to ""
        let mut map = SourceMap::new("f", 0);
        map.push(MapRange {
            generated: OffsetRange::new(0, 0),
            original: OffsetRange::new(0, 4),
            block: literal("f", 0, 4),
        });

        // generated "\nx": 'x' at 1 maps to original 5
        assert_eq!(map.map(1).index, 5);
    }

    #[test]
    fn test_nested_map_through_include() {
        // main: "A\n#include \"common\"\nB"; common expands to "float x;\n"
        let mut chunk = SourceMap::new("common", 0);
        chunk.push(MapRange {
            generated: OffsetRange::new(0, 0),
            original: OffsetRange::new(0, 3),
            block: literal("common", 0, 3),
        });

        let mut main = SourceMap::new("main.shader", 0);
        main.push(MapRange {
            generated: OffsetRange::new(2, 11),
            original: OffsetRange::new(2, 19),
            block: BlockInfo::Nested(Box::new(chunk)),
        });

        let inside = main.map(8);
        assert_eq!(inside.source_file, "common");
        assert_eq!(inside.index, 9);

        let after = main.map(12);
        assert_eq!(after.source_file, "main.shader");
        assert_eq!(after.index, 20);
        assert_eq!(main.depth(), 2);
    }

    #[test]
    fn test_nested_branch_uses_base_offset() {
        // Branch body starts at offset 10 of the same file
        let branch = SourceMap::new("main.shader", 10);
        let mut main = SourceMap::new("main.shader", 0);
        main.push(MapRange {
            generated: OffsetRange::new(0, 6),
            original: OffsetRange::new(0, 30),
            block: BlockInfo::Nested(Box::new(branch)),
        });

        assert_eq!(main.map(3).index, 13);
        assert_eq!(main.map(6).index, 30);
    }
}
