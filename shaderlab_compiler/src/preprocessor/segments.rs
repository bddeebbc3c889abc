//! Expansion segments and output assembly
//!
//! A level never edits its text. It queues "replace this range with that
//! text" instructions and, once the region is scanned, stitches the kept
//! text and the replacements together while recording the source map.

use crate::diagnostics::{BlockInfo, MapRange, OffsetRange, SourceMap};

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandSegment {
    /// Absolute byte range in the text being processed
    pub range: OffsetRange,
    pub replacement: String,
    /// Where the replacement came from; `None` means the replaced range itself
    pub block: Option<BlockInfo>,
}

impl ExpandSegment {
    pub fn new(range: OffsetRange, replacement: impl Into<String>, block: Option<BlockInfo>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
            block,
        }
    }
}

/// One segment list per active expansion level
#[derive(Debug, Default)]
pub struct SegmentStack {
    levels: Vec<Vec<ExpandSegment>>,
}

impl SegmentStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_level(&mut self) {
        self.levels.push(Vec::new());
    }

    pub fn push_segment(&mut self, segment: ExpandSegment) {
        match self.levels.last_mut() {
            Some(level) => level.push(segment),
            None => self.levels.push(vec![segment]),
        }
    }

    pub fn pop_level(&mut self) -> Vec<ExpandSegment> {
        self.levels.pop().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Build the output of `text[start..end]` with `segments` applied, plus
/// the map from that output back to `file`. Segments must be in source
/// order and must not overlap.
pub fn assemble(
    text: &str,
    file: &str,
    start: usize,
    end: usize,
    segments: Vec<ExpandSegment>,
) -> (String, SourceMap) {
    let mut out = String::with_capacity(end.saturating_sub(start));
    let mut map = SourceMap::new(file, start);
    let mut cursor = start;

    for segment in segments {
        out.push_str(text.get(cursor..segment.range.start).unwrap_or_default());

        let generated_start = out.len();
        out.push_str(&segment.replacement);

        let block = segment.block.unwrap_or_else(|| BlockInfo::Literal {
            source_file: file.to_string(),
            range: segment.range,
        });
        map.push(MapRange {
            generated: OffsetRange::new(generated_start, out.len()),
            original: OffsetRange::new(segment.range.start - start, segment.range.end - start),
            block,
        });
        cursor = segment.range.end;
    }

    out.push_str(text.get(cursor..end).unwrap_or_default());
    (out, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_replaces_in_order() {
        let text = "a FOO b // note\nc";
        let segments = vec![
            ExpandSegment::new(OffsetRange::new(2, 5), "42", None),
            ExpandSegment::new(OffsetRange::new(8, 15), "", None),
        ];
        let (out, map) = assemble(text, "main.shader", 0, text.len(), segments);
        assert_eq!(out, "a 42 b \nc");
        assert_eq!(map.ranges.len(), 2);
        // 'c' is generated 8, original 16
        assert_eq!(map.map(8).index, 16);
    }

    #[test]
    fn test_assemble_region_offsets_are_relative_to_base() {
        let text = "#if A\nX\n#endif";
        let segments = vec![ExpandSegment::new(OffsetRange::new(6, 7), "1", None)];
        let (out, map) = assemble(text, "f", 6, 8, segments);
        assert_eq!(out, "1\n");
        assert_eq!(map.base_offset, 6);
        assert_eq!(map.ranges[0].original, OffsetRange::new(0, 1));
        assert_eq!(map.map(1).index, 7);
    }

    #[test]
    fn test_stack_levels_are_independent() {
        let mut stack = SegmentStack::new();
        stack.push_level();
        stack.push_segment(ExpandSegment::new(OffsetRange::new(0, 1), "x", None));
        stack.push_level();
        assert_eq!(stack.depth(), 2);
        assert!(stack.pop_level().is_empty());
        assert_eq!(stack.pop_level().len(), 1);
        assert_eq!(stack.depth(), 0);
    }
}
