//! Bookkeeping of query ranges already claimed by keyword scans.

use crate::ast::{Node, Span};

/// A sorted set of non-overlapping spans.
#[derive(Debug, Clone, Default)]
pub struct SpanTracker {
    /// Claimed spans ordered by start offset.
    spans: Vec<Span>,
}

impl SpanTracker {
    /// Creates an empty tracker.
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Claims `start..end`.
    ///
    /// The range must not overlap an already claimed span.
    pub fn append(&mut self, start: usize, end: usize) {
        debug_assert!(start < end, "empty span {start}..{end}");
        debug_assert!(
            !self.overlap(start, end),
            "span {start}..{end} overlaps a claimed span"
        );
        self.insert(Span::new(start, end));
    }

    /// Claims the spans of `nodes`.
    ///
    /// The nodes are the output of a single scan, which never produces
    /// overlapping matches.
    pub fn append_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.insert(node.span());
        }
    }

    /// Returns true if `start..end` intersects a claimed span.
    pub fn overlap(&self, start: usize, end: usize) -> bool {
        debug_assert!(start < end, "empty span {start}..{end}");
        self.spans
            .iter()
            .any(|span| span.start < end && start < span.end)
    }

    /// Smallest offset at or after `from` that no claimed span covers.
    pub fn minimal_unconsumed_offset(&self, from: usize) -> usize {
        let mut offset = from;
        for span in &self.spans {
            if span.end <= offset {
                continue;
            }
            if span.start > offset {
                break;
            }
            offset = span.end;
        }
        offset
    }

    /// Claimed spans in order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Inserts a span keeping the start order.
    fn insert(&mut self, span: Span) {
        let idx = self.spans.partition_point(|s| s.start <= span.start);
        self.spans.insert(idx, span);
    }
}
