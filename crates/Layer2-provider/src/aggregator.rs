//! Raw Chunk Aggregator
//!
//! Converts index-keyed tool-call fragments into `Started` / `Delta` /
//! `Ended` events keyed by call id.

use crate::chunk::{RawToolCallChunk, ToolCallEvent, TOOL_CALLS_FINISH_REASON};
use std::collections::BTreeMap;

#[derive(Debug)]
struct RawChunkTracker {
    id: String,
    name: Option<String>,
    started: bool,
    ended: bool,
    buffered_deltas: Vec<String>,
}

impl RawChunkTracker {
    fn new(id: String) -> Self {
        Self {
            id,
            name: None,
            started: false,
            ended: false,
            buffered_deltas: Vec::new(),
        }
    }
}

/// Per-request tool-call chunk aggregator
///
/// Trackers are keyed by positional index because some providers send the
/// call id after the first fragment.
#[derive(Debug, Default)]
pub struct RawChunkAggregator {
    trackers: BTreeMap<u32, RawChunkTracker>,
}

impl RawChunkAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one fragment and return the events it produces
    pub fn process_chunk(&mut self, chunk: RawToolCallChunk) -> Vec<ToolCallEvent> {
        let mut events = Vec::new();

        if !self.trackers.contains_key(&chunk.index) {
            match chunk.id.as_deref() {
                Some(id) if !id.is_empty() => {
                    self.trackers
                        .insert(chunk.index, RawChunkTracker::new(id.to_string()));
                }
                _ => {
                    tracing::trace!(index = chunk.index, "Ignoring chunk for untracked index");
                    return events;
                }
            }
        }
        let Some(tracker) = self.trackers.get_mut(&chunk.index) else {
            return events;
        };

        if tracker.ended {
            tracing::debug!(id = %tracker.id, "Ignoring chunk for ended tool call");
            return events;
        }

        if let Some(name) = chunk.name.filter(|n| !n.is_empty()) {
            tracker.name = Some(name);
        }

        if !tracker.started {
            if let Some(name) = tracker.name.clone() {
                tracker.started = true;
                tracing::debug!(id = %tracker.id, tool = %name, "Tool call started");
                events.push(ToolCallEvent::Started {
                    id: tracker.id.clone(),
                    name,
                });
                for delta in tracker.buffered_deltas.drain(..) {
                    events.push(ToolCallEvent::Delta {
                        id: tracker.id.clone(),
                        delta,
                    });
                }
            }
        }

        if let Some(arguments) = chunk.arguments.filter(|a| !a.is_empty()) {
            if tracker.started {
                events.push(ToolCallEvent::Delta {
                    id: tracker.id.clone(),
                    delta: arguments,
                });
            } else {
                tracker.buffered_deltas.push(arguments);
            }
        }

        events
    }

    /// Handle a provider completion reason
    ///
    /// Only `"tool_calls"` closes the tracked calls; other reasons are ignored.
    pub fn process_finish_reason(&mut self, reason: Option<&str>) -> Vec<ToolCallEvent> {
        match reason {
            Some(TOOL_CALLS_FINISH_REASON) => self.end_started(),
            _ => Vec::new(),
        }
    }

    /// End of stream: close started calls and drop all trackers
    pub fn finalize(&mut self) -> Vec<ToolCallEvent> {
        let events = self.end_started();
        let dropped = self.trackers.values().filter(|t| !t.started).count();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropping tool calls that never received a name");
        }
        self.trackers.clear();
        events
    }

    /// Reset for a new upstream request
    pub fn clear(&mut self) {
        self.trackers.clear();
    }

    /// Number of tracked calls
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    fn end_started(&mut self) -> Vec<ToolCallEvent> {
        self.trackers
            .values_mut()
            .filter(|t| t.started && !t.ended)
            .map(|t| {
                t.ended = true;
                tracing::debug!(id = %t.id, "Tool call ended");
                ToolCallEvent::Ended { id: t.id.clone() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(agg: &mut RawChunkAggregator, chunks: Vec<RawToolCallChunk>) -> Vec<ToolCallEvent> {
        chunks
            .into_iter()
            .flat_map(|c| agg.process_chunk(c))
            .collect()
    }

    #[test]
    fn test_basic_sequence() {
        let mut agg = RawChunkAggregator::new();
        let mut events = collect(
            &mut agg,
            vec![
                RawToolCallChunk::new(0)
                    .with_id("c1")
                    .with_name("execute_command"),
                RawToolCallChunk::new(0).with_arguments("{\"command\":"),
                RawToolCallChunk::new(0).with_arguments("\"ls\"}"),
            ],
        );
        events.extend(agg.process_finish_reason(Some("tool_calls")));

        assert_eq!(
            events,
            vec![
                ToolCallEvent::Started {
                    id: "c1".into(),
                    name: "execute_command".into()
                },
                ToolCallEvent::Delta {
                    id: "c1".into(),
                    delta: "{\"command\":".into()
                },
                ToolCallEvent::Delta {
                    id: "c1".into(),
                    delta: "\"ls\"}".into()
                },
                ToolCallEvent::Ended { id: "c1".into() },
            ]
        );

        // End-of-stream after the finish signal must not end the call twice
        assert!(agg.finalize().is_empty());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_buffers_arguments_until_name() {
        let mut agg = RawChunkAggregator::new();
        let events = collect(
            &mut agg,
            vec![
                RawToolCallChunk::new(0).with_id("c1").with_arguments("{\"pa"),
                RawToolCallChunk::new(0).with_arguments("th\":"),
                RawToolCallChunk::new(0)
                    .with_name("read_file")
                    .with_arguments("\"a\"}"),
            ],
        );

        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ToolCallEvent::Started { name, .. } if name == "read_file"));
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                ToolCallEvent::Delta { delta, .. } => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "{\"path\":\"a\"}");
    }

    #[test]
    fn test_ignores_chunks_without_tracker() {
        let mut agg = RawChunkAggregator::new();
        let events = agg.process_chunk(RawToolCallChunk::new(3).with_arguments("{}"));
        assert!(events.is_empty());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_unstarted_calls_dropped_silently() {
        let mut agg = RawChunkAggregator::new();
        agg.process_chunk(RawToolCallChunk::new(0).with_id("c1").with_arguments("{"));
        assert!(agg.process_finish_reason(Some("tool_calls")).is_empty());
        assert!(agg.finalize().is_empty());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_multiple_calls_end_in_index_order() {
        let mut agg = RawChunkAggregator::new();
        collect(
            &mut agg,
            vec![
                RawToolCallChunk::new(1).with_id("b").with_name("list_files"),
                RawToolCallChunk::new(0).with_id("a").with_name("read_file"),
            ],
        );
        let ends = agg.finalize();
        assert_eq!(
            ends,
            vec![
                ToolCallEvent::Ended { id: "a".into() },
                ToolCallEvent::Ended { id: "b".into() },
            ]
        );
    }

    #[test]
    fn test_other_finish_reasons_ignored() {
        let mut agg = RawChunkAggregator::new();
        agg.process_chunk(RawToolCallChunk::new(0).with_id("c1").with_name("skill"));
        assert!(agg.process_finish_reason(Some("stop")).is_empty());
        assert!(agg.process_finish_reason(None).is_empty());
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_clear_between_requests() {
        let mut agg = RawChunkAggregator::new();
        agg.process_chunk(RawToolCallChunk::new(0).with_id("c1").with_name("skill"));
        agg.clear();
        // Same index on the next request starts a fresh call
        let events = agg.process_chunk(RawToolCallChunk::new(0).with_id("c2").with_name("skill"));
        assert_eq!(events[0].id(), "c2");
    }

    #[test]
    fn test_chunks_after_end_ignored() {
        let mut agg = RawChunkAggregator::new();
        agg.process_chunk(RawToolCallChunk::new(0).with_id("c1").with_name("skill"));
        agg.process_finish_reason(Some("tool_calls"));
        assert!(agg
            .process_chunk(RawToolCallChunk::new(0).with_arguments("{}"))
            .is_empty());
    }
}
