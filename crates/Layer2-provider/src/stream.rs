//! Async adapter from provider chunks to tool-call events

use crate::aggregator::RawChunkAggregator;
use crate::chunk::{AggregatedEvent, ProviderChunk};
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Boxed aggregated event stream
pub type AggregatedStream = Pin<Box<dyn Stream<Item = AggregatedEvent> + Send>>;

/// Aggregate a provider chunk stream into text and tool-call events
///
/// A fresh aggregator is used for every stream, so trackers never leak
/// across upstream requests. Calls still open when the input ends are
/// closed as if the stream had sent `Done`.
pub fn aggregate<S>(input: S) -> AggregatedStream
where
    S: Stream<Item = ProviderChunk> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut aggregator = RawChunkAggregator::new();
        let mut input = Box::pin(input);

        while let Some(chunk) = input.next().await {
            match chunk {
                ProviderChunk::Text(text) => yield AggregatedEvent::Text(text),
                ProviderChunk::ToolCall(raw) => {
                    for event in aggregator.process_chunk(raw) {
                        yield AggregatedEvent::ToolCall(event);
                    }
                }
                ProviderChunk::Finish(reason) => {
                    for event in aggregator.process_finish_reason(Some(&reason)) {
                        yield AggregatedEvent::ToolCall(event);
                    }
                }
                ProviderChunk::Done => break,
            }
        }

        for event in aggregator.finalize() {
            yield AggregatedEvent::ToolCall(event);
        }
    })
}
