//! Server-sent event decoding for streamed `rows/add` responses.
//!
//! The service streams one `data:` line per event and ends with
//! `data: [DONE]`. Events are either whole row batches or per-column
//! deltas; deltas are folded into a synthetic row batch once the stream
//! ends so the router only ever has to look for row batches.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::types::{Choice, ColumnDelta, ColumnOutput, RowChunk, StreamChunk};

/// Incremental SSE line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes and return the events completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(chunk) = self.decode_line(line.trim()) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        self.decode_line(line.trim()).into_iter().collect()
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamChunk> {
        if self.done || line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = line.strip_prefix("data:")?.trim();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(event) => Some(decode_event(event)),
            Err(e) => {
                debug!("Skipping undecodable stream event: {}", e);
                None
            }
        }
    }
}

/// Classify one decoded event by its shape.
pub fn decode_event(event: Value) -> StreamChunk {
    let tag = event
        .get("object")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(rows) = event.get("rows") {
        if let Ok(rows) = serde_json::from_value::<Vec<RowChunk>>(rows.clone()) {
            return StreamChunk::Rows(rows);
        }
    }

    if event.get("output_column_name").is_some() {
        if let Ok(delta) = serde_json::from_value::<ColumnDelta>(event) {
            return StreamChunk::Column(delta);
        }
    }

    StreamChunk::Other { tag }
}

/// Append a row batch built from the column deltas, unless the stream
/// already carried one.
pub fn assemble_rows(mut chunks: Vec<StreamChunk>) -> Vec<StreamChunk> {
    if chunks.iter().any(|c| matches!(c, StreamChunk::Rows(_))) {
        return chunks;
    }

    let mut rows: Vec<RowChunk> = Vec::new();
    for chunk in &chunks {
        let StreamChunk::Column(delta) = chunk else {
            continue;
        };

        let position = match rows.iter().position(|r| r.row_id == delta.row_id) {
            Some(i) => i,
            None => {
                rows.push(RowChunk {
                    row_id: delta.row_id.clone(),
                    columns: HashMap::new(),
                });
                rows.len() - 1
            }
        };

        let column = rows[position]
            .columns
            .entry(delta.output_column_name.clone())
            .or_insert_with(|| ColumnOutput {
                text: None,
                choices: vec![Choice::default()],
            });

        let content = delta
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref());
        if let (Some(content), Some(choice)) = (content, column.choices.first_mut()) {
            choice
                .message
                .content
                .get_or_insert_with(String::new)
                .push_str(content);
        }
    }

    if !rows.is_empty() {
        chunks.push(StreamChunk::Rows(rows));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(row: &str, column: &str, content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({
                "object": "gen_table.completion.chunk",
                "row_id": row,
                "output_column_name": column,
                "choices": [{"message": {"role": "assistant", "content": content}, "index": 0}],
            })
        )
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let line = delta_line("r1", "AI", "Hello");
        let (head, tail) = line.as_bytes().split_at(17);

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        let chunks = decoder.push(tail);
        assert_eq!(chunks.len(), 1);
        assert!(matches!(&chunks[0], StreamChunk::Column(d) if d.output_column_name == "AI"));
    }

    #[test]
    fn test_decoder_stops_at_done_marker() {
        let mut decoder = SseDecoder::new();
        let mut input = delta_line("r1", "AI", "a");
        input.push_str("data: [DONE]\n\n");
        input.push_str(&delta_line("r1", "AI", "ignored"));

        let chunks = decoder.push(input.as_bytes());
        assert_eq!(chunks.len(), 1);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_decoder_skips_comments_and_garbage() {
        let mut decoder = SseDecoder::new();
        let chunks = decoder.push(b": keep-alive\nevent: ping\ndata: not-json\n");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        let line = delta_line("r1", "AI", "x");
        assert!(decoder.push(line.trim_end().as_bytes()).is_empty());
        assert_eq!(decoder.finish().len(), 1);
    }

    #[test]
    fn test_row_batch_event() {
        let event = serde_json::json!({
            "object": "gen_table.completion.rows",
            "rows": [{"row_id": "r1", "columns": {"AI": {"choices": [{"message": {"content": "hi"}}]}}}]
        });
        let StreamChunk::Rows(rows) = decode_event(event) else {
            panic!("expected row batch");
        };
        assert_eq!(rows[0].columns["AI"].first_choice_content(), Some("hi"));
    }

    #[test]
    fn test_assemble_rows_concatenates_deltas() {
        let mut decoder = SseDecoder::new();
        let mut input = String::new();
        input.push_str(&delta_line("r1", "Breakfast", "1. Oats"));
        input.push_str(&delta_line("r1", "Lunch", "1. Rice"));
        input.push_str(&delta_line("r1", "Breakfast", "\n2. Fruit"));
        input.push_str("data: [DONE]\n");

        let chunks = assemble_rows(decoder.push(input.as_bytes()));
        let Some(StreamChunk::Rows(rows)) = chunks.last() else {
            panic!("expected assembled row batch");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].columns["Breakfast"].first_choice_content(),
            Some("1. Oats\n2. Fruit")
        );
        assert_eq!(rows[0].columns["Lunch"].first_choice_content(), Some("1. Rice"));
    }

    #[test]
    fn test_assemble_rows_keeps_existing_batch() {
        let chunks = vec![
            StreamChunk::Other { tag: "ping".into() },
            StreamChunk::Rows(vec![RowChunk::default()]),
        ];
        assert_eq!(assemble_rows(chunks.clone()), chunks);
    }
}
