use anyhow::{Context, Result};
use codeatlas_ingest::ParserMessage;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Reads a parser-feed file: one JSON-encoded `ParserMessage` per line,
/// batch ids interleaved freely. Groups messages by `batchId`, preserving
/// the order in which each batch id was first seen, and the order of
/// messages within each batch.
pub fn read_feed(path: &Path) -> Result<Vec<(String, Vec<ParserMessage>)>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading parser feed {path:?}"))?;

    let mut order = Vec::new();
    let mut batches: HashMap<String, Vec<ParserMessage>> = HashMap::new();

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message: ParserMessage = serde_json::from_str(line)
            .with_context(|| format!("{path:?}:{}: malformed parser message", line_no + 1))?;
        batches.entry(message.batch_id.clone()).or_insert_with(|| {
            order.push(message.batch_id.clone());
            Vec::new()
        });
        batches.get_mut(&message.batch_id).unwrap().push(message);
    }

    Ok(order
        .into_iter()
        .map(|batch_id| {
            let messages = batches.remove(&batch_id).unwrap_or_default();
            (batch_id, messages)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn groups_interleaved_messages_by_batch_id() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"batchId":"b1","kind":"node","payload":{{"id":"function:a.py:f:1","name":"f","kind":"function","language":"python","file":"a.py","line":1,"endLine":2,"complexity":1}}}}"#).unwrap();
        writeln!(file, r#"{{"batchId":"b2","kind":"node","payload":{{"id":"function:b.py:g:1","name":"g","kind":"function","language":"python","file":"b.py","line":1,"endLine":2,"complexity":1}}}}"#).unwrap();
        writeln!(file, r#"{{"batchId":"b1","kind":"end"}}"#).unwrap();

        let batches = read_feed(file.path()).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].0, "b1");
        assert_eq!(batches[0].1.len(), 2);
        assert_eq!(batches[1].0, "b2");
        assert_eq!(batches[1].1.len(), 1);
    }
}
