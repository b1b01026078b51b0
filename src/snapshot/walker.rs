//! Pull-based traversal of a response's work items

use crate::error::{IngestError, Result};
use crate::vcm::WorkItem;
use serde_json::de::{IoRead, StreamDeserializer};
use std::io::Read;

/// Lazy, forward-only sequence of work items
///
/// Stops for good after the first error: a record that cannot be materialized
/// ends the walk rather than being skipped.
pub struct Walker<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, WorkItem>,
    position: usize,
    failed: bool,
}

impl<R: Read> Walker<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
            position: 0,
            failed: false,
        }
    }

    /// Number of work items produced so far
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<R: Read> Iterator for Walker<R> {
    type Item = Result<WorkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let next = self.stream.next()?;
        self.position += 1;
        match next {
            Ok(mut item) => {
                item.position = self.position;
                Some(Ok(item))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(IngestError::MalformedItem {
                    position: self.position,
                    item: "<unreadable>".to_string(),
                    reason: e.to_string(),
                }))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Walker<R> {}
