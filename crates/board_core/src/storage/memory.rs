use crate::error::AppError;
use crate::storage::{KeyValueStore, SlotWrite};
use std::collections::HashMap;

/// Process-local backend; contents are lost on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, writes: &[SlotWrite<'_>]) -> Result<(), AppError> {
        for (key, value) in writes {
            match value {
                Some(value) => {
                    self.entries.insert(key.to_string(), value.to_string());
                }
                None => {
                    self.entries.remove(*key);
                }
            }
        }
        Ok(())
    }
}
