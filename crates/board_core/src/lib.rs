pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

pub use error::AppError;
pub use model::{Project, ProjectId, Task, TaskCounts, TaskId, TaskStatus};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, SlotWrite};
pub use store::{ProjectStore, StoreOptions};
