mod ids;
mod project;
mod task;

pub use ids::{ProjectId, TaskId};
pub use project::{Project, default_projects};
pub use task::{Task, TaskCounts, TaskStatus};

pub(crate) use ids::next_id;
