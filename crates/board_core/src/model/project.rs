use crate::model::{ProjectId, Task, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new<N: Into<String>>(id: ProjectId, name: N) -> Self {
        Self {
            id,
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn has_task(&self, id: &str) -> bool {
        self.task(id).is_some()
    }
}

/// Board shown on first launch, one task per column.
pub fn default_projects() -> Vec<Project> {
    let seeded = [
        ("101", "Plan project", TaskStatus::Done),
        ("102", "Design UI", TaskStatus::InProgress),
        ("103", "Implement features", TaskStatus::Todo),
    ];

    let mut project = Project::new(ProjectId::new("1"), "My First Project");
    project.tasks = seeded
        .into_iter()
        .map(|(id, title, status)| Task {
            id: TaskId::new(id),
            title: title.to_string(),
            status,
        })
        .collect();

    vec![project]
}
