//! The project board: an ordered list of projects, each holding an ordered
//! list of tasks, plus the currently selected project.
//!
//! Every mutation is computed on a copy of the project list, written to the
//! backend in full, and only then swapped into memory. A rejected call or a
//! failed write leaves the board exactly as it was.

use crate::error::AppError;
use crate::model::{
    Project, ProjectId, Task, TaskCounts, TaskId, TaskStatus, default_projects, next_id,
};
use crate::storage::{self, KeyValueStore};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Fixed pause applied by `add_project` and `add_task` after validation.
    pub creation_delay: Duration,
    /// Seed the starter board when the backend holds no projects.
    pub seed_default: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            creation_delay: Duration::ZERO,
            seed_default: true,
        }
    }
}

#[derive(Debug)]
pub struct ProjectStore<S: KeyValueStore> {
    backend: S,
    projects: Vec<Project>,
    active_project_id: Option<ProjectId>,
    options: StoreOptions,
}

impl<S: KeyValueStore> ProjectStore<S> {
    /// Loads the board from `backend`, seeding the starter project when
    /// nothing was saved before.
    pub fn open(backend: S, options: StoreOptions) -> Result<Self, AppError> {
        let (projects, seeded) = match storage::load_projects(&backend)? {
            Some(projects) => (projects, false),
            None if options.seed_default => (default_projects(), true),
            None => (Vec::new(), false),
        };

        let saved_active = storage::load_active(&backend)?;
        let active_project_id = saved_active
            .filter(|id| projects.iter().any(|project| &project.id == id))
            .or_else(|| projects.first().map(|project| project.id.clone()));

        tracing::debug!(
            projects = projects.len(),
            seeded,
            active = ?active_project_id,
            "board loaded"
        );

        Ok(Self {
            backend,
            projects,
            active_project_id,
            options,
        })
    }

    pub fn list_projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn active_project_id(&self) -> Option<&ProjectId> {
        self.active_project_id.as_ref()
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id
            .as_ref()
            .and_then(|id| self.project(id.as_str()))
    }

    /// Zero counts when the project is unknown.
    pub fn task_counts(&self, project_id: &str) -> TaskCounts {
        self.project(project_id)
            .map(|project| TaskCounts::from_tasks(&project.tasks))
            .unwrap_or_default()
    }

    /// One kanban column, in insertion order.
    pub fn tasks_with_status(&self, project_id: &str, status: TaskStatus) -> Vec<&Task> {
        self.project(project_id)
            .map(|project| {
                project
                    .tasks
                    .iter()
                    .filter(|task| task.status == status)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Stores `name` as given; whitespace only matters for the blank check.
    pub fn add_project(&mut self, name: &str) -> Result<ProjectId, AppError> {
        if name.trim().is_empty() {
            tracing::warn!("rejected project with blank name");
            return Err(AppError::validation("project name is required"));
        }

        self.creation_pause();

        let id = ProjectId::new(next_id("project", |candidate| {
            self.projects.iter().any(|project| project.id == candidate)
        }));
        let mut next = self.projects.clone();
        next.push(Project::new(id.clone(), name));

        self.commit(next, Some(id.clone()))?;
        tracing::info!(project_id = %id, "project added");
        Ok(id)
    }

    /// Makes an existing project active. Unknown ids are ignored.
    pub fn select_project(&mut self, id: &str) -> Result<bool, AppError> {
        let id = require_id(id)?;
        let Some(project) = self.project(id) else {
            tracing::debug!(project_id = id, "select ignored, project not found");
            return Ok(false);
        };

        let id = project.id.clone();
        storage::save_active(&mut self.backend, Some(&id))?;
        tracing::info!(project_id = %id, "project selected");
        self.active_project_id = Some(id);
        Ok(true)
    }

    /// Removes the project and its tasks. Unknown ids are ignored.
    pub fn delete_project(&mut self, id: &str) -> Result<bool, AppError> {
        let id = require_id(id)?;
        let Some(index) = self
            .projects
            .iter()
            .position(|project| project.id == id)
        else {
            tracing::debug!(project_id = id, "delete ignored, project not found");
            return Ok(false);
        };

        let mut next = self.projects.clone();
        let removed = next.remove(index);

        let active = if self.active_project_id.as_ref() == Some(&removed.id) {
            next.first().map(|project| project.id.clone())
        } else {
            self.active_project_id.clone()
        };

        self.commit(next, active)?;
        tracing::info!(
            project_id = %removed.id,
            tasks = removed.tasks.len(),
            active = ?self.active_project_id,
            "project deleted"
        );
        Ok(true)
    }

    pub fn add_task(&mut self, project_id: &str, title: &str) -> Result<TaskId, AppError> {
        let project_id = require_id(project_id)?;
        if title.trim().is_empty() {
            tracing::warn!(project_id, "rejected task with blank title");
            return Err(AppError::validation("task title is required"));
        }

        let Some(index) = self.project_index(project_id) else {
            tracing::warn!(project_id, "rejected task for unknown project");
            return Err(AppError::validation(format!("project {project_id} not found")));
        };

        self.creation_pause();

        let mut next = self.projects.clone();
        let project = &mut next[index];
        let id = TaskId::new(next_id("task", |candidate| project.has_task(candidate)));
        project.tasks.push(Task::new(id.clone(), title));

        let active = self.active_project_id.clone();
        self.commit(next, active)?;
        tracing::info!(project_id, task_id = %id, "task added");
        Ok(id)
    }

    /// Removes a task. Unknown project or task ids are ignored.
    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> Result<bool, AppError> {
        let project_id = require_id(project_id)?;
        let task_id = require_id(task_id)?;

        let Some((project_index, task_index)) = self.task_position(project_id, task_id) else {
            tracing::debug!(
                project_id,
                task_id,
                "delete ignored, task not found"
            );
            return Ok(false);
        };

        let mut next = self.projects.clone();
        next[project_index].tasks.remove(task_index);

        let active = self.active_project_id.clone();
        self.commit(next, active)?;
        tracing::info!(project_id, task_id, "task deleted");
        Ok(true)
    }

    /// Moves a task to `status`. Every transition is allowed; unknown ids
    /// are ignored.
    pub fn set_task_status(
        &mut self,
        project_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<bool, AppError> {
        let project_id = require_id(project_id)?;
        let task_id = require_id(task_id)?;

        let Some((project_index, task_index)) = self.task_position(project_id, task_id) else {
            tracing::debug!(
                project_id,
                task_id,
                "status change ignored, task not found"
            );
            return Ok(false);
        };

        let mut next = self.projects.clone();
        let task = &mut next[project_index].tasks[task_index];
        let previous = task.status;
        task.status = status;

        let active = self.active_project_id.clone();
        self.commit(next, active)?;
        tracing::info!(
            project_id,
            task_id,
            from = %previous,
            to = %status,
            "task status set"
        );
        Ok(true)
    }

    /// Parses `status` before delegating to [`Self::set_task_status`].
    pub fn set_task_status_str(
        &mut self,
        project_id: &str,
        task_id: &str,
        status: &str,
    ) -> Result<bool, AppError> {
        let parsed = status.parse::<TaskStatus>().inspect_err(|_| {
            tracing::warn!(status, "rejected unknown task status");
        })?;
        self.set_task_status(project_id, task_id, parsed)
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    fn project_index(&self, project_id: &str) -> Option<usize> {
        self.projects
            .iter()
            .position(|project| project.id == project_id)
    }

    fn task_position(&self, project_id: &str, task_id: &str) -> Option<(usize, usize)> {
        let project_index = self.project_index(project_id)?;
        let task_index = self.projects[project_index]
            .tasks
            .iter()
            .position(|task| task.id == task_id)?;
        Some((project_index, task_index))
    }

    fn creation_pause(&self) {
        if !self.options.creation_delay.is_zero() {
            std::thread::sleep(self.options.creation_delay);
        }
    }

    /// Writes the full snapshot in one batch, then replaces the in-memory
    /// state.
    fn commit(
        &mut self,
        projects: Vec<Project>,
        active: Option<ProjectId>,
    ) -> Result<(), AppError> {
        storage::save_board(&mut self.backend, &projects, active.as_ref())?;
        tracing::debug!(projects = projects.len(), "board persisted");

        self.projects = projects;
        self.active_project_id = active;
        Ok(())
    }
}

/// Ids are matched exactly; only a blank id is rejected.
fn require_id(id: &str) -> Result<&str, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::validation("id is required"));
    }
    Ok(id)
}
