//! Durable key-value slots and the board snapshot codec.
//!
//! The board is stored under two keys: `projects` holds the full ordered
//! project list as a JSON array, `activeProject` holds the selected id.
//! Every write replaces the whole value, and a board save changes both keys
//! in a single batch.

pub mod json_store;
mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::model::{Project, ProjectId};
use std::collections::HashSet;

pub const PROJECTS_KEY: &str = "projects";
pub const ACTIVE_PROJECT_KEY: &str = "activeProject";

/// One slot change: `Some` stores the value, `None` removes the key.
pub type SlotWrite<'a> = (&'a str, Option<&'a str>);

/// A string-valued slot store that survives process restarts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Applies every write in `writes` or none of them.
    fn apply(&mut self, writes: &[SlotWrite<'_>]) -> Result<(), AppError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.apply(&[(key, None)])
    }
}

/// Returns `None` when nothing has been saved yet.
pub fn load_projects<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Option<Vec<Project>>, AppError> {
    let Some(raw) = store.get(PROJECTS_KEY)? else {
        return Ok(None);
    };
    decode_projects(&raw).map(Some)
}

pub fn save_projects<S: KeyValueStore + ?Sized>(
    store: &mut S,
    projects: &[Project],
) -> Result<(), AppError> {
    let encoded = encode_projects(projects)?;
    store.set(PROJECTS_KEY, &encoded)
}

/// Writes the project list and the active id together.
pub fn save_board<S: KeyValueStore + ?Sized>(
    store: &mut S,
    projects: &[Project],
    active: Option<&ProjectId>,
) -> Result<(), AppError> {
    let encoded = encode_projects(projects)?;
    store.apply(&[
        (PROJECTS_KEY, Some(encoded.as_str())),
        (ACTIVE_PROJECT_KEY, active.map(ProjectId::as_str)),
    ])
}

pub fn load_active<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<ProjectId>, AppError> {
    Ok(store
        .get(ACTIVE_PROJECT_KEY)?
        .filter(|raw| !raw.trim().is_empty())
        .map(ProjectId::new))
}

pub fn save_active<S: KeyValueStore + ?Sized>(
    store: &mut S,
    active: Option<&ProjectId>,
) -> Result<(), AppError> {
    match active {
        Some(id) => store.set(ACTIVE_PROJECT_KEY, id.as_str()),
        None => store.remove(ACTIVE_PROJECT_KEY),
    }
}

pub fn encode_projects(projects: &[Project]) -> Result<String, AppError> {
    serde_json::to_string(projects).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode_projects(raw: &str) -> Result<Vec<Project>, AppError> {
    let projects: Vec<Project> = serde_json::from_str(raw)
        .map_err(|err| AppError::invalid_data(format!("projects: {err}")))?;

    let mut project_ids = HashSet::new();
    for project in &projects {
        if !project_ids.insert(project.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate project id {}",
                project.id
            )));
        }

        let mut task_ids = HashSet::new();
        for task in &project.tasks {
            if !task_ids.insert(task.id.as_str()) {
                return Err(AppError::invalid_data(format!(
                    "duplicate task id {} in project {}",
                    task.id, project.id
                )));
            }
            if task.title.trim().is_empty() {
                return Err(AppError::invalid_data(format!(
                    "task {} in project {} has a blank title",
                    task.id, project.id
                )));
            }
        }
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::{
        ACTIVE_PROJECT_KEY, KeyValueStore, MemoryStore, PROJECTS_KEY, decode_projects,
        load_active, load_projects, save_active, save_board, save_projects,
    };
    use crate::model::{ProjectId, TaskStatus, default_projects};

    #[test]
    fn load_projects_returns_none_when_unset() {
        let store = MemoryStore::new();
        assert!(load_projects(&store).unwrap().is_none());
    }

    #[test]
    fn saved_projects_reload_element_wise_equal() {
        let mut store = MemoryStore::new();
        let projects = default_projects();

        save_projects(&mut store, &projects).unwrap();
        let loaded = load_projects(&store).unwrap().unwrap();

        assert_eq!(loaded, projects);
    }

    #[test]
    fn projects_are_stored_as_json_array() {
        let mut store = MemoryStore::new();
        save_projects(&mut store, &default_projects()).unwrap();

        let raw = store.get(PROJECTS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "1");
        assert_eq!(value[0]["tasks"][1]["status"], "in-progress");
    }

    #[test]
    fn decode_accepts_legacy_status_spelling() {
        let raw = r#"[{"id":"1","name":"p","tasks":[{"id":"101","title":"t","status":"inprogress"}]}]"#;
        let projects = decode_projects(raw).unwrap();
        assert_eq!(projects[0].tasks[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn decode_rejects_duplicate_project_ids() {
        let raw = r#"[{"id":"1","name":"a","tasks":[]},{"id":"1","name":"b","tasks":[]}]"#;
        let err = decode_projects(raw).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn decode_rejects_duplicate_task_ids_within_project() {
        let raw = r#"[{"id":"1","name":"a","tasks":[
            {"id":"7","title":"x","status":"todo"},
            {"id":"7","title":"y","status":"done"}]}]"#;
        let err = decode_projects(raw).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn decode_allows_same_task_id_in_different_projects() {
        let raw = r#"[{"id":"1","name":"a","tasks":[{"id":"7","title":"x","status":"todo"}]},
            {"id":"2","name":"b","tasks":[{"id":"7","title":"y","status":"todo"}]}]"#;
        assert_eq!(decode_projects(raw).unwrap().len(), 2);
    }

    #[test]
    fn decode_rejects_unknown_status() {
        let raw = r#"[{"id":"1","name":"a","tasks":[{"id":"7","title":"x","status":"blocked"}]}]"#;
        let err = decode_projects(raw).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn decode_rejects_blank_task_title() {
        let raw = r#"[{"id":"1","name":"a","tasks":[{"id":"7","title":"  ","status":"todo"}]}]"#;
        assert!(decode_projects(raw).is_err());
    }

    #[test]
    fn active_project_round_trips_and_clears() {
        let mut store = MemoryStore::new();
        let id = ProjectId::new("42");

        save_active(&mut store, Some(&id)).unwrap();
        assert_eq!(load_active(&store).unwrap(), Some(id));

        save_active(&mut store, None).unwrap();
        assert!(store.get(ACTIVE_PROJECT_KEY).unwrap().is_none());
        assert_eq!(load_active(&store).unwrap(), None);
    }

    #[test]
    fn save_board_writes_both_keys() {
        let mut store = MemoryStore::new();
        let projects = default_projects();

        save_board(&mut store, &projects, Some(&projects[0].id)).unwrap();
        assert_eq!(load_projects(&store).unwrap(), Some(projects.clone()));
        assert_eq!(load_active(&store).unwrap(), Some(ProjectId::new("1")));

        save_board(&mut store, &[], None).unwrap();
        assert_eq!(load_projects(&store).unwrap(), Some(Vec::new()));
        assert!(store.get(ACTIVE_PROJECT_KEY).unwrap().is_none());
    }
}
