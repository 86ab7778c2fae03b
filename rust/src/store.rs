//! Task store collaborator interface and an in-memory implementation.
//!
//! The scheduler never owns persistence; everything it reads or writes goes
//! through [`TaskStore`].

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::models::{Dependency, Task};

/// Failures reported by a task store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// Transient or backend-specific failure (connection, timeout, ...).
    #[error("Task store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn task_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        }
    }

    pub fn project_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity: "Project",
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the scheduler consumes.
///
/// Each call is a single round trip. Implementations decide their own
/// transactional guarantees; the service serializes writes per project.
pub trait TaskStore: Send + Sync {
    fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>>;
    fn get_task(&self, task_id: &str) -> StoreResult<Task>;
    fn list_dependencies(&self, project_id: &str) -> StoreResult<Vec<Dependency>>;
    fn insert_dependency(&self, dependency: Dependency) -> StoreResult<()>;
    fn delete_dependency(&self, predecessor_id: &str, successor_id: &str) -> StoreResult<()>;
    fn update_project_progress(&self, project_id: &str, percent: f64) -> StoreResult<()>;
    fn delete_task(&self, task_id: &str) -> StoreResult<()>;
}

#[derive(Default)]
struct MemoryState {
    /// Insertion order is the listing order.
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    /// project id -> last persisted progress (None until first update)
    projects: FxHashMap<String, Option<f64>>,
}

/// Store that keeps everything in memory, for tests and embedding callers.
#[derive(Default)]
pub struct InMemoryTaskStore {
    state: Mutex<MemoryState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project record so progress can be written to it.
    pub fn insert_project(&self, project_id: &str) {
        self.state
            .lock()
            .projects
            .entry(project_id.to_string())
            .or_insert(None);
    }

    /// Add or replace a task. Its project is registered implicitly.
    pub fn insert_task(&self, task: Task) {
        let mut state = self.state.lock();
        state
            .projects
            .entry(task.project_id.clone())
            .or_insert(None);
        match state.tasks.iter().position(|t| t.id == task.id) {
            Some(idx) => state.tasks[idx] = task,
            None => state.tasks.push(task),
        }
    }

    /// Last progress written for a project.
    pub fn project_progress(&self, project_id: &str) -> Option<f64> {
        self.state.lock().projects.get(project_id).copied().flatten()
    }

    pub fn task_count(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn dependency_count(&self) -> usize {
        self.state.lock().dependencies.len()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .state
            .lock()
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    fn get_task(&self, task_id: &str) -> StoreResult<Task> {
        self.state
            .lock()
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))
    }

    fn list_dependencies(&self, project_id: &str) -> StoreResult<Vec<Dependency>> {
        Ok(self
            .state
            .lock()
            .dependencies
            .iter()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect())
    }

    fn insert_dependency(&self, dependency: Dependency) -> StoreResult<()> {
        self.state.lock().dependencies.push(dependency);
        Ok(())
    }

    fn delete_dependency(&self, predecessor_id: &str, successor_id: &str) -> StoreResult<()> {
        self.state.lock().dependencies.retain(|d| {
            !(d.predecessor_id == predecessor_id && d.successor_id == successor_id)
        });
        Ok(())
    }

    fn update_project_progress(&self, project_id: &str, percent: f64) -> StoreResult<()> {
        let mut state = self.state.lock();
        let progress = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| StoreError::project_not_found(project_id))?;
        *progress = Some(percent);
        Ok(())
    }

    fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        if state.tasks.len() == before {
            return Err(StoreError::task_not_found(task_id));
        }
        Ok(())
    }
}
