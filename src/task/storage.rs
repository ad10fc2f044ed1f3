#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::core::git::{CommitInfo, Repo};
use crate::error::InvarError;
use crate::task::model::Task;

/// Version-controlled store: one JSON file per task in a flat directory
/// that is also a git working tree. Every mutation ends in a commit of the
/// whole tree; the file listing itself is the index.
///
/// Save is best-effort durability: the file write and the commit are two
/// sequential steps with no rollback between them. When the commit fails
/// after a successful write, the file keeps the new state and the error
/// surfaces to the caller.
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
    repo: Repo,
}

impl TaskStore {
    /// Ensures the directory exists and is a git working tree.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, InvarError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| InvarError::IoPath {
            path: dir.clone(),
            source: e,
        })?;
        let repo = Repo::init_or_open(&dir)?;
        Ok(Self { dir, repo })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, task: &Task) -> Result<(), InvarError> {
        let path = self.task_path(&task.id)?;
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(task).map_err(|e| InvarError::Decode {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&tmp, &data).map_err(|e| InvarError::IoPath {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| InvarError::IoPath {
            path: path.clone(),
            source: e,
        })?;

        self.repo
            .commit_all(&format!("Update task: {}", task.short_id()))
    }

    pub fn load(&self, id: &str) -> Result<Task, InvarError> {
        let path = self.task_path(id)?;
        let data = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InvarError::NotFound(id.to_owned())
            } else {
                InvarError::IoPath {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;
        serde_json::from_slice(&data).map_err(|e| InvarError::Decode { path, source: e })
    }

    pub fn delete(&self, id: &str) -> Result<(), InvarError> {
        let path = self.task_path(id)?;
        if !path.exists() {
            return Err(InvarError::NotFound(id.to_owned()));
        }
        std::fs::remove_file(&path).map_err(|e| InvarError::IoPath { path, source: e })?;

        self.repo
            .commit_all(&format!("Delete task: {}", short_id(id)))
    }

    /// Lists all tasks whose `archived` flag matches the filter. Records
    /// that fail to read or decode are skipped so one corrupt file never
    /// hides the rest of the list.
    pub fn list(&self, archived: bool) -> Result<Vec<Task>, InvarError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| InvarError::IoPath {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut tasks = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| InvarError::IoPath {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Ok(data) = std::fs::read(&path) else {
                continue;
            };
            let Ok(task) = serde_json::from_slice::<Task>(&data) else {
                continue;
            };
            if task.archived == archived {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// Commit audit trail; read-only, not used by mutation flows.
    pub fn log(&self) -> Result<Vec<CommitInfo>, InvarError> {
        self.repo.log()
    }

    fn task_path(&self, id: &str) -> Result<PathBuf, InvarError> {
        validate_task_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn validate_task_id(id: &str) -> Result<(), InvarError> {
    if id.trim().is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains("..")
    {
        return Err(InvarError::InvalidTaskId(id.to_owned()));
    }
    Ok(())
}
