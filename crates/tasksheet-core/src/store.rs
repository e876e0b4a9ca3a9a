use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{Local, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::Task;

/// Owns the persisted task list: one JSON array in `tasks.json`,
/// rewritten whole on every mutation.
#[derive(Debug)]
pub struct Store {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl Store {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.json");

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }

    /// A missing file and an unparseable file both read as an empty
    /// list. Corrupt data is dropped at the next save; keeping the app
    /// usable wins over preserving bytes nobody can decode.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<Task>> {
        let raw = match fs::read_to_string(&self.tasks_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %self.tasks_path.display(), "no task file yet");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed reading {}", self.tasks_path.display())
                });
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                Ok(tasks)
            }
            Err(err) => {
                warn!(
                    file = %self.tasks_path.display(),
                    error = %err,
                    "stored task list is unreadable; starting empty"
                );
                Ok(Vec::new())
            }
        }
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(file = %self.tasks_path.display(), count = tasks.len(), "saving task list");

        let dir = self.tasks_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string(tasks)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;

        temp.persist(&self.tasks_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.tasks_path.display(), err))?;

        Ok(())
    }

    /// Creates, appends, and persists a new task. The id is the
    /// creation time in epoch milliseconds, nudged upward if two adds
    /// land in the same millisecond.
    #[tracing::instrument(skip(self, tasks, title), fields(status = %status))]
    pub fn add(
        &self,
        mut tasks: Vec<Task>,
        title: &str,
        status: &str,
    ) -> anyhow::Result<(Vec<Task>, Task)> {
        let title = title.trim();
        if title.is_empty() {
            return Err(anyhow!("task title cannot be empty"));
        }

        let mut id = Utc::now().timestamp_millis();
        while tasks.iter().any(|task| task.id == id) {
            id += 1;
        }

        let task = Task::new(id, title.to_string(), status.to_string(), Local::now());
        tasks.push(task.clone());
        self.save(&tasks)?;

        info!(id = task.id, count = tasks.len(), "task added");
        Ok((tasks, task))
    }

    /// Filters the task with the given id out and persists the rest.
    /// Removing an unknown id is a no-op, not an error.
    #[tracing::instrument(skip(self, tasks))]
    pub fn remove(&self, tasks: Vec<Task>, id: i64) -> anyhow::Result<Vec<Task>> {
        let before = tasks.len();
        let kept: Vec<Task> = tasks.into_iter().filter(|task| task.id != id).collect();

        if kept.len() == before {
            debug!(id, "no task with that id; nothing removed");
        } else {
            info!(id, remaining = kept.len(), "task removed");
        }

        self.save(&kept)?;
        Ok(kept)
    }
}
