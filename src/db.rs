//! The store: sole owner of project and task identity, and sole writer of the data files.
//!
//! State lives in memory in two id-keyed maps and is written through to disk after
//! every mutation. Each collection has its own JSON file holding every entity plus the
//! last id handed out:
//!
//! ```text
//! <data_dir>/
//!   projects.json   # {"projects": [...], "last_id": 3}
//!   tasks.json      # {"tasks": [...], "last_id": 12}
//! ```
//!
//! Ids start at 1, only ever increase, and are never reused, even after deletion.
//! Once a store is opened, every task in the global map belongs to a project that
//! exists, and appears in that project's task list.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fields::Priority;
use crate::project::{Project, ProjectPatch};
use crate::task::{Task, TaskPatch};

pub const PROJECTS_FILE: &str = "projects.json";
pub const TASKS_FILE: &str = "tasks.json";

#[derive(Serialize)]
struct ProjectsOut<'a> {
    projects: Vec<&'a Project>,
    last_id: u64,
}

#[derive(Deserialize)]
struct ProjectsIn {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    last_id: u64,
}

#[derive(Serialize)]
struct TasksOut<'a> {
    tasks: Vec<&'a Task>,
    last_id: u64,
}

#[derive(Deserialize)]
struct TasksIn {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    last_id: u64,
}

/// File-backed store for projects and tasks.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    projects_file: PathBuf,
    tasks_file: PathBuf,
    projects: BTreeMap<u64, Project>,
    tasks: BTreeMap<u64, Task>,
    next_project_id: u64,
    next_task_id: u64,
}

impl Store {
    /// Create an empty store writing to `data_dir`, creating the directory if needed.
    /// Existing files are left alone until the first save.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_files(data_dir, PROJECTS_FILE, TASKS_FILE)
    }

    /// Like `new`, with custom file names inside `data_dir`.
    pub fn with_files(data_dir: impl AsRef<Path>, projects_file: &str, tasks_file: &str) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Store {
            projects_file: data_dir.join(projects_file),
            tasks_file: data_dir.join(tasks_file),
            data_dir,
            projects: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_project_id: 1,
            next_task_id: 1,
        })
    }

    /// Open the store in `data_dir`, loading whatever was previously saved there.
    ///
    /// Missing or unreadable files leave that collection empty. Tasks whose project
    /// did not survive the load are dropped.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new(data_dir)?;
        store.load_all();
        Ok(store)
    }

    /// Open the store described by a configuration preset.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut store = Self::with_files(&config.data_dir, &config.projects_file, &config.tasks_file)?;
        store.load_all();
        Ok(store)
    }

    fn load_all(&mut self) {
        self.load_projects();
        self.load_tasks();
        self.prune_orphans();
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create a project. The owner becomes its first member.
    pub fn create_project(&mut self, name: &str, description: &str, owner: &str) -> Result<Project> {
        let id = self.next_project_id;
        let project = Project::new(id, name, description, owner);
        self.projects.insert(id, project.clone());
        self.next_project_id += 1;
        debug!(project_id = id, name, owner, "created project");
        self.save_projects()?;
        Ok(project)
    }

    /// Create a task in an existing project. Returns `None`, changing nothing, when the
    /// project does not exist.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        project_id: u64,
        priority: Priority,
    ) -> Result<Option<Task>> {
        let Some(project) = self.projects.get_mut(&project_id) else {
            debug!(project_id, "create_task: no such project");
            return Ok(None);
        };
        let id = self.next_task_id;
        let task = Task::new(id, title, description, project_id, priority);
        project.link_task(id);
        self.tasks.insert(id, task.clone());
        self.next_task_id += 1;
        debug!(task_id = id, project_id, "created task");
        self.save_tasks()?;
        self.save_projects()?;
        Ok(Some(task))
    }

    /// Create a task nested under `parent_id`, which may itself be a subtask.
    ///
    /// The subtask takes a fresh id from the task counter and inherits the parent's
    /// project. It lives inside its parent, not in the global task map.
    pub fn create_subtask(
        &mut self,
        parent_id: u64,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<Option<Task>> {
        let id = self.next_task_id;
        let Some(parent) = self.tasks.values_mut().find_map(|t| t.find_mut(parent_id)) else {
            debug!(parent_id, "create_subtask: no such task");
            return Ok(None);
        };
        let subtask = Task::new(id, title, description, parent.project_id, priority);
        parent.add_subtask(subtask.clone())?;
        self.next_task_id += 1;
        debug!(task_id = id, parent_id, "created subtask");
        self.save_tasks()?;
        Ok(Some(subtask))
    }

    pub fn get_project(&self, id: u64) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// All projects in creation order.
    pub fn get_all_projects(&self) -> Vec<&Project> {
        self.projects.values().collect()
    }

    /// All top-level tasks in creation order.
    pub fn get_all_tasks(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    /// The global task map, keyed by id.
    pub fn tasks(&self) -> &BTreeMap<u64, Task> {
        &self.tasks
    }

    /// The tasks of a project, in the project's list order.
    pub fn project_tasks(&self, project_id: u64) -> Option<Vec<&Task>> {
        self.projects
            .get(&project_id)
            .map(|p| p.resolve_tasks(&self.tasks))
    }

    /// Completion percentage of a project.
    pub fn completion_rate(&self, project_id: u64) -> Option<f64> {
        self.projects
            .get(&project_id)
            .map(|p| p.completion_rate(&self.tasks))
    }

    pub fn update_project(&mut self, id: u64, patch: ProjectPatch) -> Result<Option<Project>> {
        let Some(project) = self.projects.get_mut(&id) else {
            return Ok(None);
        };
        project.apply_patch(patch);
        let updated = project.clone();
        self.save_projects()?;
        Ok(Some(updated))
    }

    /// Apply a partial update to a task.
    ///
    /// Returns `None` when the task does not exist, or when the patch moves it to a
    /// project that does not exist; nothing is applied in either case.
    pub fn update_task(&mut self, id: u64, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(current) = self.tasks.get(&id).map(|t| t.project_id) else {
            return Ok(None);
        };
        let moved_to = patch.project_id.filter(|&p| p != current);
        if let Some(target) = moved_to {
            if !self.projects.contains_key(&target) {
                debug!(task_id = id, target, "update_task: no such target project");
                return Ok(None);
            }
            if let Some(old) = self.projects.get_mut(&current) {
                old.unlink_task(id);
            }
            if let Some(new) = self.projects.get_mut(&target) {
                new.link_task(id);
            }
        }
        let Some(task) = self.tasks.get_mut(&id) else {
            return Ok(None);
        };
        task.apply_patch(patch);
        let updated = task.clone();
        self.save_tasks()?;
        if moved_to.is_some() {
            self.save_projects()?;
        }
        Ok(Some(updated))
    }

    /// Run `f` against a task and persist the result.
    ///
    /// The task's id and project are restored afterwards if `f` changed them; use
    /// `update_task` to move a task between projects.
    pub fn modify_task<R>(&mut self, id: u64, f: impl FnOnce(&mut Task) -> R) -> Result<Option<R>> {
        let Some(task) = self.tasks.get_mut(&id) else {
            return Ok(None);
        };
        let project_id = task.project_id;
        let out = f(&mut *task);
        task.id = id;
        task.set_project(project_id);
        self.save_tasks()?;
        Ok(Some(out))
    }

    /// Run `f` against a project and persist the result.
    ///
    /// The project's id and task list are restored afterwards, and the owner is kept in
    /// the member list.
    pub fn modify_project<R>(&mut self, id: u64, f: impl FnOnce(&mut Project) -> R) -> Result<Option<R>> {
        let Some(project) = self.projects.get_mut(&id) else {
            return Ok(None);
        };
        let tasks = project.tasks.clone();
        let out = f(&mut *project);
        project.id = id;
        project.tasks = tasks;
        if !project.is_member(&project.owner) {
            let owner = project.owner.clone();
            project.members.insert(0, owner);
        }
        self.save_projects()?;
        Ok(Some(out))
    }

    /// Delete a project and every task it owns.
    pub fn delete_project(&mut self, id: u64) -> Result<bool> {
        if self.projects.remove(&id).is_none() {
            return Ok(false);
        }
        let before = self.tasks.len();
        self.tasks.retain(|_, t| t.project_id != id);
        info!(project_id = id, removed_tasks = before - self.tasks.len(), "deleted project");
        self.save_projects()?;
        self.save_tasks()?;
        Ok(true)
    }

    /// Delete a task and unlink it from its project.
    pub fn delete_task(&mut self, id: u64) -> Result<bool> {
        let Some(task) = self.tasks.remove(&id) else {
            return Ok(false);
        };
        if let Some(project) = self.projects.get_mut(&task.project_id) {
            project.unlink_task(id);
        }
        debug!(task_id = id, project_id = task.project_id, "deleted task");
        self.save_projects()?;
        self.save_tasks()?;
        Ok(true)
    }

    /// Write every project and the last project id, replacing the file's contents.
    pub fn save_projects(&self) -> Result<()> {
        let out = ProjectsOut {
            projects: self.projects.values().collect(),
            last_id: self.next_project_id - 1,
        };
        write_json(&self.projects_file, &out)
    }

    /// Write every task and the last task id, replacing the file's contents.
    pub fn save_tasks(&self) -> Result<()> {
        let out = TasksOut {
            tasks: self.tasks.values().collect(),
            last_id: self.next_task_id - 1,
        };
        write_json(&self.tasks_file, &out)
    }

    /// Replace the in-memory projects with the saved ones.
    ///
    /// Returns false, leaving memory untouched, if the file is missing or cannot be
    /// read or parsed.
    pub fn load_projects(&mut self) -> bool {
        let Some(stored) = read_json::<ProjectsIn>(&self.projects_file) else {
            return false;
        };
        let max_id = stored.projects.iter().map(|p| p.id).max().unwrap_or(0);
        let Some(next_id) = next_id_after(stored.last_id.max(max_id), &self.projects_file) else {
            return false;
        };
        self.next_project_id = next_id;
        self.projects = stored.projects.into_iter().map(|p| (p.id, p)).collect();
        info!(count = self.projects.len(), path = %self.projects_file.display(), "loaded projects");
        if !self.tasks.is_empty() {
            self.relink();
        }
        true
    }

    /// Replace the in-memory tasks with the saved ones and re-link them into their
    /// projects' task lists.
    ///
    /// Tasks whose project is not loaded yet are kept, so either load order works;
    /// load projects as well before relying on every task having a project. `open`
    /// does both and then drops tasks whose project is missing.
    ///
    /// Returns false, leaving memory untouched, if the file is missing or cannot be
    /// read or parsed.
    pub fn load_tasks(&mut self) -> bool {
        let Some(stored) = read_json::<TasksIn>(&self.tasks_file) else {
            return false;
        };
        let max_id = stored.tasks.iter().map(max_task_id).max().unwrap_or(0);
        let Some(next_id) = next_id_after(stored.last_id.max(max_id), &self.tasks_file) else {
            return false;
        };
        self.next_task_id = next_id;
        self.tasks = stored.tasks.into_iter().map(|t| (t.id, t)).collect();
        info!(count = self.tasks.len(), path = %self.tasks_file.display(), "loaded tasks");
        self.relink();
        true
    }

    /// Rebuild each project's task list from the task map, keeping the saved order for
    /// tasks that still belong to it and appending any that are missing.
    fn relink(&mut self) {
        let tasks = &self.tasks;
        for project in self.projects.values_mut() {
            let pid = project.id;
            project
                .tasks
                .retain(|id| tasks.get(id).is_some_and(|t| t.project_id == pid));
        }
        for task in self.tasks.values() {
            if let Some(project) = self.projects.get_mut(&task.project_id) {
                project.link_task(task.id);
            }
        }
    }

    /// Drop tasks whose project does not exist. Returns how many were dropped.
    fn prune_orphans(&mut self) -> usize {
        let projects = &self.projects;
        let before = self.tasks.len();
        self.tasks.retain(|id, t| {
            let keep = projects.contains_key(&t.project_id);
            if !keep {
                warn!(task_id = id, project_id = t.project_id, "dropping task of missing project");
            }
            keep
        });
        before - self.tasks.len()
    }

    /// Forget everything in memory and restart ids at 1. Files on disk are untouched
    /// until the next save.
    pub fn clear_all(&mut self) {
        self.projects.clear();
        self.tasks.clear();
        self.next_project_id = 1;
        self.next_task_id = 1;
    }
}

/// The id following `last`, or `None` (with a warning) when the saved ids are exhausted.
fn next_id_after(last: u64, path: &Path) -> Option<u64> {
    let next = last.checked_add(1);
    if next.is_none() {
        warn!(path = %path.display(), last_id = last, "id counter exhausted in data file");
    }
    next
}

fn max_task_id(task: &Task) -> u64 {
    task.subtasks.iter().map(max_task_id).fold(task.id, u64::max)
}

/// Write `value` as pretty JSON using an atomic write (temp file + rename).
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(value)?;
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = data.len(), "saved");
    Ok(())
}

/// Read and parse a JSON file. Missing files are `None` quietly; unreadable or
/// malformed ones are `None` with a warning.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let mut buf = String::new();
    match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "error reading data file");
            return None;
        }
    }
    match serde_json::from_str(&buf) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "error parsing data file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path()).expect("store");
        (dir, store)
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let (_dir, mut store) = setup_store();
        let p1 = store.create_project("A", "", "alice").unwrap();
        let p2 = store.create_project("B", "", "bob").unwrap();
        assert_eq!((p1.id, p2.id), (1, 2));
        let t1 = store.create_task("t1", "", 1, Priority::Low).unwrap().unwrap();
        let t2 = store.create_task("t2", "", 2, Priority::High).unwrap().unwrap();
        assert_eq!((t1.id, t2.id), (1, 2));
        assert_eq!(t1.status, Status::Todo);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        assert!(store.delete_task(1).unwrap());
        assert!(store.delete_project(1).unwrap());
        let p = store.create_project("B", "", "alice").unwrap();
        let t = store.create_task("t2", "", p.id, Priority::Low).unwrap().unwrap();
        assert_eq!((p.id, t.id), (2, 2));
    }

    #[test]
    fn create_task_in_missing_project_changes_nothing() {
        let (_dir, mut store) = setup_store();
        assert!(store.create_task("orphan", "", 42, Priority::Low).unwrap().is_none());
        assert!(store.get_all_tasks().is_empty());
        store.create_project("A", "", "alice").unwrap();
        let t = store.create_task("t", "", 1, Priority::Low).unwrap().unwrap();
        assert_eq!(t.id, 1);
    }

    #[test]
    fn create_task_links_into_project() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store.create_task("t2", "", 1, Priority::Low).unwrap();
        assert_eq!(store.get_project(1).unwrap().tasks, vec![1, 2]);
        let titles: Vec<&str> = store
            .project_tasks(1)
            .unwrap()
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["t1", "t2"]);
    }

    #[test]
    fn delete_project_cascades() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_project("B", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store.create_task("t2", "", 1, Priority::Low).unwrap();
        store.create_task("t3", "", 2, Priority::Low).unwrap();

        assert!(store.delete_project(1).unwrap());
        assert!(store.get_project(1).is_none());
        assert!(store.get_task(1).is_none());
        assert!(store.get_task(2).is_none());
        assert_eq!(store.get_all_tasks().len(), 1);
        assert!(!store.delete_project(1).unwrap());
    }

    #[test]
    fn delete_task_unlinks_from_project() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store.create_task("t2", "", 1, Priority::Low).unwrap();
        assert!(store.delete_task(1).unwrap());
        assert_eq!(store.get_project(1).unwrap().tasks, vec![2]);
        assert!(store.get_task(1).is_none());
        assert!(!store.delete_task(1).unwrap());
    }

    #[test]
    fn update_task_ignores_identity_and_checks_target_project() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_project("B", "", "bob").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();

        let moved = TaskPatch {
            project_id: Some(9),
            title: Some("nope".into()),
            ..Default::default()
        };
        assert!(store.update_task(1, moved).unwrap().is_none());
        assert_eq!(store.get_task(1).unwrap().title, "t1");

        let moved = TaskPatch {
            project_id: Some(2),
            priority: Some(Priority::Critical),
            ..Default::default()
        };
        let t = store.update_task(1, moved).unwrap().unwrap();
        assert_eq!((t.id, t.project_id, t.priority), (1, 2, Priority::Critical));
        assert!(store.get_project(1).unwrap().tasks.is_empty());
        assert_eq!(store.get_project(2).unwrap().tasks, vec![1]);

        assert!(store.update_task(7, TaskPatch::default()).unwrap().is_none());
    }

    #[test]
    fn update_project_applies_known_fields() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        let patch = ProjectPatch {
            name: Some("Renamed".into()),
            archived: Some(true),
            ..Default::default()
        };
        let p = store.update_project(1, patch).unwrap().unwrap();
        assert_eq!((p.id, p.name.as_str(), p.archived), (1, "Renamed", true));
        assert!(store.update_project(2, ProjectPatch::default()).unwrap().is_none());
    }

    #[test]
    fn modify_task_cannot_change_identity() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        let done = store
            .modify_task(1, |t| {
                t.id = 99;
                t.project_id = 5;
                t.mark_completed();
                t.status
            })
            .unwrap();
        assert_eq!(done, Some(Status::Completed));
        let t = store.get_task(1).unwrap();
        assert_eq!((t.id, t.project_id), (1, 1));
        assert_eq!(store.completion_rate(1), Some(100.0));
        assert!(store.modify_task(3, |_| ()).unwrap().is_none());
    }

    #[test]
    fn modify_project_keeps_owner_and_tasks() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store
            .modify_project(1, |p| {
                p.members.clear();
                p.tasks.clear();
                p.add_member("bob");
            })
            .unwrap();
        let p = store.get_project(1).unwrap();
        assert_eq!(p.members, vec!["alice", "bob"]);
        assert_eq!(p.tasks, vec![1]);
    }

    #[test]
    fn subtasks_draw_from_the_task_counter() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("parent", "", 1, Priority::Low).unwrap();
        let sub = store.create_subtask(1, "child", "", Priority::Low).unwrap().unwrap();
        let nested = store.create_subtask(sub.id, "grandchild", "", Priority::Low).unwrap().unwrap();
        assert_eq!((sub.id, nested.id), (2, 3));
        assert!(store.get_task(2).is_none());
        assert_eq!(store.get_task(1).unwrap().subtask_count(), 2);
        assert!(store.create_subtask(50, "x", "", Priority::Low).unwrap().is_none());
        let next = store.create_task("next", "", 1, Priority::Low).unwrap().unwrap();
        assert_eq!(next.id, 4);
    }

    #[test]
    fn save_and_load_round_trip() {
        let (dir, mut store) = setup_store();
        store.create_project("A", "first", "alice").unwrap();
        store.create_project("B", "second", "bob").unwrap();
        store.create_task("t1", "d1", 1, Priority::High).unwrap();
        store.create_task("t2", "d2", 2, Priority::Low).unwrap();
        store.create_subtask(1, "sub", "", Priority::Critical).unwrap();
        store.modify_task(2, |t| t.mark_completed()).unwrap();
        store.modify_project(1, |p| p.add_member("carol")).unwrap();

        let mut fresh = Store::new(dir.path()).unwrap();
        assert!(fresh.load_projects());
        assert!(fresh.load_tasks());
        assert_eq!(fresh.get_all_projects(), store.get_all_projects());
        assert_eq!(fresh.get_all_tasks(), store.get_all_tasks());
        assert_eq!(fresh.next_project_id, 3);
        assert_eq!(fresh.next_task_id, 4);
    }

    #[test]
    fn hours_survive_save_and_load_exactly() {
        let (dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut awkward = vec![4.055474706295447e-187, 0.1 + 0.2, 1.0 / 3.0, f64::MIN_POSITIVE];
        for _ in 0..60 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            // Top two bits clear: positive and finite.
            awkward.push(f64::from_bits(seed >> 2));
        }
        for pair in awkward.chunks(2) {
            let t = store.create_task("t", "", 1, Priority::Low).unwrap().unwrap();
            store
                .update_task(t.id, TaskPatch {
                    estimated_hours: Some(Some(pair[0])),
                    actual_hours: Some(pair.get(1).copied()),
                    ..Default::default()
                })
                .unwrap();
        }

        let fresh = Store::open(dir.path()).unwrap();
        for (saved, loaded) in store.get_all_tasks().iter().zip(fresh.get_all_tasks()) {
            assert_eq!(saved.estimated_hours.map(f64::to_bits), loaded.estimated_hours.map(f64::to_bits));
            assert_eq!(saved.actual_hours.map(f64::to_bits), loaded.actual_hours.map(f64::to_bits));
        }
        assert_eq!(fresh.get_all_tasks().len(), awkward.len() / 2);
    }

    #[test]
    fn loading_tasks_before_projects_still_links_them() {
        let (dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store.create_task("t2", "", 1, Priority::Low).unwrap();

        let mut fresh = Store::new(dir.path()).unwrap();
        assert!(fresh.load_tasks());
        assert_eq!(fresh.get_all_tasks().len(), 2);
        assert!(fresh.get_all_projects().is_empty());
        assert!(fresh.load_projects());
        assert_eq!(fresh.get_project(1).unwrap().tasks, vec![1, 2]);
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let (dir, mut store) = setup_store();
        assert!(!store.load_projects());
        assert!(!store.load_tasks());
        fs::write(dir.path().join(TASKS_FILE), "{not json").unwrap();
        assert!(!store.load_tasks());
        assert_eq!(store.next_task_id, 1);
    }

    #[test]
    fn load_rejects_exhausted_id_counter() {
        let (dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        fs::write(
            dir.path().join(PROJECTS_FILE),
            format!(r#"{{"projects": [], "last_id": {}}}"#, u64::MAX),
        )
        .unwrap();
        assert!(!store.load_projects());
        assert_eq!(store.next_project_id, 2);
        assert!(store.get_project(1).is_some());

        fs::write(
            dir.path().join(TASKS_FILE),
            format!(
                r#"{{"tasks": [{{"id": {}, "title": "t", "description": "", "project_id": 1,
                "priority": "low", "status": "todo", "due_date": null,
                "created_at": "2024-01-01T00:00:00Z", "completed_at": null,
                "assigned_to": null, "tags": [], "subtasks": []}}], "last_id": 1}}"#,
                u64::MAX
            ),
        )
        .unwrap();
        assert!(!store.load_tasks());
        assert_eq!(store.next_task_id, 1);
        assert!(store.get_all_tasks().is_empty());
    }

    #[test]
    fn load_restores_counter_from_last_id() {
        let (dir, mut store) = setup_store();
        fs::write(
            dir.path().join(PROJECTS_FILE),
            r#"{"projects": [], "last_id": 7}"#,
        )
        .unwrap();
        assert!(store.load_projects());
        let p = store.create_project("A", "", "alice").unwrap();
        assert_eq!(p.id, 8);
    }

    #[test]
    fn open_drops_orphaned_tasks() {
        let (dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        fs::write(
            dir.path().join(PROJECTS_FILE),
            r#"{"projects": [], "last_id": 1}"#,
        )
        .unwrap();
        let reopened = Store::open(dir.path()).unwrap();
        assert!(reopened.get_all_tasks().is_empty());
    }

    #[test]
    fn clear_all_resets_counters() {
        let (_dir, mut store) = setup_store();
        store.create_project("A", "", "alice").unwrap();
        store.create_task("t1", "", 1, Priority::Low).unwrap();
        store.clear_all();
        assert!(store.get_all_projects().is_empty());
        assert!(store.get_all_tasks().is_empty());
        assert_eq!(store.create_project("B", "", "bob").unwrap().id, 1);
    }
}
