//! Projects: named collections of tasks with an owner and a team.
//!
//! A project does not own its task values; the store does. `Project::tasks` is the
//! ordered list of ids the project is responsible for, and the helpers here resolve
//! that list against the store's task map.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::Status;
use crate::task::Task;
use crate::utils::{normalise_tag, unique};

/// Team size cap applied by `add_member`.
pub const DEFAULT_MAX_MEMBERS: usize = 10;

fn default_max_members() -> usize {
    DEFAULT_MAX_MEMBERS
}

/// A named collection of tasks with an owner and team members.
///
/// The owner is always a member and can never be removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<String>,
    #[serde(default = "default_max_members")]
    pub max_members: usize,
    pub tasks: Vec<u64>,
    pub archived: bool,
    pub tags: Vec<String>,
}

impl Project {
    pub(crate) fn new(
        id: u64,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        Project {
            id,
            name: name.into(),
            description: description.into(),
            members: vec![owner.clone()],
            owner,
            created_at: Utc::now(),
            max_members: DEFAULT_MAX_MEMBERS,
            tasks: Vec::new(),
            archived: false,
            tags: Vec::new(),
        }
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }

    /// Add a team member. Duplicates are ignored and the team is capped at `max_members`.
    pub fn add_member(&mut self, user: impl Into<String>) -> bool {
        let user = user.into();
        if self.is_member(&user) || self.members.len() >= self.max_members {
            return false;
        }
        self.members.push(user);
        true
    }

    /// Remove a team member. The owner stays.
    pub fn remove_member(&mut self, user: &str) -> bool {
        if user == self.owner || !self.is_member(user) {
            return false;
        }
        self.members.retain(|m| m != user);
        true
    }

    pub(crate) fn link_task(&mut self, task_id: u64) {
        if !self.tasks.contains(&task_id) {
            self.tasks.push(task_id);
        }
    }

    pub(crate) fn unlink_task(&mut self, task_id: u64) {
        self.tasks.retain(|&id| id != task_id);
    }

    /// Resolve this project's task list against the store's task map, in list order.
    pub fn resolve_tasks<'a>(&self, all: &'a BTreeMap<u64, Task>) -> Vec<&'a Task> {
        self.tasks.iter().filter_map(|id| all.get(id)).collect()
    }

    pub fn tasks_by_status<'a>(&self, all: &'a BTreeMap<u64, Task>, status: Status) -> Vec<&'a Task> {
        self.resolve_tasks(all)
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// Percentage of completed tasks, `0.0` for a project without tasks.
    pub fn completion_rate(&self, all: &BTreeMap<u64, Task>) -> f64 {
        completion_rate(&self.resolve_tasks(all))
    }

    /// Apply a partial update. `id`, `created_at` and the task list are never touched.
    pub fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(owner) = patch.owner {
            if !self.is_member(&owner) {
                self.members.push(owner.clone());
            }
            self.owner = owner;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        if let Some(tags) = patch.tags {
            self.tags = unique(
                tags.iter()
                    .map(|t| normalise_tag(t))
                    .filter(|t| !t.is_empty()),
            );
        }
    }
}

/// Completed share of `tasks` as a percentage.
pub fn completion_rate(tasks: &[&Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.status == Status::Completed).count();
    completed as f64 / tasks.len() as f64 * 100.0
}

/// Partial update for a project. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub archived: Option<bool>,
    pub tags: Option<Vec<String>>,
}
