//! Task data structure and related functionality.
//!
//! A `Task` is a unit of work inside a project. Tasks are created by the store, which
//! owns their identity; everything else about a task changes through the lifecycle
//! methods defined here. Subtasks are owned values nested under their parent, forming
//! an acyclic tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::{Priority, Status};
use crate::utils::{is_overdue, normalise_tag, unique};

/// A note left on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A unit of work with status, priority, assignment and optional due date.
///
/// Field order is the on-disk field order. Absent optional values are written as
/// `null` rather than omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub project_id: u64,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Task>,
}

impl Task {
    pub(crate) fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        project_id: u64,
        priority: Priority,
    ) -> Self {
        Task {
            id,
            title: title.into(),
            description: description.into(),
            project_id,
            priority,
            status: Status::Todo,
            due_date: None,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: None,
            assigned_to: None,
            tags: Vec::new(),
            estimated_hours: None,
            actual_hours: None,
            comments: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Move the task to in-progress, whatever its current status.
    pub fn mark_in_progress(&mut self) {
        self.status = Status::InProgress;
        self.touch();
    }

    /// Mark the task completed and record when it happened.
    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.status = Status::Completed;
        self.completed_at = Some(now);
        self.updated_at = Some(now);
    }

    /// Assign the task to a user.
    ///
    /// Membership of the owning project is not checked here; `TaskManager::assign_task`
    /// is the place to add such a policy.
    pub fn assign_to(&mut self, user: impl Into<String>) {
        self.assigned_to = Some(user.into());
        self.touch();
    }

    /// Nest `subtask` under this task.
    ///
    /// Rejected when the candidate is this task or already contains it, since either
    /// would make the tree contain itself.
    pub fn add_subtask(&mut self, mut subtask: Task) -> Result<()> {
        if subtask.id == self.id || subtask.contains(self.id) {
            return Err(Error::CyclicSubtask {
                parent: self.id,
                child: subtask.id,
            });
        }
        subtask.set_project(self.project_id);
        self.subtasks.push(subtask);
        self.touch();
        Ok(())
    }

    /// Whether a task with `id` appears anywhere below this one.
    pub fn contains(&self, id: u64) -> bool {
        self.subtasks.iter().any(|s| s.id == id || s.contains(id))
    }

    /// Find this task or one of its descendants by id.
    pub fn find_mut(&mut self, id: u64) -> Option<&mut Task> {
        if self.id == id {
            return Some(self);
        }
        self.subtasks.iter_mut().find_map(|s| s.find_mut(id))
    }

    /// Number of tasks nested below this one, at any depth.
    pub fn subtask_count(&self) -> usize {
        self.subtasks.iter().map(|s| 1 + s.subtask_count()).sum()
    }

    pub(crate) fn set_project(&mut self, project_id: u64) {
        self.project_id = project_id;
        for s in self.subtasks.iter_mut() {
            s.set_project(project_id);
        }
    }

    /// Add a tag; tags are normalised and kept unique.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = normalise_tag(tag);
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.touch();
        true
    }

    /// Remove a tag. Returns false when the task did not carry it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = normalise_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        let removed = self.tags.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn add_comment(&mut self, author: impl Into<String>, text: impl Into<String>) {
        let now = Utc::now();
        self.comments.push(Comment {
            author: author.into(),
            text: text.into(),
            created_at: now,
        });
        self.updated_at = Some(now);
    }

    pub fn set_estimated_time(&mut self, hours: f64) -> Result<()> {
        self.estimated_hours = Some(check_hours(hours)?);
        self.touch();
        Ok(())
    }

    pub fn set_actual_time(&mut self, hours: f64) -> Result<()> {
        self.actual_hours = Some(check_hours(hours)?);
        self.touch();
        Ok(())
    }

    /// A task is overdue when its due date has passed and it is not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != Status::Completed && self.due_date.is_some_and(|d| is_overdue(d, now))
    }

    /// Apply a partial update. `id`, `created_at` and `subtasks` are never touched.
    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(project_id) = patch.project_id {
            self.set_project(project_id);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
        if let Some(tags) = patch.tags {
            self.tags = unique(
                tags.iter()
                    .map(|t| normalise_tag(t))
                    .filter(|t| !t.is_empty()),
            );
        }
        if let Some(hours) = patch.estimated_hours {
            self.estimated_hours = hours;
        }
        if let Some(hours) = patch.actual_hours {
            self.actual_hours = hours;
        }
        match patch.status {
            Some(Status::Completed) => self.mark_completed(),
            Some(Status::InProgress) => self.mark_in_progress(),
            Some(status) => self.status = status,
            None => {}
        }
        self.touch();
    }
}

fn check_hours(hours: f64) -> Result<f64> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(Error::InvalidArgument(format!("hours must be a non-negative number, got {hours}")))
    }
}

/// Partial update for a task. `None` leaves a field alone; for optional fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<u64>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assigned_to: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
}
