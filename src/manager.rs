//! High-level task management on top of the store.
//!
//! `TaskManager` adds a "current user" context and the reporting queries (search,
//! overdue detection, per-project statistics). Mutations are delegated to the store,
//! and its found/not-found answer is passed back unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::db::Store;
use crate::error::Result;
use crate::fields::{Priority, Status};
use crate::project::Project;
use crate::task::Task;
use crate::utils::{is_due_today, normalise_tag};

/// Owner recorded when no owner is given and no user is logged in.
pub const UNKNOWN_USER: &str = "Unknown";

/// Summary numbers for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub project_id: u64,
    pub project_name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub todo_tasks: usize,
    pub completion_percentage: f64,
    pub team_size: usize,
}

/// Criteria for listing tasks. Every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks assigned to the current user.
    pub mine: bool,
    /// Only open high and critical tasks.
    pub urgent: bool,
    /// Only open tasks due today.
    pub due_today: bool,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub tag: Option<String>,
}

/// Facade over a `Store` with a current-user context.
#[derive(Debug)]
pub struct TaskManager {
    store: Store,
    current_user: Option<String>,
}

impl TaskManager {
    pub fn new(store: Store) -> Self {
        TaskManager {
            store,
            current_user: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn set_current_user(&mut self, user: impl Into<String>) {
        self.current_user = Some(user.into());
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Create a project owned by `owner`, else the current user, else `"Unknown"`.
    pub fn create_project(&mut self, name: &str, description: &str, owner: Option<&str>) -> Result<Project> {
        let owner = owner
            .or(self.current_user.as_deref())
            .unwrap_or(UNKNOWN_USER)
            .to_string();
        self.store.create_project(name, description, &owner)
    }

    /// Create a task, assigning it to the current user when one is set.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        project_id: u64,
        priority: Priority,
    ) -> Result<Option<Task>> {
        let Some(task) = self.store.create_task(title, description, project_id, priority)? else {
            return Ok(None);
        };
        let Some(user) = self.current_user.clone() else {
            return Ok(Some(task));
        };
        let assigned = self.store.modify_task(task.id, |t| {
            t.assign_to(user);
            t.clone()
        })?;
        Ok(assigned)
    }

    /// Projects owned by the current user; empty when nobody is logged in.
    pub fn get_my_projects(&self) -> Vec<&Project> {
        let Some(user) = self.current_user.as_deref() else {
            return Vec::new();
        };
        self.store
            .get_all_projects()
            .into_iter()
            .filter(|p| p.owner == user)
            .collect()
    }

    /// Tasks assigned to the current user; empty when nobody is logged in.
    pub fn get_my_tasks(&self) -> Vec<&Task> {
        let Some(user) = self.current_user.as_deref() else {
            return Vec::new();
        };
        self.filter_tasks(|t| t.assigned_to.as_deref() == Some(user))
    }

    fn filter_tasks(&self, pred: impl Fn(&Task) -> bool) -> Vec<&Task> {
        self.store
            .get_all_tasks()
            .into_iter()
            .filter(|&t| pred(t))
            .collect()
    }

    /// Open high and critical priority tasks.
    pub fn get_high_priority_tasks(&self) -> Vec<&Task> {
        self.filter_tasks(is_open_urgent)
    }

    pub fn get_tasks_by_priority(&self, priority: Priority) -> Vec<&Task> {
        self.filter_tasks(|t| t.priority == priority)
    }

    /// Tasks past their due date that are not completed.
    pub fn get_overdue_tasks(&self) -> Vec<&Task> {
        self.overdue_at(Utc::now())
    }

    pub fn overdue_at(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.filter_tasks(|t| t.is_overdue(now))
    }

    /// Open tasks due on the current UTC day.
    pub fn get_due_today_tasks(&self) -> Vec<&Task> {
        self.due_today_at(Utc::now())
    }

    pub fn due_today_at(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.filter_tasks(|t| due_today(t, now))
    }

    /// Tasks matching every criterion set in `filter`.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.list_tasks_at(filter, Utc::now())
    }

    pub fn list_tasks_at(&self, filter: &TaskFilter, now: DateTime<Utc>) -> Vec<&Task> {
        let user = self.current_user.as_deref();
        if filter.mine && user.is_none() {
            return Vec::new();
        }
        let tag = filter.tag.as_deref().map(normalise_tag);
        self.filter_tasks(|t| {
            (!filter.mine || t.assigned_to.as_deref() == user)
                && (!filter.urgent || is_open_urgent(t))
                && (!filter.due_today || due_today(t, now))
                && filter.priority.map_or(true, |p| t.priority == p)
                && filter.status.map_or(true, |s| t.status == s)
                && tag.as_ref().map_or(true, |tag| t.tags.contains(tag))
        })
    }

    /// Case-insensitive keyword search over titles and descriptions.
    pub fn search_tasks(&self, keyword: &str) -> Vec<&Task> {
        let keyword = keyword.to_lowercase();
        self.filter_tasks(|t| {
            t.title.to_lowercase().contains(&keyword) || t.description.to_lowercase().contains(&keyword)
        })
    }

    pub fn search_tasks_by_tag(&self, tag: &str) -> Vec<&Task> {
        let tag = normalise_tag(tag);
        self.filter_tasks(|t| t.tags.contains(&tag))
    }

    pub fn get_project_stats(&self, project_id: u64) -> Option<ProjectStats> {
        let project = self.store.get_project(project_id)?;
        let tasks = self.store.project_tasks(project_id)?;
        let count = |status: Status| tasks.iter().filter(|t| t.status == status).count();
        Some(ProjectStats {
            project_id,
            project_name: project.name.clone(),
            total_tasks: tasks.len(),
            completed_tasks: count(Status::Completed),
            in_progress_tasks: count(Status::InProgress),
            todo_tasks: count(Status::Todo),
            completion_percentage: crate::project::completion_rate(&tasks),
            team_size: project.members.len(),
        })
    }

    /// Add a member to a project. False when the project does not exist.
    pub fn add_team_member_to_project(&mut self, project_id: u64, member: &str) -> Result<bool> {
        let added = self.store.modify_project(project_id, |p| p.add_member(member))?;
        if added == Some(false) {
            debug!(project_id, member, "member not added (duplicate or team full)");
        }
        Ok(added.is_some())
    }

    /// Remove a member from a project. False when the project does not exist.
    pub fn remove_team_member_from_project(&mut self, project_id: u64, member: &str) -> Result<bool> {
        let removed = self.store.modify_project(project_id, |p| p.remove_member(member))?;
        Ok(removed.is_some())
    }

    pub fn assign_task(&mut self, task_id: u64, user: &str) -> Result<bool> {
        Ok(self.store.modify_task(task_id, |t| t.assign_to(user))?.is_some())
    }

    pub fn start_task(&mut self, task_id: u64) -> Result<bool> {
        Ok(self.store.modify_task(task_id, Task::mark_in_progress)?.is_some())
    }

    pub fn complete_task(&mut self, task_id: u64) -> Result<bool> {
        Ok(self.store.modify_task(task_id, Task::mark_completed)?.is_some())
    }

    pub fn tag_task(&mut self, task_id: u64, tag: &str) -> Result<bool> {
        Ok(self.store.modify_task(task_id, |t| t.add_tag(tag))?.is_some())
    }

    /// Leave a comment as the current user.
    pub fn add_task_comment(&mut self, task_id: u64, text: &str) -> Result<bool> {
        let author = self.current_user.as_deref().unwrap_or(UNKNOWN_USER).to_string();
        Ok(self.store.modify_task(task_id, |t| t.add_comment(author, text))?.is_some())
    }

    /// Record the hours actually spent on a task.
    pub fn log_task_time(&mut self, task_id: u64, hours: f64) -> Result<bool> {
        match self.store.modify_task(task_id, |t| t.set_actual_time(hours))? {
            Some(logged) => logged.map(|()| true),
            None => Ok(false),
        }
    }

    pub fn archive_project(&mut self, project_id: u64) -> Result<bool> {
        self.set_archived(project_id, true)
    }

    pub fn unarchive_project(&mut self, project_id: u64) -> Result<bool> {
        self.set_archived(project_id, false)
    }

    fn set_archived(&mut self, project_id: u64, archived: bool) -> Result<bool> {
        let found = self.store.modify_project(project_id, |p| p.archived = archived)?;
        Ok(found.is_some())
    }

    pub fn delete_project(&mut self, project_id: u64) -> Result<bool> {
        self.store.delete_project(project_id)
    }

    pub fn delete_task(&mut self, task_id: u64) -> Result<bool> {
        self.store.delete_task(task_id)
    }
}

fn is_open_urgent(t: &Task) -> bool {
    t.priority.is_urgent() && t.status != Status::Completed
}

fn due_today(t: &Task, now: DateTime<Utc>) -> bool {
    t.status != Status::Completed && t.due_date.is_some_and(|d| is_due_today(d, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::task::TaskPatch;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TaskManager) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manager = TaskManager::new(Store::new(dir.path()).expect("store"));
        manager.set_current_user("alice");
        (dir, manager)
    }

    #[test]
    fn owner_defaults_to_current_user() {
        let (_dir, mut m) = setup();
        assert_eq!(m.create_project("Test", "Desc", None).unwrap().owner, "alice");
        assert_eq!(m.create_project("Other", "", Some("bob")).unwrap().owner, "bob");

        let dir = tempfile::tempdir().unwrap();
        let mut anon = TaskManager::new(Store::new(dir.path()).unwrap());
        assert_eq!(anon.create_project("X", "", None).unwrap().owner, UNKNOWN_USER);
        assert!(anon.get_my_projects().is_empty());
        assert!(anon.get_my_tasks().is_empty());
    }

    #[test]
    fn new_tasks_go_to_current_user() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "", None).unwrap();
        let t = m.create_task("Task", "", p.id, Priority::Medium).unwrap().unwrap();
        assert_eq!(t.assigned_to.as_deref(), Some("alice"));
        assert_eq!(m.get_my_tasks().len(), 1);
        assert!(m.create_task("Lost", "", 99, Priority::Low).unwrap().is_none());
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "Desc", None).unwrap();
        m.create_task("Python Task", "Learn Python", p.id, Priority::Medium).unwrap();
        m.create_task("JavaScript Task", "Learn JS", p.id, Priority::Medium).unwrap();
        assert_eq!(m.search_tasks("Python").len(), 1);
        assert_eq!(m.search_tasks("learn").len(), 2);
        assert!(m.search_tasks("rust").is_empty());
    }

    #[test]
    fn tag_and_priority_filters() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "", None).unwrap();
        let a = m.create_task("a", "", p.id, Priority::Critical).unwrap().unwrap();
        let b = m.create_task("b", "", p.id, Priority::High).unwrap().unwrap();
        m.create_task("c", "", p.id, Priority::Low).unwrap();
        assert!(m.tag_task(a.id, "Backend").unwrap());
        assert!(!m.tag_task(77, "x").unwrap());
        assert_eq!(m.search_tasks_by_tag("backend").len(), 1);
        assert_eq!(m.get_tasks_by_priority(Priority::Low).len(), 1);

        m.complete_task(b.id).unwrap();
        let urgent: Vec<u64> = m.get_high_priority_tasks().iter().map(|t| t.id).collect();
        assert_eq!(urgent, vec![a.id]);
    }

    #[test]
    fn overdue_excludes_completed_and_undated() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "", None).unwrap();
        let now = Utc::now();
        for title in ["late", "done", "undated", "future"] {
            m.create_task(title, "", p.id, Priority::Low).unwrap();
        }
        let due = |d| TaskPatch {
            due_date: Some(Some(d)),
            ..Default::default()
        };
        m.store_mut().update_task(1, due(now - Duration::days(2))).unwrap();
        m.store_mut().update_task(2, due(now - Duration::days(2))).unwrap();
        m.store_mut().update_task(4, due(now + Duration::days(2))).unwrap();
        m.complete_task(2).unwrap();

        let overdue: Vec<&str> = m.overdue_at(now).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(overdue, vec!["late"]);
    }

    #[test]
    fn due_today_excludes_completed_and_other_days() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "", None).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        for title in ["morning", "evening", "done", "tomorrow", "undated"] {
            m.create_task(title, "", p.id, Priority::Low).unwrap();
        }
        let due = |d| TaskPatch {
            due_date: Some(Some(d)),
            ..Default::default()
        };
        m.store_mut().update_task(1, due(now - Duration::hours(11))).unwrap();
        m.store_mut().update_task(2, due(now + Duration::hours(11))).unwrap();
        m.store_mut().update_task(3, due(now)).unwrap();
        m.store_mut().update_task(4, due(now + Duration::hours(13))).unwrap();
        m.complete_task(3).unwrap();

        let today: Vec<&str> = m.due_today_at(now).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(today, vec!["morning", "evening"]);
    }

    #[test]
    fn list_filters_combine() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Test", "", None).unwrap();
        m.create_task("mine tagged", "", p.id, Priority::High).unwrap();
        m.create_task("mine plain", "", p.id, Priority::High).unwrap();
        m.create_task("bob tagged", "", p.id, Priority::Critical).unwrap();
        m.create_task("mine low tagged", "", p.id, Priority::Low).unwrap();
        m.assign_task(3, "bob").unwrap();
        for id in [1, 3, 4] {
            m.tag_task(id, "api").unwrap();
        }
        let titles = |m: &TaskManager, f: &TaskFilter| -> Vec<String> {
            m.list_tasks(f).iter().map(|t| t.title.clone()).collect()
        };

        let mine_tagged = TaskFilter {
            mine: true,
            tag: Some("API".into()),
            ..Default::default()
        };
        assert_eq!(titles(&m, &mine_tagged), vec!["mine tagged", "mine low tagged"]);

        let mine_urgent_tagged = TaskFilter {
            urgent: true,
            ..mine_tagged.clone()
        };
        assert_eq!(titles(&m, &mine_urgent_tagged), vec!["mine tagged"]);

        let urgent = TaskFilter {
            urgent: true,
            ..Default::default()
        };
        assert_eq!(titles(&m, &urgent), vec!["mine tagged", "mine plain", "bob tagged"]);
        assert_eq!(titles(&m, &TaskFilter::default()).len(), 4);

        m.complete_task(1).unwrap();
        assert_eq!(titles(&m, &mine_urgent_tagged), Vec::<String>::new());
    }

    #[test]
    fn stats_for_completed_project() {
        let (_dir, mut m) = setup();
        let p = m.create_project("Website", "", Some("alice")).unwrap();
        let t = m.create_task("Design", "", p.id, Priority::High).unwrap().unwrap();
        assert!(m.complete_task(t.id).unwrap());

        let stats = m.get_project_stats(p.id).unwrap();
        assert_eq!(stats.total_tasks, 1);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.completion_percentage, 100.0);
        assert_eq!(stats.team_size, 1);
        assert!(m.get_project_stats(42).is_none());
    }

    #[test]
    fn stats_count_each_status() {
        let (_dir, mut m) = setup();
        let p = m.create_project("P", "", None).unwrap();
        for i in 0..4 {
            m.create_task(&format!("t{i}"), "", p.id, Priority::Low).unwrap();
        }
        m.start_task(1).unwrap();
        m.complete_task(2).unwrap();
        m.add_team_member_to_project(p.id, "bob").unwrap();

        let stats = m.get_project_stats(p.id).unwrap();
        assert_eq!(
            (stats.todo_tasks, stats.in_progress_tasks, stats.completed_tasks),
            (2, 1, 1)
        );
        assert_eq!(stats.completion_percentage, 25.0);
        assert_eq!(stats.team_size, 2);
    }

    #[test]
    fn wrappers_report_missing_entities() {
        let (_dir, mut m) = setup();
        assert!(!m.assign_task(1, "bob").unwrap());
        assert!(!m.complete_task(1).unwrap());
        assert!(!m.archive_project(1).unwrap());
        assert!(!m.add_team_member_to_project(1, "bob").unwrap());
        assert!(!m.log_task_time(1, 2.0).unwrap());
        assert!(!m.delete_task(1).unwrap());
        assert!(!m.delete_project(1).unwrap());
    }

    #[test]
    fn archive_assign_comment_and_log() {
        let (_dir, mut m) = setup();
        let p = m.create_project("P", "", None).unwrap();
        let t = m.create_task("t", "", p.id, Priority::Low).unwrap().unwrap();

        assert!(m.archive_project(p.id).unwrap());
        assert!(m.store().get_project(p.id).unwrap().archived);
        assert!(m.unarchive_project(p.id).unwrap());
        assert!(!m.store().get_project(p.id).unwrap().archived);

        assert!(m.assign_task(t.id, "bob").unwrap());
        assert!(m.add_task_comment(t.id, "looks good").unwrap());
        assert!(m.log_task_time(t.id, 1.5).unwrap());
        assert!(m.log_task_time(t.id, -1.0).is_err());

        let stored = m.store().get_task(t.id).unwrap();
        assert_eq!(stored.assigned_to.as_deref(), Some("bob"));
        assert_eq!(stored.comments[0].author, "alice");
        assert_eq!(stored.actual_hours, Some(1.5));
    }

    #[test]
    fn owner_stays_on_team() {
        let (_dir, mut m) = setup();
        let p = m.create_project("P", "", None).unwrap();
        m.add_team_member_to_project(p.id, "bob").unwrap();
        m.remove_team_member_from_project(p.id, "alice").unwrap();
        m.remove_team_member_from_project(p.id, "bob").unwrap();
        assert_eq!(m.store().get_project(p.id).unwrap().members, vec!["alice"]);
    }
}
