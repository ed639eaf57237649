//! # Task Manager
//!
//! Personal and team task tracking backed by plain JSON files.
//!
//! ## Key Features
//!
//! - **Projects and Teams**: Projects have an owner, a capped member list and an archive flag
//! - **Tasks**: Status, priority, assignment, due dates, tags, comments, time tracking and
//!   nested subtasks
//! - **Durable Store**: Every change is written through to `projects.json` and `tasks.json`
//!   in the data directory; ids are never reused
//! - **Reporting**: Per-project statistics, overdue and high-priority views, keyword and tag search
//!
//! ## Quick Start
//!
//! ```no_run
//! use task_manager::{Priority, Store, TaskManager};
//!
//! # fn main() -> task_manager::Result<()> {
//! let mut manager = TaskManager::new(Store::open("./data")?);
//! manager.set_current_user("alice");
//!
//! let project = manager.create_project("Website", "Company site", None)?;
//! if let Some(task) = manager.create_task("Design", "Homepage mockups", project.id, Priority::High)? {
//!     manager.complete_task(task.id)?;
//! }
//! let stats = manager.get_project_stats(project.id);
//! # let _ = stats;
//! # Ok(())
//! # }
//! ```
//!
//! The `tm` binary wraps the same API; run `tm demo` for a guided tour.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod manager;
pub mod project;
pub mod task;
pub mod utils;

pub use config::{Config, Environment};
pub use db::Store;
pub use error::{Error, Result};
pub use fields::{Priority, Status};
pub use manager::{ProjectStats, TaskFilter, TaskManager};
pub use project::{Project, ProjectPatch};
pub use task::{Comment, Task, TaskPatch};
