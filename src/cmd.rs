//! Command implementations for the CLI interface.
//!
//! Each handler takes the task manager, performs one operation through it, and prints
//! the outcome. Missing projects or tasks are reported as errors so the binary exits
//! with the user-error code.

use chrono::{Local, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fields::{Priority, Status};
use crate::manager::{TaskFilter, TaskManager};
use crate::project::Project;
use crate::task::{Task, TaskPatch};
use crate::utils::{
    format_date, format_due_relative, parse_date, parse_due_input, split_and_normalise_tags,
    start_of_day_utc, truncate, validate_string,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Populate the store with a sample team and print a report.
    Demo,

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Show statistics for a project.
    Stats {
        /// Project ID.
        project: u64,
    },

    /// List open tasks that are past their due date.
    Overdue,

    /// Print the active configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        desc: String,
        /// Owner; defaults to --user.
        #[arg(long)]
        owner: Option<String>,
    },
    /// List projects.
    List {
        /// Only projects owned by --user.
        #[arg(long)]
        mine: bool,
        /// Include archived projects.
        #[arg(long)]
        all: bool,
    },
    /// Show a project with its tasks.
    Show { id: u64 },
    /// Delete a project and all of its tasks.
    Delete { id: u64 },
    /// Archive a project.
    Archive { id: u64 },
    /// Unarchive a project.
    Unarchive { id: u64 },
    /// Add a team member.
    AddMember { id: u64, member: String },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task in a project.
    Add {
        title: String,
        /// Project ID. Required unless --parent is given.
        #[arg(long, required_unless_present = "parent")]
        project: Option<u64>,
        #[arg(long, default_value = "")]
        desc: String,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Nest under this task instead of adding a top-level task. The subtask joins
        /// the parent's project.
        #[arg(long, conflicts_with_all = ["project", "due", "tags"])]
        parent: Option<u64>,
    },
    /// List tasks with optional filters.
    List {
        /// Only tasks assigned to --user.
        #[arg(long)]
        mine: bool,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        tag: Option<String>,
        /// Only open high and critical tasks.
        #[arg(long)]
        urgent: bool,
        /// Only open tasks due today.
        #[arg(long)]
        due_today: bool,
    },
    /// Mark a task in progress.
    Start { id: u64 },
    /// Mark a task completed.
    Complete { id: u64 },
    /// Assign a task to a user.
    Assign { id: u64, user: String },
    /// Tag a task.
    Tag { id: u64, tag: String },
    /// Comment on a task as --user.
    Comment { id: u64, text: String },
    /// Log hours spent on a task.
    Log { id: u64, hours: f64 },
    /// Delete a task.
    Delete { id: u64 },
    /// Search titles and descriptions.
    Search { keyword: String },
}

fn project_not_found(id: u64) -> Error {
    eprintln!("Project {id} not found.");
    Error::ProjectNotFound(id)
}

fn task_not_found(id: u64) -> Error {
    eprintln!("Task {id} not found.");
    Error::TaskNotFound(id)
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<12} {:<9} {:<10} {:<8} {:<10} {}",
        "ID", "Status", "Priority", "Due", "Project", "Assignee", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<5} {:<12} {:<9} {:<10} {:<8} {:<10} {}{}",
            t.id,
            t.status,
            t.priority.label(),
            format_due_relative(t.due_date, today),
            t.project_id,
            truncate(t.assigned_to.as_deref().unwrap_or("-"), 10),
            t.title,
            tags
        );
    }
}

fn print_projects(projects: &[&Project], manager: &TaskManager) {
    println!("{:<5} {:<24} {:<10} {:<6} {:<7} {}", "ID", "Name", "Owner", "Tasks", "Done%", "Archived");
    for p in projects {
        let rate = manager.store().completion_rate(p.id).unwrap_or(0.0);
        println!(
            "{:<5} {:<24} {:<10} {:<6} {:<7.1} {}",
            p.id,
            truncate(&p.name, 24),
            truncate(&p.owner, 10),
            p.tasks.len(),
            rate,
            if p.archived { "yes" } else { "no" }
        );
    }
}

pub fn cmd_project(manager: &mut TaskManager, config: &Config, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name, desc, owner } => {
            if !validate_string(name.trim(), 1, 255) {
                return Err(Error::InvalidArgument("project name must be 1-255 characters".into()));
            }
            let project = manager.create_project(&name, &desc, owner.as_deref())?;
            println!("Added project {} ({})", project.id, project.name);
        }
        ProjectAction::List { mine, all } => {
            let projects: Vec<&Project> = if mine {
                manager.get_my_projects()
            } else {
                manager.store().get_all_projects()
            };
            let shown: Vec<&Project> = projects
                .into_iter()
                .filter(|p| all || !p.archived)
                .take(config.items_per_page)
                .collect();
            print_projects(&shown, manager);
        }
        ProjectAction::Show { id } => {
            let store = manager.store();
            let project = store.get_project(id).ok_or_else(|| project_not_found(id))?;
            println!("ID:          {}", project.id);
            println!("Name:        {}", project.name);
            println!("Description: {}", project.description);
            println!("Owner:       {}", project.owner);
            println!("Members:     {}", project.members.join(", "));
            println!("Created:     {}", format_date(project.created_at, &config.date_format));
            println!("Archived:    {}", project.archived);
            println!("Completion:  {:.1}%", project.completion_rate(store.tasks()));
            println!();
            let tasks = store.project_tasks(id).unwrap_or_default();
            print_table(&tasks);
        }
        ProjectAction::Delete { id } => {
            if !manager.delete_project(id)? {
                return Err(project_not_found(id));
            }
            println!("Deleted project {id}");
        }
        ProjectAction::Archive { id } => {
            if !manager.archive_project(id)? {
                return Err(project_not_found(id));
            }
            println!("Archived project {id}");
        }
        ProjectAction::Unarchive { id } => {
            if !manager.unarchive_project(id)? {
                return Err(project_not_found(id));
            }
            println!("Unarchived project {id}");
        }
        ProjectAction::AddMember { id, member } => {
            if !manager.add_team_member_to_project(id, &member)? {
                return Err(project_not_found(id));
            }
            println!("Added {member} to project {id}");
        }
    }
    Ok(())
}

pub fn cmd_task(manager: &mut TaskManager, config: &Config, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Add { title, project, desc, priority, due, tags, parent } => {
            if !validate_string(title.trim(), 1, 255) {
                return Err(Error::InvalidArgument("task title must be 1-255 characters".into()));
            }
            let due_date = match due {
                Some(raw) => {
                    let today = Local::now().date_naive();
                    let date = match parse_due_input(&raw, today) {
                        Some(d) => d,
                        None => parse_date(&raw)?,
                    };
                    Some(start_of_day_utc(date))
                }
                None => None,
            };
            let created = match parent {
                Some(parent_id) => manager
                    .store_mut()
                    .create_subtask(parent_id, &title, &desc, priority)?
                    .ok_or_else(|| task_not_found(parent_id))?,
                None => {
                    let project = project
                        .ok_or_else(|| Error::InvalidArgument("--project or --parent is required".into()))?;
                    manager
                        .create_task(&title, &desc, project, priority)?
                        .ok_or_else(|| project_not_found(project))?
                }
            };
            if due_date.is_some() || !tags.is_empty() {
                let patch = TaskPatch {
                    due_date: due_date.map(Some),
                    tags: (!tags.is_empty()).then(|| split_and_normalise_tags(&tags)),
                    ..Default::default()
                };
                manager.store_mut().update_task(created.id, patch)?;
            }
            println!("Added task {}", created.id);
        }
        TaskAction::List { mine, priority, status, tag, urgent, due_today } => {
            let filter = TaskFilter {
                mine,
                urgent,
                due_today,
                priority,
                status,
                tag,
            };
            let shown: Vec<&Task> = manager
                .list_tasks(&filter)
                .into_iter()
                .take(config.items_per_page)
                .collect();
            print_table(&shown);
        }
        TaskAction::Start { id } => {
            if !manager.start_task(id)? {
                return Err(task_not_found(id));
            }
            println!("Started task {id}");
        }
        TaskAction::Complete { id } => {
            if !manager.complete_task(id)? {
                return Err(task_not_found(id));
            }
            println!("Completed task {id}");
        }
        TaskAction::Assign { id, user } => {
            if !manager.assign_task(id, &user)? {
                return Err(task_not_found(id));
            }
            println!("Assigned task {id} to {user}");
        }
        TaskAction::Tag { id, tag } => {
            if !manager.tag_task(id, &tag)? {
                return Err(task_not_found(id));
            }
            println!("Tagged task {id}");
        }
        TaskAction::Comment { id, text } => {
            if !manager.add_task_comment(id, &text)? {
                return Err(task_not_found(id));
            }
            println!("Commented on task {id}");
        }
        TaskAction::Log { id, hours } => {
            if !manager.log_task_time(id, hours)? {
                return Err(task_not_found(id));
            }
            println!("Logged {hours}h on task {id}");
        }
        TaskAction::Delete { id } => {
            if !manager.delete_task(id)? {
                return Err(task_not_found(id));
            }
            println!("Deleted task {id}");
        }
        TaskAction::Search { keyword } => {
            let found = manager.search_tasks(&keyword);
            print_table(&found);
        }
    }
    Ok(())
}

pub fn cmd_stats(manager: &TaskManager, project_id: u64) -> Result<()> {
    let stats = manager
        .get_project_stats(project_id)
        .ok_or_else(|| project_not_found(project_id))?;
    println!("{} Statistics:", stats.project_name);
    println!("   Total tasks: {}", stats.total_tasks);
    println!("   Completed: {}", stats.completed_tasks);
    println!("   In progress: {}", stats.in_progress_tasks);
    println!("   To do: {}", stats.todo_tasks);
    println!("   Completion: {:.1}%", stats.completion_percentage);
    println!("   Team size: {}", stats.team_size);
    Ok(())
}

pub fn cmd_overdue(manager: &TaskManager, config: &Config) {
    let overdue = manager.get_overdue_tasks();
    if config.notifications.enabled && config.notifications.notify_overdue && !overdue.is_empty() {
        tracing::info!(count = overdue.len(), channel = %config.notifications.channel, "overdue tasks");
    }
    print_table(&overdue);
}

pub fn cmd_config(config: &Config) -> Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Walk through a small two-project team setup and report on it.
pub fn cmd_demo(manager: &mut TaskManager) -> Result<()> {
    manager.set_current_user("alice");

    let website = manager.create_project(
        "Website Redesign",
        "Redesign the company website with modern UI/UX",
        Some("alice"),
    )?;
    let mobile = manager.create_project(
        "Mobile App Development",
        "Develop a mobile app for task tracking",
        Some("bob"),
    )?;
    println!("Created project: {} (ID: {})", website.name, website.id);
    println!("Created project: {} (ID: {})", mobile.name, mobile.id);

    let plan = [
        ("Design mockups", "Create UI mockups for the homepage", website.id, Priority::High),
        ("Set up development environment", "Install toolchain and configure build tools", website.id, Priority::Medium),
        ("Fix responsive design issues", "Ensure the website works on mobile devices", website.id, Priority::Critical),
        ("Design database schema", "Plan the database structure for the mobile app", mobile.id, Priority::High),
        ("Implement user authentication", "Add login and registration functionality", mobile.id, Priority::Critical),
    ];
    let mut ids = Vec::new();
    for (title, desc, project, priority) in plan {
        if let Some(task) = manager.create_task(title, desc, project, priority)? {
            println!("Created task: {}", task.title);
            ids.push(task.id);
        }
    }

    manager.add_team_member_to_project(website.id, "bob")?;
    manager.add_team_member_to_project(website.id, "charlie")?;
    manager.add_team_member_to_project(mobile.id, "alice")?;

    if let [design, setup, _, schema, ..] = ids[..] {
        manager.assign_task(design, "bob")?;
        manager.start_task(design)?;
        manager.assign_task(setup, "charlie")?;
        manager.assign_task(schema, "bob")?;
        manager.start_task(schema)?;
    }
    println!();

    for project in [website.id, mobile.id] {
        cmd_stats(manager, project)?;
        println!();
    }

    println!("All Tasks:");
    print_table(&manager.store().get_all_tasks());
    println!();

    let urgent = manager.get_high_priority_tasks();
    println!("High Priority Tasks ({}):", urgent.len());
    for task in urgent {
        println!("   - {}", task.title);
    }

    let mine = manager.get_my_tasks();
    println!("alice's Tasks ({}):", mine.len());
    for task in mine {
        println!("   - {}", task.title);
    }
    let my_projects = manager.get_my_projects();
    println!("alice's Projects ({}):", my_projects.len());
    for project in my_projects {
        println!("   - {}", project.name);
    }
    tracing::debug!(at = %Utc::now(), "demo finished");
    Ok(())
}
