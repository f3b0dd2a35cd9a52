use clap::{Parser, Subcommand};
use taskdeck_core::models::{Recurrence, TaskPriority, TaskStatus};
use uuid::Uuid;

/// Project task tracker with recurring task templates
#[derive(Parser, Debug)]
#[command(name = "taskdeck", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks on the board (instances and one-off tasks)
    List(ListCommand),
    /// List recurring templates
    Templates,
    /// Mark a task as completed
    Done(DoneCommand),
    /// Move a task to another status
    Status(StatusCommand),
    /// Set task progress (0-100)
    Progress(ProgressCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Manage projects
    Project(ProjectCommand),
    /// Run the recurring task sweep
    Sweep(SweepCommand),
}

#[derive(Parser, Debug)]
pub struct AddCommand {
    /// The task title
    pub title: String,
    /// The task description
    #[clap(short, long)]
    pub description: Option<String>,
    /// Deadline: '2025-08-16' or '16-Aug-2025', optionally with ' HH:MM'.
    /// For recurring tasks the time-of-day is when the sweep fires.
    #[clap(long)]
    pub deadline: Option<String>,
    /// Project name
    #[clap(short, long)]
    pub project: Option<String>,
    /// Assignee id
    #[clap(long)]
    pub assignee: Option<Uuid>,
    /// Reporter id
    #[clap(long)]
    pub reporter: Option<Uuid>,
    /// Tags to add to the task
    #[clap(short, long, num_args = 1..)]
    pub tag: Vec<String>,
    /// Subtask titles
    #[clap(long, num_args = 1..)]
    pub subtask: Vec<String>,
    /// The priority of the task (low, medium, high)
    #[clap(long)]
    pub priority: Option<TaskPriority>,
    /// Recurrence cadence: daily or weekly
    #[clap(long)]
    pub every: Option<Recurrence>,
    /// Weekdays for weekly recurrence (e.g. 'mon,wed,fri')
    #[clap(long)]
    pub on: Option<String>,
    /// Module identifier
    #[clap(long)]
    pub module: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    /// Filter by status (todo, in-progress, completed, review)
    #[clap(long)]
    pub status: Option<TaskStatus>,
    /// Filter by priority
    #[clap(long)]
    pub priority: Option<TaskPriority>,
    /// Filter by project name
    #[clap(short, long)]
    pub project: Option<String>,
    /// Filter by assignee id
    #[clap(long)]
    pub assignee: Option<Uuid>,
    /// Filter by tag
    #[clap(short, long)]
    pub tag: Option<String>,
    /// Only tasks due today
    #[clap(long, conflicts_with = "overdue")]
    pub today: bool,
    /// Only overdue tasks
    #[clap(long)]
    pub overdue: bool,
}

#[derive(Parser, Debug)]
pub struct DoneCommand {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Task ID (or unique prefix)
    pub id: String,
    /// New status (todo, in-progress, completed, review)
    pub status: TaskStatus,
}

#[derive(Parser, Debug)]
pub struct ProgressCommand {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Progress percentage, clamped to 0-100
    pub progress: i64,
}

#[derive(Parser, Debug)]
pub struct EditCommand {
    /// Task ID (or unique prefix)
    pub id: String,
    #[clap(long)]
    pub title: Option<String>,
    #[clap(short, long)]
    pub description: Option<String>,
    /// New deadline ('2025-08-16' or '16-Aug-2025', optionally with ' HH:MM')
    #[clap(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,
    /// Remove the deadline
    #[clap(long)]
    pub clear_deadline: bool,
    #[clap(long)]
    pub priority: Option<TaskPriority>,
    /// Change recurrence: daily, weekly, monthly, or 'none' to clear it
    #[clap(long)]
    pub recurring: Option<String>,
    /// Weekdays for weekly recurrence (e.g. 'mon,wed,fri')
    #[clap(long)]
    pub on: Option<String>,
    #[clap(long)]
    pub progress: Option<i64>,
    #[clap(long)]
    pub module: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Add a project
    Add {
        name: String,
        #[clap(short, long)]
        description: Option<String>,
    },
    /// List projects
    List,
    /// Delete a project
    Delete {
        name: String,
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
pub struct SweepCommand {
    /// Run a single sweep pass and exit instead of staying resident
    #[clap(long)]
    pub once: bool,
}
