//! # Taskdeck Core Library
//!
//! Task tracking with recurring templates: Daily/Weekly templates spawn dated
//! instances through three independent paths (creation, completion-triggered
//! rollover, and a minute-granularity background sweep), all converging on a
//! one-instance-per-template-per-day guarantee backed by the storage layer.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Task/project entities, DTOs, and the template/instance/one-off classification
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: Pure recurrence decisions (day windows, minute gate, next occurrence)
//! - [`scheduler`]: The sweep pass and its start/stop service wrapper
//! - [`clock`]: Injectable time source
//! - [`query`]: List filters
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use taskdeck_core::{
//!     db,
//!     models::NewTaskData,
//!     models::Recurrence,
//!     recurrence::RecurrencePolicy,
//!     repository::{SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), taskdeck_core::error::CoreError> {
//!     let pool = db::establish_connection("taskdeck.db").await?;
//!     let repo = SqliteRepository::new(pool, RecurrencePolicy::default());
//!
//!     let created = repo
//!         .add_task(NewTaskData {
//!             title: "Weekly report".to_string(),
//!             recurring: Some(Recurrence::Weekly),
//!             recurring_days: vec![1, 3], // Monday, Wednesday
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("created: {}", created.into_task().title);
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod recurrence;
pub mod repository;
pub mod scheduler;
