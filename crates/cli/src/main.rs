//! HotelOps CLI - housekeeping and maintenance task desk.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use hotelops_core::{
    format_duration, Clock, CompletionReport, CreateTaskRequest, Priority, StaffId, SystemClock,
    Task, TaskFamily, TaskFilter, TaskId, TaskStatus, TenantId,
};
use hotelops_stats::FamilyStats;
use hotelops_storage::{parse_kind, InMemoryBackend, Snapshot};
use hotelops_view::{urgency, SortOrder};
use hotelops_work::{OperationsConfig, OperationsManager};

#[derive(Parser)]
#[command(name = "hotelops")]
#[command(about = "Hotel housekeeping and maintenance task desk", long_about = None)]
struct Cli {
    /// Snapshot file holding tasks and staff
    #[arg(long, global = true, default_value = "hotelops.json")]
    data: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant (hotel) id, overriding the configuration
    #[arg(long, global = true)]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks of one family
    List {
        /// housekeeping or maintenance
        #[arg(long, default_value = "housekeeping")]
        family: TaskFamily,
        /// Only these statuses (repeatable)
        #[arg(long)]
        status: Vec<TaskStatus>,
        /// Only these priorities (repeatable)
        #[arg(long)]
        priority: Vec<Priority>,
        /// Room number contains
        #[arg(long)]
        room: Option<String>,
        /// Assigned to this staff member
        #[arg(long)]
        staff: Option<StaffId>,
        /// urgency, due-date or status
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Zero-based page
        #[arg(long, default_value = "0")]
        page: usize,
    },
    /// Show dashboard statistics
    Stats,
    /// List staff of one family with their performance
    Staff {
        /// housekeeping or maintenance
        #[arg(long, default_value = "housekeeping")]
        family: TaskFamily,
    },
    /// Show the recent activity feed
    Activity,
    /// Create a task
    Create(CreateArgs),
    /// Assign a task
    Assign {
        /// Task ID
        id: TaskId,
        /// Staff ID; omit with --auto
        staff: Option<StaffId>,
        /// Pick the least loaded qualified staff member
        #[arg(long)]
        auto: bool,
    },
    /// Start a task
    Start {
        /// Task ID
        id: TaskId,
        /// Start as this staff member, self-assigning if pending
        #[arg(long)]
        by: Option<StaffId>,
    },
    /// Put a task in progress on hold
    Hold {
        /// Task ID
        id: TaskId,
        /// Why work stopped
        #[arg(long)]
        reason: Option<String>,
        /// Waiting for parts (maintenance only)
        #[arg(long)]
        parts: bool,
    },
    /// Resume a paused task
    Resume {
        /// Task ID
        id: TaskId,
    },
    /// Complete a task
    Complete {
        /// Task ID
        id: TaskId,
        /// Minutes spent
        #[arg(long)]
        duration: Option<u32>,
        /// Money spent (maintenance)
        #[arg(long)]
        cost: Option<f64>,
        /// Parts used (maintenance)
        #[arg(long)]
        parts: Option<String>,
        /// Quality rating 1-5
        #[arg(long)]
        rating: Option<u8>,
        /// Completion notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel a task
    Cancel {
        /// Task ID
        id: TaskId,
        /// Why it was cancelled
        #[arg(long)]
        reason: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: TaskId,
    },
    /// Assign several tasks to one staff member; all or none change
    BulkAssign {
        /// housekeeping or maintenance
        #[arg(long)]
        family: TaskFamily,
        /// Staff ID
        #[arg(long)]
        staff: StaffId,
        /// Task IDs
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
    /// Move several tasks to one status; all or none change
    BulkStatus {
        /// housekeeping or maintenance
        #[arg(long)]
        family: TaskFamily,
        /// Target status
        #[arg(long)]
        status: TaskStatus,
        /// Note added to every task
        #[arg(long)]
        notes: Option<String>,
        /// Task IDs
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
}

#[derive(Args)]
struct CreateArgs {
    /// housekeeping or maintenance
    #[arg(long)]
    family: TaskFamily,
    /// Task type, e.g. "Room Cleaning" or PLUMBING
    #[arg(long)]
    kind: String,
    /// Title
    #[arg(long)]
    title: String,
    /// Description
    #[arg(long, default_value = "")]
    description: String,
    /// LOW, NORMAL, HIGH or URGENT
    #[arg(long, default_value = "NORMAL")]
    priority: Priority,
    /// Due date (RFC 3339)
    #[arg(long)]
    due: String,
    /// Room number
    #[arg(long)]
    room: Option<String>,
    /// Floor number
    #[arg(long)]
    floor: Option<i32>,
    /// Estimated minutes
    #[arg(long, default_value = "30")]
    duration: u32,
    /// Estimated cost (maintenance)
    #[arg(long)]
    cost: Option<f64>,
    /// Equipment (maintenance)
    #[arg(long)]
    equipment: Option<String>,
}

impl CreateArgs {
    fn into_request(self) -> Result<CreateTaskRequest> {
        let due: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.due)
            .map_err(|e| anyhow!("Invalid due date {:?}: {}", self.due, e))?
            .with_timezone(&Utc);
        Ok(CreateTaskRequest {
            description: self.description,
            kind: Some(parse_kind(self.family, &self.kind)?),
            priority: Some(self.priority),
            room_number: self.room,
            floor_number: self.floor,
            equipment_type: self.equipment,
            estimated_duration: self.duration,
            estimated_cost: self.cost,
            due_date: Some(due),
            ..CreateTaskRequest::new(self.family, self.title)
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OperationsConfig::load(path).await?,
        None => OperationsConfig::default(),
    };
    let snapshot = Snapshot::load(&cli.data).await?;
    if let Some(tenant) = cli.tenant.clone() {
        config.tenant_id = tenant;
    } else if let Some(snapshot) = snapshot.as_ref().filter(|s| !s.tenant_id.is_empty()) {
        if cli.config.is_none() {
            config.tenant_id = snapshot.tenant_id.clone();
        }
    }
    let tenant = TenantId::new(config.tenant_id.clone());
    let snapshot = snapshot.unwrap_or_else(|| Snapshot::empty(&tenant));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Arc::new(InMemoryBackend::from_snapshot(&snapshot, Arc::clone(&clock))?);
    let mut manager = OperationsManager::new(backend.clone(), clock, config)?;
    manager.refresh_all().await?;

    let changed = run(&mut manager, cli.command).await?;
    if changed {
        backend.snapshot().await.save(&cli.data).await?;
        info!(path = %cli.data.display(), "Saved snapshot");
    }

    Ok(())
}

async fn run(manager: &mut OperationsManager, command: Commands) -> Result<bool> {
    match command {
        Commands::List { family, status, priority, room, staff, sort, page } => {
            manager.set_filter(
                family,
                TaskFilter {
                    status,
                    priority,
                    room_number: room,
                    assigned_staff_id: staff,
                    ..Default::default()
                },
            );
            if let Some(sort) = sort {
                manager.set_sort(family, sort);
            }
            manager.set_page(family, page);

            let view = manager.view(family);
            let now = manager.store().now();
            println!(
                "{} tasks ({} matching, page {}/{})",
                family,
                view.total_elements,
                view.page + 1,
                view.total_pages.max(1)
            );
            for task in &view.items {
                print_task(task, now);
            }
            Ok(false)
        }
        Commands::Stats => {
            let stats = manager.stats().cloned().unwrap_or_else(|| manager.local_stats());
            print_family_stats("Housekeeping", &stats.servicing, false);
            print_family_stats("Maintenance", &stats.repair, true);
            let overdue = manager.store().overdue_tasks();
            if !overdue.is_empty() {
                println!("Overdue: {}", overdue.len());
            }
            Ok(false)
        }
        Commands::Staff { family } => {
            println!("{} staff", family);
            for staff in manager.staff(family) {
                let perf = manager.staff_performance().iter().find(|p| p.staff_id == staff.id);
                println!(
                    "  {} | {} | {} | open {} | done {} | rating {:.1} | {:.1}h",
                    staff.id,
                    staff.name,
                    if staff.is_active { "active" } else { "inactive" },
                    manager.store().workload(staff.id),
                    perf.map_or(0, |p| p.tasks_completed),
                    perf.map_or(0.0, |p| p.average_rating),
                    perf.map_or(0.0, |p| p.total_hours),
                );
            }
            Ok(false)
        }
        Commands::Activity => {
            for event in manager.recent_activity() {
                println!(
                    "  {} | {} | {} | {}",
                    event.timestamp.format("%Y-%m-%d %H:%M"),
                    event.action.verb(),
                    event.priority,
                    event.description,
                );
            }
            Ok(false)
        }
        Commands::Create(args) => {
            let task = manager.create_task(args.into_request()?).await?;
            println!("Created task: {} - {}", task.id, task.title);
            Ok(true)
        }
        Commands::Assign { id, staff, auto } => {
            let task = match (staff, auto) {
                (Some(staff_id), false) => manager.assign(id, staff_id).await?,
                (None, true) => manager.auto_assign(id).await?,
                _ => return Err(anyhow!("Give either a staff ID or --auto")),
            };
            println!("Assigned {} to staff {}", task.id, fmt_staff(&task));
            Ok(true)
        }
        Commands::Start { id, by } => {
            let task = match by {
                Some(staff_id) => manager.start_by(id, staff_id).await?,
                None => manager.start(id).await?,
            };
            println!("Started {} ({})", task.id, fmt_staff(&task));
            Ok(true)
        }
        Commands::Hold { id, reason, parts } => {
            let task = if parts {
                manager.hold_for_parts(id).await?
            } else {
                manager.hold(id, reason).await?
            };
            println!("{} is {}", task.id, task.status);
            Ok(true)
        }
        Commands::Resume { id } => {
            let task = manager.resume(id).await?;
            println!("{} is {}", task.id, task.status);
            Ok(true)
        }
        Commands::Complete { id, duration, cost, parts, rating, notes } => {
            let report = CompletionReport {
                notes,
                actual_duration: duration,
                actual_cost: cost,
                parts_used: parts,
                rating,
            };
            let task = manager.complete(id, report).await?;
            println!("Completed {}", task.id);
            Ok(true)
        }
        Commands::Cancel { id, reason } => {
            let task = manager.cancel(id, reason).await?;
            println!("{} is {}", task.id, task.status);
            Ok(true)
        }
        Commands::Delete { id } => {
            manager.delete(id).await?;
            println!("Deleted {}", id);
            Ok(true)
        }
        Commands::BulkAssign { family, staff, ids } => {
            let changed = manager.bulk_assign(family, &ids, staff).await?;
            println!("Assigned {} task(s) to staff {}", changed.len(), staff);
            Ok(!changed.is_empty())
        }
        Commands::BulkStatus { family, status, notes, ids } => {
            let changed = manager.bulk_update_status(family, &ids, status, notes).await?;
            println!("Moved {} task(s) to {}", changed.len(), status);
            Ok(!changed.is_empty())
        }
    }
}

fn fmt_staff(task: &Task) -> String {
    task.assigned_staff_id
        .map_or_else(|| "unassigned".to_string(), |id| id.to_string())
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    println!(
        "  {} | {:<17} | {:<6} | {:<8} | {:<6} | {} | due {} | est {}",
        task.id,
        task.status.label(),
        task.priority.label(),
        urgency(task, now),
        task.room_number.as_deref().unwrap_or("-"),
        task.title,
        task.due_date.format("%Y-%m-%d %H:%M"),
        format_duration(task.estimated_duration),
    );
}

fn print_family_stats(title: &str, stats: &FamilyStats, with_cost: bool) {
    println!("{}", title);
    println!("  Total: {}", stats.total_tasks);
    println!("  Pending: {}", stats.pending_tasks);
    println!("  Active: {}", stats.active_tasks);
    println!("  Completed: {} ({}%)", stats.completed_tasks, stats.completion_rate);
    println!("  Staff on tasks: {}", stats.active_staff_count);
    println!("  Average time: {}", format_duration(stats.average_task_time.round() as u32));
    if with_cost {
        println!("  Total cost: {:.2}", stats.total_cost);
        println!("  Average cost: {:.2}", stats.average_cost);
    }
}
