mod cli;

use board_core::config::{self, Config};
use board_core::error::AppError;
use board_core::logging;
use board_core::model::{Project, Task, TaskStatus};
use board_core::storage::JsonFileStore;
use board_core::store::ProjectStore;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::{Cli, Command, ProjectCommand, ProjectTarget, TaskCommand};
use std::io::{self, BufRead};
use tabled::{Table, Tabled};

type Board = ProjectStore<JsonFileStore>;

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "")]
    marker: &'static str,
    id: String,
    name: String,
    todo: usize,
    #[tabled(rename = "in-progress")]
    in_progress: usize,
    done: usize,
}

#[derive(Tabled)]
struct TaskRow {
    id: String,
    title: String,
    status: &'static str,
}

fn print_projects_plain(board: &Board) {
    if board.list_projects().is_empty() {
        println!("No projects.");
        return;
    }

    let active = board.active_project_id();
    let rows = board.list_projects().iter().map(|project| {
        let counts = board.task_counts(project.id.as_str());
        ProjectRow {
            marker: if active == Some(&project.id) { "*" } else { "" },
            id: project.id.to_string(),
            name: project.name.clone(),
            todo: counts.todo,
            in_progress: counts.in_progress,
            done: counts.done,
        }
    });
    println!("{}", Table::new(rows));
}

fn print_projects_json(board: &Board) {
    let json = serde_json::json!({
        "activeProjectId": board.active_project_id(),
        "projects": board.list_projects(),
    });
    println!("{}", json);
}

fn print_tasks_plain(project: &Project, tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks in {} ({}).", project.name, project.id);
        return;
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id.to_string(),
        title: task.title.clone(),
        status: task.status.label(),
    });
    println!("{}", Table::new(rows));
}

fn print_task_json(project: &Project, task: &Task) {
    let json = serde_json::json!({
        "projectId": project.id,
        "id": task.id,
        "title": task.title,
        "status": task.status,
    });
    println!("{}", json);
}

fn print_outcome_json(action: &str, id: &str, changed: bool) {
    let json = serde_json::json!({
        "action": action,
        "id": id,
        "changed": changed,
    });
    println!("{}", json);
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// The explicit `--project` id, else the active project.
fn resolve_project<'a>(board: &'a Board, target: &ProjectTarget) -> Result<&'a Project, AppError> {
    match target.project.as_deref() {
        Some(id) => {
            if id.trim().is_empty() {
                return Err(AppError::validation("id is required"));
            }
            board
                .project(id)
                .ok_or_else(|| AppError::validation(format!("project {id} not found")))
        }
        None => board
            .active_project()
            .ok_or_else(|| AppError::validation("no active project")),
    }
}

fn run_project_command(board: &mut Board, action: ProjectCommand, json: bool) -> Result<(), AppError> {
    match action {
        ProjectCommand::Add { name } => {
            let name = name.unwrap_or_default();
            let id = board.add_project(&name)?;
            let project = board
                .project(id.as_str())
                .ok_or_else(|| AppError::invalid_data("created project missing"))?;
            if json {
                println!("{}", serde_json::json!(project));
            } else {
                println!("Added project: {} ({})", project.name, project.id);
            }
        }
        ProjectCommand::List => {
            if json {
                print_projects_json(board);
            } else {
                print_projects_plain(board);
            }
        }
        ProjectCommand::Select { id } => {
            let changed = board.select_project(&id)?;
            if json {
                print_outcome_json("select", &id, changed);
            } else if let Some(project) = board.active_project().filter(|_| changed) {
                println!("Selected project: {} ({})", project.name, project.id);
            } else {
                println!("Project not found: {id} (nothing changed)");
            }
        }
        ProjectCommand::Delete { id } => {
            let changed = board.delete_project(&id)?;
            if json {
                print_outcome_json("delete_project", &id, changed);
            } else if changed {
                println!("Deleted project: {id}");
            } else {
                println!("Project not found: {id} (nothing changed)");
            }
        }
    }

    Ok(())
}

fn run_task_command(board: &mut Board, action: TaskCommand, json: bool) -> Result<(), AppError> {
    match action {
        TaskCommand::Add { title, target } => {
            let project_id = resolve_project(board, &target)?.id.clone();
            let title = title.unwrap_or_default();
            let task_id = board.add_task(project_id.as_str(), &title)?;

            let project = board
                .project(project_id.as_str())
                .ok_or_else(|| AppError::invalid_data("project missing after add"))?;
            let task = project
                .task(task_id.as_str())
                .ok_or_else(|| AppError::invalid_data("created task missing"))?;
            if json {
                print_task_json(project, task);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        TaskCommand::List { status, target } => {
            let filter = status
                .as_deref()
                .map(str::parse::<TaskStatus>)
                .transpose()?;
            let project = resolve_project(board, &target)?;
            let tasks: Vec<&Task> = match filter {
                Some(status) => board.tasks_with_status(project.id.as_str(), status),
                None => project.tasks.iter().collect(),
            };
            if json {
                println!("{}", serde_json::json!(tasks));
            } else {
                print_tasks_plain(project, &tasks);
            }
        }
        TaskCommand::Status { id, status, target } => {
            let project_id = resolve_project(board, &target)?.id.clone();
            let changed = board.set_task_status_str(project_id.as_str(), &id, &status)?;
            if json {
                print_outcome_json("status", &id, changed);
            } else if changed {
                let status = status.parse::<TaskStatus>()?;
                println!("Moved task {id} to {status}");
            } else {
                println!("Task not found: {id} (nothing changed)");
            }
        }
        TaskCommand::Delete { id, target } => {
            let project_id = resolve_project(board, &target)?.id.clone();
            let changed = board.delete_task(project_id.as_str(), &id)?;
            if json {
                print_outcome_json("delete_task", &id, changed);
            } else if changed {
                println!("Deleted task: {id}");
            } else {
                println!("Task not found: {id} (nothing changed)");
            }
        }
    }

    Ok(())
}

fn run_command(board: &mut Board, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Project { action } => run_project_command(board, action, cli.json),
        Command::Task { action } => run_task_command(board, action, cli.json),
        Command::Counts { target } => {
            let project = resolve_project(board, &target)?;
            let counts = board.task_counts(project.id.as_str());
            if cli.json {
                println!("{}", serde_json::json!(counts));
            } else {
                println!(
                    "{} ({}): todo {} | in-progress {} | done {}",
                    project.name, project.id, counts.todo, counts.in_progress, counts.done
                );
            }
            Ok(())
        }
    }
}

/// `Ok(None)` when clap already printed help or version output.
fn parse_line(config: &Config, args: Vec<String>) -> Result<Option<Cli>, AppError> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("board".to_string());
    argv.extend(config.expand_alias(args));

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) if is_informational(&err) => {
            err.print()?;
            Ok(None)
        }
        Err(err) => Err(normalize_parse_error(err)),
    }
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn run_interactive(board: &mut Board, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match cli::split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", AppError::validation(err));
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let parsed = match parse_line(config, args) {
            Ok(Some(cli)) => cli,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if !parsed.config_override.is_empty() {
            tracing::warn!("config overrides only apply when the session starts");
        }

        if let Err(err) = run_command(board, parsed) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn load_config(args: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    let overrides = config::collect_overrides(&cli::scan_config_overrides(args))?;
    let merged = config::merge_overrides(&loaded.config, &overrides);

    logging::init_logging(merged.log_level.as_deref());
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "config ignored, using defaults");
    }
    Ok(merged)
}

fn open_board(config: &Config) -> Result<Board, AppError> {
    let backend = JsonFileStore::open_default()?;
    ProjectStore::open(backend, config.store_options())
}

fn run() -> Result<(), AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(&args)?;

    if args.is_empty() {
        let mut board = open_board(&config)?;
        return run_interactive(&mut board, &config);
    }

    let Some(parsed) = parse_line(&config, args)? else {
        return Ok(());
    };
    let mut board = open_board(&config)?;
    run_command(&mut board, parsed)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
