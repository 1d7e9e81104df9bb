use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "board", author, version, about = "Project and task board", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage projects
    ///
    /// Example: board project add "Launch"
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Manage tasks of a project (defaults to the active project)
    ///
    /// Example: board task add "Write docs"
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Count tasks per status
    ///
    /// Example: board counts
    /// Example: board counts --project 1
    Counts {
        #[command(flatten)]
        target: ProjectTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project and make it active
    ///
    /// Example: board project add "Launch"
    Add { name: Option<String> },
    /// List projects in creation order
    ///
    /// Example: board project list
    List,
    /// Make a project active
    ///
    /// Example: board project select 1
    Select { id: String },
    /// Delete a project and all of its tasks
    ///
    /// Example: board project delete 1
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task in the todo column
    ///
    /// Example: board task add "Write docs"
    Add {
        title: Option<String>,
        #[command(flatten)]
        target: ProjectTarget,
    },
    /// List tasks, optionally a single column
    ///
    /// Example: board task list --status in-progress
    List {
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
        #[command(flatten)]
        target: ProjectTarget,
    },
    /// Move a task to another column (todo, in-progress, done)
    ///
    /// Example: board task status 101 done
    Status {
        id: String,
        status: String,
        #[command(flatten)]
        target: ProjectTarget,
    },
    /// Delete a task
    ///
    /// Example: board task delete 101
    Delete {
        id: String,
        #[command(flatten)]
        target: ProjectTarget,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ProjectTarget {
    /// Project id (defaults to the active project)
    #[arg(long = "project", value_name = "ID")]
    pub project: Option<String>,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

/// Collects `--config-override` values from raw arguments before clap runs,
/// so that aliases and store options are known up front.
pub fn scan_config_overrides(args: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            values.push(value.to_string());
        }
    }
    values
}

/// Splits an interactive line into arguments, honouring double quotes.
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err("unterminated quote in command".to_string());
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ProjectCommand, TaskCommand, scan_config_overrides, split_command_line};
    use clap::Parser;

    #[test]
    fn parses_task_status_with_project_flag() {
        let cli = Cli::try_parse_from(["board", "task", "status", "101", "done", "--project", "1"])
            .unwrap();

        match cli.command {
            Command::Task {
                action: TaskCommand::Status { id, status, target },
            } => {
                assert_eq!(id, "101");
                assert_eq!(status, "done");
                assert_eq!(target.project.as_deref(), Some("1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["board", "project", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Project {
                action: ProjectCommand::List
            }
        ));
    }

    #[test]
    fn scan_config_overrides_reads_both_forms() {
        let args: Vec<String> = [
            "project",
            "list",
            "--config-override",
            "creation_delay_ms=0",
            "--config-override=alias.ls=project list",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        assert_eq!(
            scan_config_overrides(&args),
            vec!["creation_delay_ms=0", "alias.ls=project list"]
        );
    }

    #[test]
    fn split_command_line_honours_quotes() {
        let args = split_command_line(r#"task add "Write the \"launch\" plan" --project 1"#).unwrap();
        assert_eq!(
            args,
            vec!["task", "add", "Write the \"launch\" plan", "--project", "1"]
        );
    }

    #[test]
    fn split_command_line_keeps_empty_quoted_argument() {
        let args = split_command_line(r#"project add """#).unwrap();
        assert_eq!(args, vec!["project", "add", ""]);
    }

    #[test]
    fn split_command_line_rejects_unterminated_quote() {
        let err = split_command_line(r#"task add "oops"#).unwrap_err();
        assert!(err.contains("unterminated quote"));
    }
}
