use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tm", about = concat!("taskmagic v", env!("CARGO_PKG_VERSION"), " - a live dashboard for .ai/ task graphs"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Don't watch for file changes (dashboard only)
    #[arg(long)]
    pub no_watch: bool,

    /// Write logs to this file (dashboard only)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks, filtered and sorted
    List(ListArgs),
    /// Show project statistics
    Stats,
    /// Show task details
    Show(ShowArgs),
    /// Report load warnings, dependency cycles and dangling dependencies
    Check,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks with this status (all, pending, inprogress, completed, failed)
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Sort key (priority, id, status, title)
    #[arg(short, long)]
    pub sort: Option<String>,
    /// Case-insensitive text to match in id, title or description
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID
    pub id: String,
    /// Print the task document instead of a summary
    #[arg(long, conflicts_with = "json")]
    pub raw: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dashboard_flags() {
        let cli = Cli::parse_from(["tm", "-C", "/tmp/p", "--no-watch", "--log-file", "tm.log"]);
        assert!(cli.command.is_none());
        assert!(cli.no_watch);
        assert_eq!(cli.project_dir.as_deref(), Some("/tmp/p"));
        assert_eq!(cli.log_file.as_deref(), Some("tm.log"));
    }

    #[test]
    fn parses_list_options() {
        let cli = Cli::parse_from(["tm", "list", "-f", "pending", "--sort", "id", "--json"]);
        assert!(cli.json);
        match cli.command {
            Some(Commands::List(args)) => {
                assert_eq!(args.filter.as_deref(), Some("pending"));
                assert_eq!(args.sort.as_deref(), Some("id"));
                assert!(args.search.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn raw_and_json_conflict() {
        assert!(Cli::try_parse_from(["tm", "show", "1", "--raw", "--json"]).is_err());
    }
}
