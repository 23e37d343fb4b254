//! Command line and environment configuration
//!
//! Every setting can come from a flag or an environment variable; `main`
//! loads a `.env` file first with dotenvy.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_NAME: &str = "test";
pub const DEFAULT_DB_PORT: u16 = 3306;

#[derive(Parser, Debug)]
#[command(name = "courtlens")]
#[command(author, version, about = "Bail decision and cost analytics by court, judge and charge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub db: DbArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the dashboard web server
    Serve(ServeArgs),

    /// Encode selections into a results token, e.g. `court:3 judge:12`
    Encode {
        /// Up to two `type:id` pairs; `-` writes a null slot
        selections: Vec<String>,
    },

    /// Decode a results token
    Decode {
        token: String,
    },

    /// Print the results title for the given IDs (0 = unspecified)
    Title {
        #[arg(long, default_value = "0")]
        court: i32,
        #[arg(long, default_value = "0")]
        judge: i32,
        #[arg(long, default_value = "0")]
        charge: i32,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Load courts, judges, charges and bail decisions from a JSON file
    Import {
        file: PathBuf,
    },

    /// List charges, one per distinct name
    Charges,

    /// Show row counts
    Summary,

    /// Create a backup of the database file
    Backup {
        /// Output path for backup (default: courtlens_backup_<timestamp>.db)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Open the dashboard in a browser once listening
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Shared dashboard password. Leave unset to run without login.
    #[arg(long = "password", env = "NEXT_PUBLIC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Secret for signing login tokens (at least 32 characters)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Login token lifetime in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,
}

/// Database settings.
///
/// Storage is an embedded SQLite file named after `DB_NAME` inside
/// `DATA_DIR`. The host, user, password and port settings are accepted so
/// existing deployment environments parse, but they don't apply to a local
/// file; `main` warns when they are changed from their defaults.
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    #[arg(long = "db-host", env = "DB_HOST", default_value = DEFAULT_DB_HOST, global = true)]
    pub host: String,

    #[arg(long = "db-user", env = "DB_USER", default_value = DEFAULT_DB_USER, global = true)]
    pub user: String,

    #[arg(long = "db-pass", env = "DB_PASS", default_value = "", hide_env_values = true, global = true)]
    pub pass: String,

    #[arg(long = "db-name", env = "DB_NAME", default_value = DEFAULT_DB_NAME, global = true)]
    pub name: String,

    #[arg(id = "db_port", long = "db-port", env = "DB_PORT", default_value_t = DEFAULT_DB_PORT, global = true)]
    pub port: u16,

    /// Directory holding the database file
    #[arg(long = "data-dir", env = "DATA_DIR", default_value = ".", global = true)]
    pub data_dir: PathBuf,
}

impl DbArgs {
    /// `<data_dir>/<name>.db`, or the name as given if it already ends in `.db`
    pub fn database_path(&self) -> PathBuf {
        if self.name.ends_with(".db") || self.name.ends_with(".sqlite") {
            self.data_dir.join(&self.name)
        } else {
            self.data_dir.join(format!("{}.db", self.name))
        }
    }

    /// Network settings changed from their defaults, which have no effect on
    /// the embedded store
    pub fn ignored_network_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.host != DEFAULT_DB_HOST {
            ignored.push("DB_HOST");
        }
        if self.user != DEFAULT_DB_USER {
            ignored.push("DB_USER");
        }
        if !self.pass.is_empty() {
            ignored.push("DB_PASS");
        }
        if self.port != DEFAULT_DB_PORT {
            ignored.push("DB_PORT");
        }
        ignored
    }
}
