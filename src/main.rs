use chrono::Local;
use clap::Parser;
use courtlens::config::{Cli, Command, DbAction, DbArgs, ServeArgs};
use courtlens::selection::{self, Selection, Selections, MAX_SELECTIONS};
use courtlens::serve::{self, App};
use courtlens::{format_specification_title, Authenticator, Database, ImportData};
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Load .env before clap reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("courtlens={},info", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ignored = cli.db.ignored_network_settings();
    if !ignored.is_empty() {
        warn!(settings = ?ignored, "database network settings have no effect on the embedded store");
    }

    match cli.command {
        Command::Serve(args) => run_serve(&cli.db, args),
        Command::Encode { selections } => run_encode(&selections),
        Command::Decode { token } => run_decode(&token),
        Command::Title { court, judge, charge } => {
            let db = open_db(&cli.db);
            println!("{}", format_specification_title(court, judge, charge, None, &db));
        }
        Command::Db { action } => handle_db_action(&cli.db, action),
    }
}

fn open_db(args: &DbArgs) -> Database {
    let path = args.database_path();
    match Database::open_at(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_serve(db_args: &DbArgs, args: ServeArgs) {
    let auth = match Authenticator::new(args.auth.password, args.auth.jwt_secret, args.auth.jwt_expiry_seconds) {
        Ok(auth) => auth,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(open_db(db_args), auth);
    if let Err(e) = serve::start(app, &args.bind, args.port, args.open) {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn run_encode(pairs: &[String]) {
    if pairs.len() > MAX_SELECTIONS {
        eprintln!("At most {} selections are allowed", MAX_SELECTIONS);
        std::process::exit(1);
    }

    let mut slots = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match parse_selection(pair) {
            Ok(s) => slots.push(s),
            Err(e) => {
                eprintln!("Invalid selection '{}': {}", pair, e);
                std::process::exit(1);
            }
        }
    }

    // Length was checked above
    let selections = Selections::from_slots(slots).unwrap_or_default();
    println!("{}", selection::encode(&selections));
}

/// `type:id`, with `-` for a null slot and either side left blank for null
fn parse_selection(s: &str) -> Result<Option<Selection>, String> {
    if s == "-" {
        return Ok(None);
    }

    let (kind, value) = s.split_once(':').ok_or("expected type:id")?;
    let kind = if kind.is_empty() { None } else { Some(kind.parse()?) };
    let value = if value.is_empty() {
        None
    } else {
        Some(value.parse::<i32>().map_err(|e| e.to_string())?)
    };
    Ok(Some(Selection { kind, value }))
}

fn run_decode(token: &str) {
    let selections = selection::decode(token);
    match serde_json::to_string_pretty(&selections) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing selections: {}", e),
    }
    let filter = selections.filter();
    if filter.is_global() {
        eprintln!("(no valid selections: global results)");
    }
}

fn handle_db_action(args: &DbArgs, action: DbAction) {
    match action {
        DbAction::Import { file } => {
            let data: ImportData = match std::fs::read_to_string(&file)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(data) => data,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            };

            let db = open_db(args);
            match db.import(&data) {
                Ok(n) => println!(
                    "Imported {} courts, {} judges, {} charges, {} bail decisions",
                    data.courts.len(),
                    data.judges.len(),
                    data.charges.len(),
                    n
                ),
                Err(e) => {
                    eprintln!("Import failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        DbAction::Charges => {
            let db = open_db(args);
            match db.charges() {
                Ok(charges) => {
                    if charges.is_empty() {
                        println!("No charges found.");
                    } else {
                        println!("{:<6} {:<10} {}", "ID", "SEVERITY", "NAME");
                        println!("{}", "-".repeat(60));
                        for c in charges {
                            println!("{:<6} {:<10} {}", c.charge_id, c.severity.unwrap_or_default(), c.name);
                        }
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        DbAction::Summary => {
            let db = open_db(args);
            match db.summary() {
                Ok(s) => {
                    println!("Courts:         {}", s.courts);
                    println!("Judges:         {}", s.judges);
                    println!("Charges:        {}", s.charges);
                    println!("Bail decisions: {}", s.bail_decisions);
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        DbAction::Backup { output } => {
            let db_path = args.database_path();
            if !db_path.exists() {
                eprintln!("No database found at {}", db_path.display());
                return;
            }

            let backup_path = output.unwrap_or_else(|| {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("courtlens_backup_{}.db", timestamp))
            });

            match std::fs::copy(&db_path, &backup_path) {
                Ok(bytes) => {
                    println!("Backup created: {} ({} bytes)", backup_path.display(), bytes);
                }
                Err(e) => {
                    eprintln!("Failed to create backup: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
