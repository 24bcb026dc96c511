use log::{info, warn, LevelFilter};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::AppConfig;

/// Opens the store and makes sure the schema exists.
pub async fn connect_db(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    if !config.is_memory() {
        ensure_sqlite_path(config);
    }
    let url = config.database_url();
    let mut opts = ConnectOptions::new(url.clone());
    // every in-memory connection is its own database
    let max_connections = if config.is_memory() { 1 } else { config.max_connections };
    opts.max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(config.sql_echo)
        .sqlx_logging_level(LevelFilter::Info);

    let db = Database::connect(opts).await?;
    init_sqlite_schema(&db).await?;
    info!("store ready at {}", url);
    Ok(db)
}

pub async fn close_db(db: DatabaseConnection) {
    match db.close().await {
        Ok(()) => info!("store closed"),
        Err(e) => warn!("store close failed: {}", e),
    }
}

fn ensure_sqlite_path(config: &AppConfig) {
    let raw = config.database_url();
    let raw = raw.split('?').next().unwrap_or_default();
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = OpenOptions::new().create(true).append(true).open(path);
}

async fn init_sqlite_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = include_str!("../schema-sqlite.sql");
    for stmt in split_sql(sql) {
        db.execute(Statement::from_string(backend, stmt)).await?;
    }
    Ok(())
}

fn split_sql(input: &str) -> Vec<String> {
    let mut buf = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }
        buf.push_str(line);
        buf.push('\n');
    }
    buf.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
