use std::env;

#[derive(Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub sql_echo: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5000);

        let sqlite_path = env::var("SQLITE_PATH").unwrap_or_else(|_| "./blogly.sqlite".to_string());
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(5);

        let sql_echo = env::var("SQL_ECHO")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            server_host,
            server_port,
            sqlite_path,
            database_url,
            max_connections,
            sql_echo,
        }
    }

    /// Connection string for the store. `DATABASE_URL` wins over `SQLITE_PATH`.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}?mode=rwc", path)
    }

    pub fn is_memory(&self) -> bool {
        self.database_url().contains(":memory:")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sqlite_path: &str, database_url: Option<&str>) -> AppConfig {
        AppConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            sqlite_path: sqlite_path.to_string(),
            database_url: database_url.map(str::to_string),
            max_connections: 5,
            sql_echo: false,
        }
    }

    #[test]
    fn plain_path_becomes_sqlite_url() {
        let cfg = config("/tmp/blogly.sqlite", None);
        assert_eq!(cfg.database_url(), "sqlite:///tmp/blogly.sqlite?mode=rwc");
        assert!(!cfg.is_memory());
    }

    #[test]
    fn database_url_overrides_path() {
        let cfg = config("/tmp/ignored.sqlite", Some("sqlite::memory:"));
        assert_eq!(cfg.database_url(), "sqlite::memory:");
        assert!(cfg.is_memory());
    }

    #[test]
    fn prefixed_path_is_kept() {
        let cfg = config("sqlite:data.db", None);
        assert_eq!(cfg.database_url(), "sqlite:data.db");
    }

    #[test]
    fn flags() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("ON"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
