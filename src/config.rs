use std::env;

use crate::model;

pub const DEFAULT_AUTH_URL: &str = "https://auth.selcdn.ru";

#[derive(Clone, Debug)]
pub struct Config {
    pub auth_url: String,
    pub user: String,
    pub key: String,
    pub container: String,
    pub container_url: Option<String>,
    pub use_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, model::error::StorageError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, model::error::StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            auth_url: lookup("SWIFT_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            user: require(&lookup, "SWIFT_USER")?,
            key: require(&lookup, "SWIFT_KEY")?,
            container: require(&lookup, "SWIFT_CONTAINER")?,
            container_url: lookup("SWIFT_CONTAINER_URL").filter(|url| !url.is_empty()),
            use_cache: flag(&lookup, "SWIFT_CACHE"),
        })
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = container.to_string();
        self
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub name: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}/{}",
            self.user, self.password, self.host, self.name
        )
    }
}

#[derive(Clone, Debug)]
pub struct BackupConfig {
    pub database: DatabaseConfig,
    pub container: String,
    pub debug: bool,
}

impl BackupConfig {
    pub fn from_env() -> Result<Self, model::error::StorageError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, model::error::StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: DatabaseConfig {
                user: require(&lookup, "DB_USER")?,
                password: require(&lookup, "DB_PASSWORD")?,
                host: require(&lookup, "DB_HOST")?,
                name: require(&lookup, "DB_NAME")?,
            },
            container: require(&lookup, "SWIFT_BACKUP_CONTAINER")?,
            debug: flag(&lookup, "DEBUG"),
        })
    }
}

fn require<F>(lookup: &F, name: &str) -> Result<String, model::error::StorageError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| model::error::StorageError::Config(name.to_string()))
}

fn flag<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    matches!(
        lookup(name).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: Vec<(&str, &str)>) -> HashMap<String, String> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn storage_vars() -> HashMap<String, String> {
        vars(vec![
            ("SWIFT_USER", "12345"),
            ("SWIFT_KEY", "secret"),
            ("SWIFT_CONTAINER", "assets"),
        ])
    }

    #[test]
    fn test_config_defaults() {
        let vars = storage_vars();
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.user, "12345");
        assert_eq!(config.key, "secret");
        assert_eq!(config.container, "assets");
        assert_eq!(config.container_url, None);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_config_overrides() {
        let mut vars = storage_vars();
        vars.insert("SWIFT_AUTH_URL".to_string(), "https://auth.test".to_string());
        vars.insert(
            "SWIFT_CONTAINER_URL".to_string(),
            "https://cdn.example.com".to_string(),
        );
        vars.insert("SWIFT_CACHE".to_string(), "1".to_string());

        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.auth_url, "https://auth.test");
        assert_eq!(
            config.container_url,
            Some("https://cdn.example.com".to_string())
        );
        assert!(config.use_cache);
    }

    #[test]
    fn test_config_missing_required() {
        let cases = vec!["SWIFT_USER", "SWIFT_KEY", "SWIFT_CONTAINER"];

        for missing in cases {
            let mut vars = storage_vars();
            vars.remove(missing);

            let result = Config::from_lookup(|name| vars.get(name).cloned());
            match result {
                Err(model::error::StorageError::Config(name)) => {
                    assert_eq!(name, missing, "failed for case: {}", missing);
                }
                other => panic!("expected Config error for {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_with_container() {
        let vars = storage_vars();
        let config = Config::from_lookup(|name| vars.get(name).cloned())
            .unwrap()
            .with_container("backups");

        assert_eq!(config.container, "backups");
    }

    #[test]
    fn test_flag_values() {
        let cases = vec![
            (Some("1"), true),
            (Some("true"), true),
            (Some("yes"), true),
            (Some("0"), false),
            (Some(""), false),
            (None, false),
        ];

        for (value, expected) in cases {
            let result = flag(&|_: &str| value.map(|v| v.to_string()), "DEBUG");
            assert_eq!(result, expected, "failed for case: {:?}", value);
        }
    }

    #[test]
    fn test_backup_config() {
        let vars = vars(vec![
            ("DB_USER", "app"),
            ("DB_PASSWORD", "pw"),
            ("DB_HOST", "db.internal"),
            ("DB_NAME", "appdb"),
            ("SWIFT_BACKUP_CONTAINER", "backups"),
            ("DEBUG", "true"),
        ]);

        let config = BackupConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.database.url(), "postgresql://app:pw@db.internal/appdb");
        assert_eq!(config.container, "backups");
        assert!(config.debug);
    }
}
