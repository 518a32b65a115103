use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
}

fn default_port() -> u16 { 3000 }
fn default_mongodb_uri() -> String { "mongodb://localhost:27017/?retryWrites=true&w=majority".into() }
fn default_database() -> String { "test".into() }
fn default_collection() -> String { "urls".into() }
fn default_app_name() -> String { "smm-notification".into() }
fn default_storage_backend() -> StorageBackend { StorageBackend::Mongodb }

impl AppConfig {
    /// Read `SMM_NOTIFICATION__*` variables; a plain `PORT` overrides the port.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::Environment::with_prefix("SMM_NOTIFICATION").separator("__"))
            .set_override_option("port", std::env::var("PORT").ok())?;
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_source() {
        let config = AppConfig::from_builder(config::Config::builder()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database, "test");
        assert_eq!(config.collection, "urls");
        assert_eq!(config.storage_backend, StorageBackend::Mongodb);
        assert!(config.mongodb_uri.contains("retryWrites=true"));
        assert!(config.mongodb_uri.contains("w=majority"));
    }

    #[test]
    fn overrides_are_applied() {
        let builder = config::Config::builder()
            .set_override("port", "8081")
            .unwrap()
            .set_override("storage_backend", "memory")
            .unwrap()
            .set_override("collection", "notifications")
            .unwrap();
        let config = AppConfig::from_builder(builder).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.collection, "notifications");
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let builder = config::Config::builder()
            .set_override("storage_backend", "postgres")
            .unwrap();
        assert!(AppConfig::from_builder(builder).is_err());
    }
}
