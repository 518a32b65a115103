use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

/// A single MongoDB client for the lifetime of the process. The driver
/// multiplexes concurrent operations over its own pool, so clones are cheap
/// handles onto the same connections.
#[derive(Clone, Debug)]
pub struct MongoClient {
    client: Client,
    database: Database,
}

impl MongoClient {
    /// Parse `uri` and build the client. No round trip happens here; the
    /// driver connects lazily, use [`MongoClient::ping`] to check reachability.
    pub async fn connect(
        uri: &str,
        database: &str,
        app_name: &str,
    ) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(app_name.to_string());

        let client = Client::with_options(options)?;
        let database = client.database(database);
        tracing::info!(database = %database.name(), app_name = %app_name, "mongodb client created");

        Ok(Self { client, database })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection::<T>(name)
    }

    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    /// Close the client's connections. Waits for in-flight operations
    /// started through any clone of this handle.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("mongodb client shut down");
    }
}
