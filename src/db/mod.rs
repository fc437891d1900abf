use mongodb::{
    bson::doc,
    error::{Error, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, ClientSession, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

/// Attempts made for one multi-document transaction before the last error
/// is surfaced.
pub const MAX_TRANSACTION_ATTEMPTS: usize = 8;

/// Pause before the n-th retry is `n` times this.
pub const TRANSACTION_BACKOFF: Duration = Duration::from_millis(15);

/// Handle to the service database. Multi-document writes go through
/// [`Database::start_session`]; transactions need a replica set or sharded
/// cluster, a standalone `mongod` rejects them.
#[derive(Clone)]
pub struct Database {
    client: Client,
    database: mongodb::Database,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;

        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
        client_options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(2);
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let database = client.database(&config.mongo_db_name);

        database.run_command(doc! { "ping": 1 }).await?;
        log::info!("Connected to MongoDB database '{}'", config.mongo_db_name);

        Ok(Self { client, database })
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database.collection(collection_name)
    }

    pub async fn start_session(&self) -> AppResult<ClientSession> {
        Ok(self.client.start_session().await?)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Whether the whole transaction may be run again from the start.
pub fn is_transient(err: &Error) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}

/// Commits, retrying the commit alone while the server reports an unknown
/// outcome. Retrying the body instead could apply it twice.
pub async fn commit_with_retry(session: &mut ClientSession) -> Result<(), Error> {
    let mut attempt = 1;
    loop {
        match session.commit_transaction().await {
            Err(err)
                if err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                    && attempt < MAX_TRANSACTION_ATTEMPTS =>
            {
                log::debug!("Commit outcome unknown, retrying: {}", err);
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Best-effort abort. The server may already have aborted the transaction
/// after a failed write, so errors are only logged.
pub async fn abort_quietly(session: &mut ClientSession) {
    if let Err(err) = session.abort_transaction().await {
        log::debug!("Abort of transaction failed: {}", err);
    }
}
