use std::collections::HashMap;

use log::{debug, error, info, warn};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tonic::{Code, Status};

use crate::backend::{Backend, RpcBackend};
use crate::codec::{self, FAMILY};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::proto::{
    TColumnFamilyDescriptor, TColumnValue, TGet, TNamespaceDescriptor, TPut, TTableDescriptor,
    TTableName,
};
use crate::scan::{ScanCursor, Scanner};

/// A row as returned by reads and scans.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub key: Vec<u8>,
    pub columns: Vec<TColumnValue>,
}

impl Row {
    /// The first cell's value, decoded as text.
    pub fn value(&self) -> Result<String> {
        codec::decode_value(&self.key, &self.columns)
    }

    pub fn key_str(&self) -> String {
        codec::decode_key(&self.key)
    }
}

/// A credentialed connection to one store.
///
/// At most one request is in flight at a time. After [`Session::close`] every
/// call, including ones already waiting for their turn, fails with
/// [`Error::Closed`].
pub struct Session<B = RpcBackend> {
    backend: Mutex<Option<B>>,
    namespace: String,
}

impl Session<RpcBackend> {
    pub async fn open(settings: &Settings) -> Result<Self> {
        let backend = RpcBackend::connect(settings).await?;
        Ok(Session::new(backend, &settings.namespace))
    }
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, namespace: &str) -> Self {
        Session {
            backend: Mutex::new(Some(backend)),
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Releases the connection. Safe to call more than once.
    pub async fn close(&self) {
        if self.backend.lock().await.take().is_some() {
            info!("Session closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.backend.lock().await.is_none()
    }

    /// Waits for the connection. The guard keeps other callers out until the
    /// current exchange finishes.
    pub(crate) async fn connection(&self) -> Result<MappedMutexGuard<'_, B>> {
        MutexGuard::try_map(self.backend.lock().await, |backend| backend.as_mut())
            .map_err(|_| Error::Closed)
    }

    pub async fn get(&self, table: &str, key: &str) -> Result<Row> {
        debug!("GET: {} {}", table, key);
        let get = TGet {
            row: codec::encode_key(key),
            ..Default::default()
        };
        let result = self
            .connection()
            .await?
            .get(table.as_bytes(), get)
            .await
            .map_err(|status| backend_error("error Get", status))?;

        match result.row {
            Some(row) => Ok(Row {
                key: row,
                columns: result.column_values,
            }),
            None => {
                debug!("row {} not found in {}", key, table);
                Err(Error::NotFound(key.to_string()))
            }
        }
    }

    /// Point read returning the decoded value of the row.
    pub async fn get_value(&self, table: &str, key: &str) -> Result<String> {
        self.get(table, key).await?.value()
    }

    pub async fn put(&self, table: &str, key: &str, value: &str) -> Result<()> {
        debug!("PUT: {} {}", table, key);
        let put = TPut {
            row: codec::encode_key(key),
            column_values: vec![codec::column_value(value)],
        };
        self.connection()
            .await?
            .put(table.as_bytes(), put)
            .await
            .map_err(|status| backend_error("error Put", status))
    }

    /// Reads `keys` in one batched exchange.
    ///
    /// Results are matched back by row key, not by position. Keys the backend
    /// leaves out of its answer are absent from the map. A single result
    /// without a row key fails the whole call.
    pub async fn get_multiple<S: AsRef<str>>(
        &self,
        table: &str,
        keys: &[S],
    ) -> Result<HashMap<String, String>> {
        let gets: Vec<TGet> = keys
            .iter()
            .map(|k| TGet {
                row: codec::encode_key(k.as_ref()),
                ..Default::default()
            })
            .collect();
        debug!("GET MULTIPLE: {} rows from {}", gets.len(), table);

        let results = self
            .connection()
            .await?
            .get_multiple(table.as_bytes(), gets)
            .await
            .map_err(|status| backend_error("error GetMultiple", status))?;

        let mut data = HashMap::with_capacity(results.len());
        for result in results {
            let Some(row) = result.row else {
                error!("error GetMultiple: row is nil");
                return Err(Error::PartialFailure {
                    context: "error GetMultiple",
                });
            };
            let value = codec::decode_value(&row, &result.column_values)?;
            data.insert(codec::decode_key(&row), value);
        }

        if data.len() < keys.len() {
            debug!("{} of {} requested rows returned", data.len(), keys.len());
        }
        Ok(data)
    }

    /// Writes every pair in one batched exchange. Pair order is not
    /// significant; any backend error voids the whole batch.
    pub async fn put_multiple(&self, table: &str, data: &HashMap<String, String>) -> Result<()> {
        let puts: Vec<TPut> = data
            .iter()
            .map(|(key, value)| TPut {
                row: codec::encode_key(key),
                column_values: vec![codec::column_value(value)],
            })
            .collect();
        debug!("PUT MULTIPLE: {} rows into {}", puts.len(), table);

        self.connection()
            .await?
            .put_multiple(table.as_bytes(), puts)
            .await
            .map_err(|status| backend_error("error PutMultiple", status))
    }

    /// Lazily scans `cursor` in pages.
    pub fn scan(&self, table: &str, cursor: ScanCursor) -> Scanner<'_, B> {
        Scanner::new(self, table, cursor)
    }

    /// Scans `[start, stop)` to completion. An empty `stop` scans to the end
    /// of the table.
    pub async fn scan_all(&self, table: &str, start: &str, stop: &str, page_size: i32) -> Result<Vec<Row>> {
        let cursor = ScanCursor::new(start.as_bytes(), stop.as_bytes(), page_size)?;
        self.scan(table, cursor).collect_rows().await
    }

    pub async fn create_namespace(&self) -> Result<()> {
        info!("Creating namespace {}", self.namespace);
        let descriptor = TNamespaceDescriptor {
            name: self.namespace.clone(),
        };
        self.connection()
            .await?
            .create_namespace(descriptor)
            .await
            .map_err(|status| backend_error("error CreateNamespace", status))
    }

    /// Creates `table` in the session namespace with the single family that
    /// writes use.
    pub async fn create_table(&self, table: &str) -> Result<()> {
        info!("Creating table {}:{}", self.namespace, table);
        let descriptor = TTableDescriptor {
            table_name: Some(TTableName {
                ns: self.namespace.as_bytes().to_vec(),
                qualifier: table.as_bytes().to_vec(),
            }),
            columns: vec![TColumnFamilyDescriptor {
                name: FAMILY.to_vec(),
            }],
        };
        self.connection()
            .await?
            .create_table(descriptor, Vec::new())
            .await
            .map_err(|status| backend_error("error CreateTable", status))
    }

    /// Creates the namespace and table, treating "already exists" as success.
    pub async fn ensure_table(&self, table: &str) -> Result<()> {
        tolerate_existing(self.create_namespace().await)?;
        tolerate_existing(self.create_table(table).await)
    }
}

/// Logs a failed exchange and classifies it.
pub(crate) fn backend_error(context: &'static str, status: Status) -> Error {
    error!("{}: {}", context, status.message());
    Error::from_status(context, status)
}

fn tolerate_existing(result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Backend { status, .. }) if status.code() == Code::AlreadyExists => {
            warn!("{}", status.message());
            Ok(())
        }
        other => other,
    }
}
