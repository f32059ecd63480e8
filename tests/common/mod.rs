#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use hbase_pouch::proto::{TGet, TNamespaceDescriptor, TPut, TResult, TScan, TTableDescriptor};
use hbase_pouch::{Backend, MemoryBackend};
use tonic::{async_trait, Code, Status};

pub const TABLE: &str = "sha256";

/// Wraps a `MemoryBackend` and bends its answers the ways a real server might.
#[derive(Default)]
pub struct FakeBackend {
    pub inner: MemoryBackend,
    pub scan_calls: AtomicUsize,
    /// Keys whose batched read comes back as a result with no row key.
    pub nil_rows: Vec<String>,
    /// Keys left out of batched read answers entirely.
    pub omitted: Vec<String>,
    /// Return batched read results in reverse request order.
    pub reverse: bool,
    /// Every write fails with this code.
    pub fail_writes: Option<Code>,
    /// Scan pages ignore their start row.
    pub stuck_scan: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            inner: MemoryBackend::new().with_table(TABLE),
            ..Default::default()
        }
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<(), Status> {
        match self.fail_writes {
            Some(code) => Err(Status::new(code, "write rejected")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get(&self, table: &[u8], get: TGet) -> Result<TResult, Status> {
        self.inner.get(table, get).await
    }

    async fn get_multiple(&self, table: &[u8], gets: Vec<TGet>) -> Result<Vec<TResult>, Status> {
        let mut results = Vec::new();
        for get in gets {
            let key = String::from_utf8(get.row.clone()).unwrap();
            if self.omitted.contains(&key) {
                continue;
            }
            if self.nil_rows.contains(&key) {
                results.push(TResult::default());
                continue;
            }
            results.push(self.inner.get(table, get).await?);
        }
        if self.reverse {
            results.reverse();
        }
        Ok(results)
    }

    async fn put(&self, table: &[u8], put: TPut) -> Result<(), Status> {
        self.check_writes()?;
        self.inner.put(table, put).await
    }

    async fn put_multiple(&self, table: &[u8], puts: Vec<TPut>) -> Result<(), Status> {
        self.check_writes()?;
        self.inner.put_multiple(table, puts).await
    }

    async fn scan_page(&self, table: &[u8], mut scan: TScan, page_size: i32) -> Result<Vec<TResult>, Status> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        if self.stuck_scan {
            scan.start_row = None;
        }
        self.inner.scan_page(table, scan, page_size).await
    }

    async fn create_namespace(&self, descriptor: TNamespaceDescriptor) -> Result<(), Status> {
        self.inner.create_namespace(descriptor).await
    }

    async fn create_table(&self, descriptor: TTableDescriptor, split_keys: Vec<Vec<u8>>) -> Result<(), Status> {
        self.inner.create_table(descriptor, split_keys).await
    }
}

/// Writes `key -> value` straight into the store, skipping the session.
pub async fn preload(backend: &FakeBackend, rows: &[(&str, &str)]) {
    let puts = rows
        .iter()
        .map(|(k, v)| TPut {
            row: k.as_bytes().to_vec(),
            column_values: vec![hbase_pouch::codec::column_value(v)],
        })
        .collect();
    backend.inner.put_multiple(TABLE.as_bytes(), puts).await.unwrap();
}
