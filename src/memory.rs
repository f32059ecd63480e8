//! In-process ordered store speaking the Backend trait

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use log::debug;
use parking_lot::RwLock;
use tonic::{async_trait, Status};

use crate::backend::Backend;
use crate::proto::{TColumnValue, TGet, TNamespaceDescriptor, TPut, TResult, TScan, TTableDescriptor};

pub const DEFAULT_NAMESPACE: &str = "default";

type Rows = BTreeMap<Vec<u8>, Vec<TColumnValue>>;

/// A `Backend` kept entirely in memory.
///
/// Mirrors the server's behaviour closely enough for tests and offline runs:
/// rows sort by raw bytes, reads of a missing key come back as a result with
/// no row, and writes to a table nobody created are rejected.
pub struct MemoryBackend {
    namespaces: RwLock<BTreeSet<String>>,
    tables: RwLock<BTreeMap<Vec<u8>, Rows>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut namespaces = BTreeSet::new();
        namespaces.insert(DEFAULT_NAMESPACE.to_string());
        MemoryBackend {
            namespaces: RwLock::new(namespaces),
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates `table` directly, bypassing namespace checks.
    pub fn with_table(self, table: &str) -> Self {
        self.tables.write().entry(table.as_bytes().to_vec()).or_default();
        self
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .get(table.as_bytes())
            .map_or(0, |rows| rows.len())
    }

    fn read_row(rows: &Rows, row: &[u8]) -> TResult {
        match rows.get(row) {
            Some(cells) => TResult {
                row: Some(row.to_vec()),
                column_values: cells.clone(),
            },
            None => TResult::default(),
        }
    }

    fn write_row(rows: &mut Rows, put: TPut) {
        let cells = rows.entry(put.row).or_default();
        for value in put.column_values {
            match cells
                .iter_mut()
                .find(|c| c.family == value.family && c.qualifier == value.qualifier)
            {
                Some(existing) => *existing = value,
                None => cells.push(value),
            }
        }
    }
}

fn table_missing(table: &[u8]) -> Status {
    Status::not_found(format!(
        "table {} does not exist",
        String::from_utf8_lossy(table)
    ))
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, table: &[u8], get: TGet) -> Result<TResult, Status> {
        let tables = self.tables.read();
        let rows = tables.get(table).ok_or_else(|| table_missing(table))?;
        Ok(Self::read_row(rows, &get.row))
    }

    async fn get_multiple(&self, table: &[u8], gets: Vec<TGet>) -> Result<Vec<TResult>, Status> {
        let tables = self.tables.read();
        let rows = tables.get(table).ok_or_else(|| table_missing(table))?;
        Ok(gets.iter().map(|g| Self::read_row(rows, &g.row)).collect())
    }

    async fn put(&self, table: &[u8], put: TPut) -> Result<(), Status> {
        let mut tables = self.tables.write();
        let rows = tables.get_mut(table).ok_or_else(|| table_missing(table))?;
        Self::write_row(rows, put);
        Ok(())
    }

    async fn put_multiple(&self, table: &[u8], puts: Vec<TPut>) -> Result<(), Status> {
        let mut tables = self.tables.write();
        let rows = tables.get_mut(table).ok_or_else(|| table_missing(table))?;
        debug!("Writing {} rows", puts.len());
        for put in puts {
            Self::write_row(rows, put);
        }
        Ok(())
    }

    async fn scan_page(&self, table: &[u8], scan: TScan, page_size: i32) -> Result<Vec<TResult>, Status> {
        if page_size <= 0 {
            return Err(Status::invalid_argument("number of rows must be positive"));
        }
        let tables = self.tables.read();
        let rows = tables.get(table).ok_or_else(|| table_missing(table))?;

        let start = scan.start_row.unwrap_or_default();
        let stop = scan.stop_row.filter(|s| !s.is_empty());
        if let Some(stop) = &stop {
            if start >= *stop {
                return Ok(Vec::new());
            }
        }
        let upper = match &stop {
            Some(stop) => Bound::Excluded(stop.as_slice()),
            None => Bound::Unbounded,
        };

        let page = rows
            .range::<[u8], _>((Bound::Included(start.as_slice()), upper))
            .take(page_size as usize)
            .map(|(row, cells)| TResult {
                row: Some(row.clone()),
                column_values: cells.clone(),
            })
            .collect();
        Ok(page)
    }

    async fn create_namespace(&self, descriptor: TNamespaceDescriptor) -> Result<(), Status> {
        if !self.namespaces.write().insert(descriptor.name.clone()) {
            return Err(Status::already_exists(format!(
                "namespace {} already exists",
                descriptor.name
            )));
        }
        Ok(())
    }

    async fn create_table(&self, descriptor: TTableDescriptor, _split_keys: Vec<Vec<u8>>) -> Result<(), Status> {
        let name = descriptor
            .table_name
            .ok_or_else(|| Status::invalid_argument("table name is required"))?;
        let ns = String::from_utf8_lossy(&name.ns).into_owned();
        if !ns.is_empty() && !self.namespaces.read().contains(&ns) {
            return Err(Status::not_found(format!("namespace {} does not exist", ns)));
        }

        let full_name = if ns.is_empty() || ns == DEFAULT_NAMESPACE {
            name.qualifier
        } else {
            [name.ns.as_slice(), b":", name.qualifier.as_slice()].concat()
        };
        let mut tables = self.tables.write();
        if tables.contains_key(&full_name) {
            return Err(Status::already_exists(format!(
                "table {} already exists",
                String::from_utf8_lossy(&full_name)
            )));
        }
        tables.insert(full_name, Rows::new());
        Ok(())
    }
}
