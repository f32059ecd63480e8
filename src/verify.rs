use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::backend::Backend;
use crate::error::Result;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub key: String,
    pub expected: String,
    pub actual: String,
}

/// Outcome of reading every expected key back, in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub ok: Vec<String>,
    pub mismatched: Vec<Mismatch>,
    pub missing: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty()
    }
}

/// Optionally seeds `table` with `pairs`, then reads every key back with one
/// batched read and compares. A key that appears twice is expected to hold
/// its last value.
pub async fn run<B: Backend>(
    session: &Session<B>,
    table: &str,
    pairs: &[(String, String)],
    seed: bool,
) -> Result<VerifyReport> {
    let mut expected = HashMap::with_capacity(pairs.len());
    let mut seen = HashSet::with_capacity(pairs.len());
    let mut keys = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        expected.insert(key.clone(), value.clone());
        if seen.insert(key.as_str()) {
            keys.push(key.clone());
        }
    }

    if seed {
        session.put_multiple(table, &expected).await?;
        info!("seeded {} rows into {}", expected.len(), table);
    }

    let data = session.get_multiple(table, &keys).await?;

    let mut report = VerifyReport::default();
    for key in keys {
        let want = &expected[&key];
        match data.get(&key) {
            Some(got) if got == want => {
                info!("[ok] {}", key);
                report.ok.push(key);
            }
            Some(got) => {
                warn!("[Mismatch] {} {} {}", key, got, want);
                report.mismatched.push(Mismatch {
                    key,
                    expected: want.clone(),
                    actual: got.clone(),
                });
            }
            None => {
                warn!("[Missing] {}", key);
                report.missing.push(key);
            }
        }
    }
    Ok(report)
}
