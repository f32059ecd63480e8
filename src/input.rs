//! Loader for `key,value` seed files

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};

use crate::error::Result;

/// Reads `key,value` pairs, one per line, in file order.
///
/// A line that does not split into exactly two fields on `,` is reported and
/// skipped; it does not stop the lines after it from loading.
pub fn parse_pairs<R: BufRead>(reader: R) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            warn!("line {} format error: {:?}", index + 1, line);
            continue;
        }
        pairs.push((fields[0].to_string(), fields[1].to_string()));
    }
    Ok(pairs)
}

pub fn load_pairs<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let pairs = parse_pairs(BufReader::new(file))?;
    info!("loaded {} pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}
