//! Indexing annotation files into parallel sample/label lists.

use crate::types::{DatasetError, DatasetResult, SampleSet};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Field separator inside annotation lines: `<relative-path>, <label>`.
const DELIMITER: &str = ", ";

/// Scans `root` for `.txt` annotation files and parses every line into the
/// sample and label lists.
///
/// Output order is file-enumeration order then line order; only the pairing
/// of the two lists is guaranteed, not the order itself.
pub fn index_annotations(root: &Path) -> DatasetResult<SampleSet> {
    let entries = fs::read_dir(root).map_err(|e| DatasetError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut set = SampleSet::default();
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        let raw = fs::read_to_string(&path).map_err(|e| DatasetError::Io {
            path: path.clone(),
            source: e,
        })?;
        for (lineno, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (sample, label) = line.split_once(DELIMITER).ok_or_else(|| DatasetError::Parse {
                path: path.clone(),
                line: lineno + 1,
                msg: format!("missing {DELIMITER:?} delimiter"),
            })?;
            let label: usize = label.trim().parse().map_err(|_| DatasetError::Parse {
                path: path.clone(),
                line: lineno + 1,
                msg: format!("non-numeric label {:?}", label.trim()),
            })?;
            set.samples.push(sample.to_string());
            set.labels.push(label);
        }
    }
    Ok(set)
}

/// Loads the label-id to class-name mapping (JSON object keyed by the
/// string-encoded label).
pub fn load_label_names(path: &Path) -> DatasetResult<BTreeMap<usize, String>> {
    let raw = fs::read(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let by_key: BTreeMap<String, String> =
        serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
    let mut names = BTreeMap::new();
    for (key, name) in by_key {
        let label: usize = key.parse().map_err(|_| DatasetError::Config(format!(
            "label-name key {key:?} in {} is not an integer",
            path.display()
        )))?;
        names.insert(label, name);
    }
    Ok(names)
}
