//! Sample factory: builds a measurement unit from a `sample` key, loading
//! its events and data files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nf_core::{ConfigKey, Error, EventSource, Result};
use nf_sample::{JointEventSource, MeasuredData, MeasurementUnit, VecEventSource};

/// Build a measurement unit from a sample key.
///
/// Keys: `name` (channel), `input` (event file, or several joined by `;`),
/// `data` (measured-data file), optional `type` and `norm`. Relative paths
/// are resolved against `base_dir`.
pub fn create_sample(key: &ConfigKey, base_dir: &Path) -> Result<MeasurementUnit> {
    let name = key.require_str("name")?;
    let input = key.require_str("input")?;
    let data_path = key
        .get_str("data")
        .ok_or_else(|| Error::Validation(format!("sample '{name}': missing key 'data'")))?;

    let source = load_source(input, base_dir)?;
    let data = MeasuredData::from_json_file(resolve(data_path, base_dir))?;
    MeasurementUnit::from_key(key, source, data)
}

/// Load the events named by an `input` value.
///
/// A single file gives a plain source; `a.json;b.json` concatenates the files
/// into a [`JointEventSource`]. An optional `FORMAT:` prefix is accepted and
/// ignored.
pub fn load_source(input: &str, base_dir: &Path) -> Result<Arc<dyn EventSource>> {
    let input = strip_format(input);
    let files: Vec<&str> = input.split(';').map(str::trim).filter(|s| !s.is_empty()).collect();

    match files.as_slice() {
        [] => Err(Error::Validation("empty sample input".into())),
        [single] => Ok(Arc::new(VecEventSource::from_json_file(resolve(single, base_dir))?)),
        many => {
            let mut inputs: Vec<Box<dyn EventSource>> = Vec::with_capacity(many.len());
            for file in many {
                inputs.push(Box::new(VecEventSource::from_json_file(resolve(file, base_dir))?));
            }
            Ok(Arc::new(JointEventSource::new(inputs)?))
        }
    }
}

fn strip_format(input: &str) -> &str {
    match input.split_once(':') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => input,
    }
}

fn resolve(path: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() { p.to_path_buf() } else { base_dir.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_prefix_is_stripped() {
        assert_eq!(strip_format("NEUT:events.json"), "events.json");
        assert_eq!(strip_format("events.json"), "events.json");
        assert_eq!(strip_format("dir/a:b.json"), "dir/a:b.json");
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/cards");
        assert_eq!(resolve("ev.json", base), PathBuf::from("/cards/ev.json"));
        assert_eq!(resolve("/abs/ev.json", base), PathBuf::from("/abs/ev.json"));
    }

    #[test]
    fn missing_keys_are_errors() {
        let base = Path::new(".");
        let k = ConfigKey::new().with("name", "T2K_CC1pip_H2O_XSec_1Dpmu_nu");
        assert!(create_sample(&k, base).is_err());
        let k = k.with("input", "ev.json");
        let err = create_sample(&k, base).err().unwrap();
        assert!(err.to_string().contains("data"));
        assert!(load_source(" ; ", base).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_source("/nonexistent/nufit/events.json", Path::new(".")).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
