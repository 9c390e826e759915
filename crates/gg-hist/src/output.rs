//! Named-object output store.
//!
//! The file is created up front so an unwritable destination fails before any
//! events are processed. Objects are staged in memory and serialized on
//! [`OutputFile::close`] as `{"objects": {name: object}}`, the same layout
//! the input reader accepts for auxiliary objects.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use gg_core::{Error, Result};

use crate::histogram::Histogram;

#[derive(Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    objects: BTreeMap<String, Json>,
}

/// An output file being written.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    file: File,
    objects: BTreeMap<String, Json>,
}

impl OutputFile {
    /// Create (truncate) `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|source| Error::OpenOutput { path: path.clone(), source })?;
        Ok(Self { path, file, objects: BTreeMap::new() })
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stage a named object; each name may be written once.
    pub fn write_object<T: Serialize>(&mut self, name: &str, object: &T) -> Result<()> {
        self.write_objects([(name, object)])
    }

    /// Stage several objects at once. Nothing is staged unless every object
    /// serializes and no name repeats.
    pub fn write_objects<'a, T, I>(&mut self, objects: I) -> Result<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a str, &'a T)>,
    {
        let mut staged = BTreeMap::new();
        for (name, object) in objects {
            if self.objects.contains_key(name) || staged.contains_key(name) {
                return Err(Error::Validation(format!(
                    "object '{name}' already written to {}",
                    self.path.display()
                )));
            }
            staged.insert(name.to_string(), serde_json::to_value(object)?);
        }
        self.objects.append(&mut staged);
        Ok(())
    }

    /// Serialize everything staged and flush the file.
    pub fn close(self) -> Result<()> {
        let Self { path, file, objects } = self;
        let n = objects.len();
        let mut w = BufWriter::new(file);
        let out_err = |source| Error::OpenOutput { path: path.clone(), source };
        serde_json::to_writer(&mut w, &Document { objects })
            .map_err(|e| out_err(std::io::Error::from(e)))?;
        w.flush().map_err(out_err)?;
        tracing::debug!(path = %path.display(), objects = n, "output file closed");
        Ok(())
    }
}

/// Read every histogram stored in an output file.
///
/// Objects that are not histograms are skipped.
pub fn read_histograms(path: impl AsRef<Path>) -> Result<BTreeMap<String, Histogram>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|source| Error::OpenInput { path: path.to_path_buf(), source })?;
    let doc: Document = serde_json::from_slice(&bytes)
        .map_err(|source| Error::ParseInput { path: path.to_path_buf(), source })?;
    let mut out = BTreeMap::new();
    for (name, value) in doc.objects {
        let Ok(hist) = serde_json::from_value::<Histogram>(value) else {
            tracing::debug!(object = %name, "skipping non-histogram object");
            continue;
        };
        check_layout(&hist)?;
        out.insert(name, hist);
    }
    Ok(out)
}

/// Reject histograms whose stored arrays disagree with their axes.
pub fn check_layout(hist: &Histogram) -> Result<()> {
    let (expected, contents, sumw2) = match hist {
        Histogram::OneD(h) => (h.axis.n_bins + 2, h.contents.len(), h.sumw2.len()),
        Histogram::TwoD(h) => {
            ((h.x.n_bins + 2) * (h.y.n_bins + 2), h.contents.len(), h.sumw2.len())
        }
    };
    if contents != expected || sumw2 != expected {
        return Err(Error::IncompatibleBinning(hist.name().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{Axis, Hist1D};

    fn tmp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gg_hist_out_{}_{name}", std::process::id()))
    }

    #[test]
    fn write_close_read() {
        let path = tmp("roundtrip.json");
        let mut h = Hist1D::new("h", Axis::new(4, 0.0, 4.0).unwrap());
        h.fill(1.5, 2.0);
        let mut f = OutputFile::create(&path).unwrap();
        f.write_object("h", &Histogram::OneD(h.clone())).unwrap();
        f.write_object("note", &"not a histogram").unwrap();
        assert!(f.write_object("h", &1).is_err());
        f.close().unwrap();

        let back = read_histograms(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back["h"], Histogram::OneD(h));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejected_batch_stages_nothing() {
        let path = tmp("batch.json");
        let mut f = OutputFile::create(&path).unwrap();
        f.write_object("a", &1).unwrap();
        let err = f.write_objects([("b", &2), ("a", &3)]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        f.write_object("b", &4).unwrap();
        f.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc: Json = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["objects"]["a"], 1);
        assert_eq!(doc["objects"]["b"], 4);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_destination() {
        let err = OutputFile::create("/nonexistent-dir/out.json").unwrap_err();
        assert_eq!(err.class(), gg_core::ErrorClass::Output);
    }

    #[test]
    fn truncated_contents_rejected() {
        let mut h = Hist1D::new("h", Axis::new(4, 0.0, 4.0).unwrap());
        h.contents.pop();
        assert!(check_layout(&Histogram::OneD(h)).is_err());
    }
}
