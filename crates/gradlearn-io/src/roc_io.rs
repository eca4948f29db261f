use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use gradlearn_metrics::RocPoint;

/// Write one `fpr, tpr` line per point.
pub fn write_roc<W: Write>(mut writer: W, points: &[RocPoint]) -> io::Result<()> {
    for p in points {
        writeln!(writer, "{}, {}", p.fpr, p.tpr)?;
    }
    writer.flush()
}

/// Write the ROC table to `dir/name` and return the full path.
pub fn write_roc_file<P: AsRef<Path>>(dir: P, name: &str, points: &[RocPoint]) -> io::Result<PathBuf> {
    let path = dir.as_ref().join(name);
    let file = File::create(&path)?;
    write_roc(BufWriter::new(file), points)?;
    Ok(path)
}

/// Artifact name `{model}-{optimizer}_lambda={rate}_auc={auc}`, lowercased.
pub fn artifact_name(model: &str, optimizer: &str, rate_label: &str, auc: f64) -> String {
    format!("{}-{}_lambda={}_auc={}", model, optimizer, rate_label, auc).to_lowercase()
}
