//! Job input and output files.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::backend::{B64Data, InputInstance};
use crate::inference::job::JobError;

/// Turn every regular file directly inside `dir` into a predict instance,
/// ordered by file name. Subdirectories are skipped.
pub async fn read_inputs(dir: &Path) -> Result<Vec<InputInstance>, JobError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        JobError::Invalid(format!("cannot read input directory {}: {}", dir.display(), e))
    })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| JobError::io(format!("listing {}", dir.display()), e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| JobError::io(format!("inspecting {}", entry.path().display()), e))?;
        if file_type.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(JobError::Invalid(format!(
            "input directory {} contains no files",
            dir.display()
        )));
    }

    let mut instances = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| JobError::io(format!("reading {}", path.display()), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        instances.push(InputInstance {
            name,
            data: B64Data {
                b64: STANDARD.encode(contents),
            },
        });
    }

    Ok(instances)
}

/// Write predictions to `path`, creating `dir` first.
///
/// A single prediction is written as-is; several are written as an array.
pub async fn write_results(
    dir: &Path,
    path: &Path,
    mut predictions: Vec<serde_json::Value>,
) -> Result<(), JobError> {
    let document = if predictions.len() == 1 {
        predictions.remove(0)
    } else {
        serde_json::Value::Array(predictions)
    };

    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|e| JobError::io("encoding results", e.into()))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| JobError::io(format!("creating {}", dir.display()), e))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| JobError::io(format!("writing {}", path.display()), e))?;

    Ok(())
}
