use std::io;
use std::path::{Path, PathBuf};

/// Lists the regular files directly inside `dir`, sorted by path
pub async fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => files.push(entry.path()),
            Ok(_) => {}
            Err(e) => log::debug!("Skipping {}: {}", entry.path().display(), e),
        }
    }
    files.sort();
    Ok(files)
}

/// Files directly inside `dir` whose name ends with `suffix`.
///
/// A missing directory yields an empty list.
pub async fn find_files_with_suffix(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }
    let files = list_files(dir).await?;
    Ok(files
        .into_iter()
        .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(suffix)))
        .collect())
}

/// File name of `path` as UTF-8, if it has one
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
