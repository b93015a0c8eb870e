use std::path::Path;

use {
    anyhow::{Context, Result},
    tokio::io::AsyncReadExt,
};

/// Read a whole file, or stdin when no path is given.
pub async fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("reading stdin")?;
            Ok(buf)
        },
    }
}
