//! Data docs: the browsable report of persisted validation runs.
//!
//! Rebuilding renders one markdown page per stored result plus an index, so
//! the site always reflects the result store. A failing run gets a page like
//! any other — publishing is independent of the verdict.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::formatters::{MarkdownFormatter, ResultFormatter};
use crate::results::ResultStore;

/// Builds and maintains the data docs site under a root directory.
#[derive(Debug, Clone)]
pub struct DataDocs {
    root: PathBuf,
}

impl DataDocs {
    /// Creates a docs builder rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the docs root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the index page.
    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.md")
    }

    /// Returns the page path for a run identifier.
    pub fn page_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("{run_id}.md"))
    }

    /// Regenerates the whole site from the result store and returns the
    /// index path.
    #[instrument(skip(self, results), fields(root = %self.root.display()))]
    pub async fn rebuild(&self, results: &dyn ResultStore) -> Result<PathBuf> {
        let formatter = MarkdownFormatter::new();
        let run_ids = results.list_run_ids().await?;

        let mut index = String::from("# Data docs\n\n| Run | Suite | Status |\n|---|---|---|\n");
        // newest runs first on the index
        for run_id in run_ids.iter().rev() {
            let Some(result) = results.get(run_id).await? else {
                continue;
            };

            let page = formatter.format(&result)?;
            let path = self.page_path(run_id);
            fs::write(&path, page)?;
            debug!(run.id = %run_id, path = %path.display(), "Docs page written");

            let status = if result.success { "passed" } else { "failed" };
            index.push_str(&format!(
                "| [{run_id}]({run_id}.md) | `{}` | {status} |\n",
                result.suite_name
            ));
        }

        let index_path = self.index_path();
        fs::write(&index_path, index)?;
        info!(
            runs = run_ids.len(),
            index = %index_path.display(),
            "Data docs rebuilt"
        );
        Ok(index_path)
    }
}
