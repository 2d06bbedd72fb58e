//! Content hot-reload
//!
//! Polls the curriculum file's modification time and swaps the index
//! generation when it changes. Content that fails to load or build is logged
//! and the previous generation keeps serving.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::curriculum;
use crate::facade::KnowledgeIndex;

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Unchanged,
    Reloaded { generation: u64, vocabulary: usize },
    Failed(String),
}

fn modified(path: &Path) -> Result<SystemTime> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok(meta.modified()?)
}

/// Tracks one content file
pub struct ContentWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ContentWatcher {
    /// Start watching; the file's current state counts as already loaded
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = modified(&path).ok();
        Self {
            path,
            last_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload into `index` if the file changed since the last poll
    pub fn poll(&mut self, index: &KnowledgeIndex) -> ReloadOutcome {
        let current = match modified(&self.path) {
            Ok(m) => m,
            Err(e) => return ReloadOutcome::Failed(format!("{:#}", e)),
        };
        if self.last_modified == Some(current) {
            return ReloadOutcome::Unchanged;
        }
        self.last_modified = Some(current);
        debug!("Change detected in {:?}", self.path);

        let content = match curriculum::load(&self.path) {
            Ok(c) => c,
            Err(e) => return ReloadOutcome::Failed(format!("{:#}", e)),
        };
        match index.try_reload(content) {
            Ok((generation, lexicon)) => ReloadOutcome::Reloaded {
                generation,
                vocabulary: lexicon.vocabulary_len(),
            },
            Err(e) => ReloadOutcome::Failed(e.to_string()),
        }
    }
}

/// Poll until Ctrl-C
pub async fn run(index: Arc<KnowledgeIndex>, path: PathBuf, interval: Duration) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let mut watcher = ContentWatcher::new(path);
    info!(
        "Watching {:?} every {}ms (generation {})",
        watcher.path(),
        interval.as_millis(),
        index.generation()
    );

    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(interval).await;

        match watcher.poll(&index) {
            ReloadOutcome::Unchanged => {}
            ReloadOutcome::Reloaded {
                generation,
                vocabulary,
            } => {
                info!(
                    "Reloaded at {}: generation {}, {} vocabulary items",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    generation,
                    vocabulary
                );
            }
            ReloadOutcome::Failed(reason) => {
                warn!(
                    "Reload failed, still serving generation {}: {}",
                    index.generation(),
                    reason
                );
            }
        }
    }

    info!("Watcher stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::curriculum::{LessonId, ModuleId};
    use std::fs::File;
    use tempfile::TempDir;

    const V1: &str = r#"{"modules": [{"id": "module1", "lessons": [{"id": "lesson1",
        "vocabulary": [{"id": "word-su"}],
        "steps": [{"type": "flashcard", "vocabulary_id": "word-su"}]}]}]}"#;

    const V2: &str = r#"{"modules": [{"id": "module1", "lessons": [{"id": "lesson1",
        "vocabulary": [{"id": "word-su"}, {"id": "word-ev"}],
        "steps": [{"type": "flashcard", "vocabulary_id": "word-su"},
                  {"type": "flashcard", "vocabulary_id": "word-ev"}]}]}]}"#;

    const BROKEN: &str = r#"{"modules": [{"id": "module1", "lessons": [
        {"id": "lesson1", "vocabulary": [{"id": "word-su"}]},
        {"id": "lesson2", "vocabulary": [{"id": "word-su"}]}]}]}"#;

    fn write_at(path: &Path, content: &str, secs: u64) {
        std::fs::write(path, content).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_poll_reloads_on_change_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("curriculum.json");
        write_at(&path, V1, 1_000);

        let index = KnowledgeIndex::new(curriculum::load(&path).unwrap(), &IndexConfig::default());
        let mut watcher = ContentWatcher::new(&path);
        assert_eq!(watcher.poll(&index), ReloadOutcome::Unchanged);

        write_at(&path, V2, 2_000);
        match watcher.poll(&index) {
            ReloadOutcome::Reloaded { vocabulary, .. } => assert_eq!(vocabulary, 2),
            other => panic!("expected reload, got {:?}", other),
        }
        assert_eq!(watcher.poll(&index), ReloadOutcome::Unchanged);

        let m = ModuleId::parse("module1").unwrap();
        let l = LessonId::parse("lesson1").unwrap();
        assert!(index.learned_state(&m, &l, 1).unwrap().knows_vocabulary("word-ev"));
    }

    #[test]
    fn test_broken_content_keeps_previous_generation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("curriculum.json");
        write_at(&path, V1, 1_000);

        let index = KnowledgeIndex::new(curriculum::load(&path).unwrap(), &IndexConfig::default());
        index.init().unwrap();
        let generation = index.generation();
        let mut watcher = ContentWatcher::new(&path);

        write_at(&path, BROKEN, 3_000);
        match watcher.poll(&index) {
            ReloadOutcome::Failed(reason) => assert!(reason.contains("duplicate vocabulary")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(index.generation(), generation);

        write_at(&path, "{not json", 4_000);
        assert!(matches!(watcher.poll(&index), ReloadOutcome::Failed(_)));
        assert_eq!(index.lexicon().unwrap().vocabulary_len(), 1);

        // Failed attempts use up no generation number
        write_at(&path, V2, 5_000);
        assert_eq!(
            watcher.poll(&index),
            ReloadOutcome::Reloaded {
                generation: generation + 1,
                vocabulary: 2,
            }
        );
        assert_eq!(index.generation(), generation + 1);
    }
}
