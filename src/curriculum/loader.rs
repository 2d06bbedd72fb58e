//! Curriculum loading
//!
//! Reads the content tree from a `.json` or `.toml` file. Identifier ordinals
//! are parsed during deserialization, so a malformed `module`/`lesson` id
//! fails the load rather than surfacing later as a bad comparison.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use super::Curriculum;

/// Load a curriculum, picking the format from the file extension
pub fn load(path: &Path) -> Result<Curriculum> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curriculum {}", path.display()))?;

    let curriculum = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content),
        Some("json") | None => parse_json(&content),
        Some(other) => anyhow::bail!("Unsupported curriculum format '.{}'", other),
    }
    .with_context(|| format!("Failed to parse curriculum {}", path.display()))?;

    debug!(
        "Loaded curriculum from {:?}: {} modules, {} lessons, {} steps",
        path,
        curriculum.modules.len(),
        curriculum.lesson_count(),
        curriculum.step_count()
    );
    Ok(curriculum)
}

pub fn parse_json(content: &str) -> Result<Curriculum> {
    Ok(serde_json::from_str(content)?)
}

pub fn parse_toml(content: &str) -> Result<Curriculum> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::StepKind;
    use tempfile::TempDir;

    const TOML_CURRICULUM: &str = r#"
[[modules]]
id = "module1"

[[modules.lessons]]
id = "lesson1"

[[modules.lessons.vocabulary]]
id = "word-su"
semantic_group = "drinks"

[[modules.lessons.steps]]
type = "flashcard"
vocabulary_id = "word-su"

[[modules.lessons.steps]]
type = "grammar-fill-blank"
sentence = "Su__"

[[modules.lessons.steps.blanks]]
options = [{ id = "suffix-lar" }, { id = "suffix-ler" }]
"#;

    #[test]
    fn test_load_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("curriculum.toml");
        std::fs::write(&path, TOML_CURRICULUM).unwrap();

        let c = load(&path).unwrap();
        let lesson = &c.modules[0].lessons[0];
        assert_eq!(lesson.vocabulary[0].semantic_group.as_deref(), Some("drinks"));
        assert_eq!(lesson.steps[1].kind(), StepKind::GrammarFillBlank);
        assert_eq!(lesson.steps[1].option_entries().len(), 2);
    }

    #[test]
    fn test_load_json_and_reject_bad_ids() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.json");
        std::fs::write(&good, r#"{"modules": [{"id": "module2", "lessons": []}]}"#).unwrap();
        assert_eq!(load(&good).unwrap().modules[0].ordinal(), 2);

        let bad = temp.path().join("bad.json");
        std::fs::write(
            &bad,
            r#"{"modules": [{"id": "module2", "lessons": [{"id": "extra"}]}]}"#,
        )
        .unwrap();
        let err = load(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid lesson identifier"));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("curriculum.yaml");
        std::fs::write(&path, "modules: []").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/nonexistent/curriculum.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read curriculum"));
    }
}
