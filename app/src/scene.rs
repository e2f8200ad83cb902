use anyhow::Context;
use label_connector::MemoryGraph;
use std::fs;

const DEMO_SCENE: &str = include_str!("../assets/demo_scene.json");

/// Loads the scene at `path`, or the bundled demo scene without one.
pub fn load_scene(path: Option<&str>) -> anyhow::Result<MemoryGraph> {
    let Some(path) = path else {
        return MemoryGraph::from_json(DEMO_SCENE).context("Bundled demo scene is invalid");
    };
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read scene {}", path))?;
    MemoryGraph::from_json(&json).with_context(|| format!("Failed to parse scene {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_connector::registry::list_connectors;

    #[test]
    fn demo_scene_loads_with_connectors() {
        let graph = load_scene(None).unwrap();
        let registry = list_connectors(&graph);
        assert_eq!(registry.labels(), vec!["BG", "CAMERA", "PLATE"]);
        assert!(registry.duplicates().is_empty());
    }

    #[test]
    fn missing_scene_file_names_the_path() {
        let error = load_scene(Some("/nonexistent/scene.json")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/scene.json"));
    }
}
