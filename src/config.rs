use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One stack the caller wants running on the Portainer instance.
///
/// Built either from the single-stack CLI flags or from a stacks file entry;
/// immutable once constructed.
#[derive(Debug, Clone)]
pub struct DesiredStack {
    pub name: String,
    pub endpoint_id: i64,
    pub definition_path: Option<PathBuf>,
    pub template_vars: BTreeMap<String, String>,
    pub image: Option<String>,
    pub swarm_id: Option<String>,
}

// ============================================================================
// Stacks File
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StacksFile {
    pub registry: String,
    pub deploy: Vec<StackEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StackEntry {
    pub stack: String,
    pub path: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub template: BTreeMap<String, String>,
}

impl StacksFile {
    /// Load and parse a stacks file
    pub fn load(path: &Path) -> Result<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy().into_owned()).into_owned();
        let content = fs::read_to_string(&expanded)
            .with_context(|| format!("Could not read stacks file {}", expanded))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid stacks file format in {}", expanded))
    }

    /// Expand the declared entries into deployable stacks.
    ///
    /// The image reference is derived as `<registry>/<image-or-stack>:<version-or-latest>`.
    pub fn into_desired_stacks(self, endpoint_id: i64, swarm_id: Option<&str>) -> Vec<DesiredStack> {
        let registry = self.registry;
        self.deploy
            .into_iter()
            .map(|entry| {
                let image_name = entry.image.as_deref().unwrap_or(&entry.stack);
                let version = entry.version.as_deref().unwrap_or("latest");
                let image = format!("{}/{}:{}", registry, image_name, version);

                DesiredStack {
                    name: entry.stack,
                    endpoint_id,
                    definition_path: Some(PathBuf::from(entry.path)),
                    template_vars: entry.template,
                    image: Some(image),
                    swarm_id: swarm_id.map(str::to_string),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
registry: ghcr.io/acme
deploy:
  - stack: billing
    path: stacks/billing.yml
    version: 1.4.2
    template:
      domain: billing.acme.io
  - stack: web
    path: stacks/web.yml
    image: frontend
";

    #[test]
    fn test_parse_stacks_file() {
        let file: StacksFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(file.registry, "ghcr.io/acme");
        assert_eq!(file.deploy.len(), 2);
        assert_eq!(file.deploy[0].stack, "billing");
        assert_eq!(file.deploy[0].template["domain"], "billing.acme.io");
        assert!(file.deploy[1].template.is_empty());
    }

    #[test]
    fn test_image_derivation() {
        let file: StacksFile = serde_yaml::from_str(SAMPLE).unwrap();
        let stacks = file.into_desired_stacks(3, None);

        // Explicit version, image defaults to the stack name
        assert_eq!(stacks[0].image.as_deref(), Some("ghcr.io/acme/billing:1.4.2"));
        // Explicit image, version defaults to latest
        assert_eq!(stacks[1].image.as_deref(), Some("ghcr.io/acme/frontend:latest"));

        assert_eq!(stacks[0].endpoint_id, 3);
        assert_eq!(
            stacks[0].definition_path.as_deref(),
            Some(Path::new("stacks/billing.yml"))
        );
    }

    #[test]
    fn test_swarm_id_carried_to_every_stack() {
        let file: StacksFile = serde_yaml::from_str(SAMPLE).unwrap();
        let stacks = file.into_desired_stacks(1, Some("cluster-a"));
        assert!(stacks.iter().all(|s| s.swarm_id.as_deref() == Some("cluster-a")));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = StacksFile::load(Path::new("/nonexistent/stacks.yml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stacks.yml");
        fs::write(&path, "registry: [unclosed").unwrap();
        assert!(StacksFile::load(&path).is_err());
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stacks.yml");
        fs::write(&path, SAMPLE).unwrap();

        let file = StacksFile::load(&path).unwrap();
        assert_eq!(file.deploy.len(), 2);
    }
}
