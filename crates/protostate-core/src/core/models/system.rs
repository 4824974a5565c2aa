use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// One candidate protonation or tautomer state of a site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceDefinition {
    pub label: String,
    /// Protons carried when this instance is active.
    #[serde(default)]
    pub protons: i32,
    /// Intrinsic free energy in the folded environment, kJ/mol.
    #[serde(default)]
    pub intrinsic: f64,
    /// Reference free energy in the unfolded environment, kJ/mol.
    #[serde(default)]
    pub model: f64,
}

impl InstanceDefinition {
    pub fn new(label: impl Into<String>, protons: i32, intrinsic: f64, model: f64) -> Self {
        Self {
            label: label.into(),
            protons,
            intrinsic,
            model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDefinition {
    pub name: String,
    pub instances: Vec<InstanceDefinition>,
}

impl SiteDefinition {
    pub fn new(name: impl Into<String>, instances: Vec<InstanceDefinition>) -> Self {
        Self {
            name: name.into(),
            instances,
        }
    }
}

/// Addresses an instance by site name and instance label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceRef {
    pub site: String,
    pub instance: String,
}

impl InstanceRef {
    pub fn new(site: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            instance: instance.into(),
        }
    }
}

/// A raw interaction entry `W[first, second]`. With `symmetric` set, the same energy is also
/// written to `W[second, first]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InteractionDefinition {
    pub first: InstanceRef,
    pub second: InstanceRef,
    pub energy: f64,
    #[serde(default)]
    pub symmetric: bool,
}

#[derive(Debug, Error)]
pub enum SystemLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Site '{0}' declares no instances")]
    EmptySite(String),
    #[error("Site name '{0}' is used more than once")]
    DuplicateSite(String),
    #[error("Instance label '{label}' is used more than once in site '{site}'")]
    DuplicateInstance { site: String, label: String },
    #[error("Interaction references unknown site '{0}'")]
    UnknownSite(String),
    #[error("Interaction references unknown instance '{instance}' of site '{site}'")]
    UnknownInstance { site: String, instance: String },
    #[error("Interaction between '{first}' and '{second}' couples instances of the same site '{site}'")]
    IntraSiteInteraction {
        site: String,
        first: String,
        second: String,
    },
}

/// A validated description of a titratable system: its sites, their instances in global
/// order, and the raw pairwise interactions between instances of different sites.
#[derive(Debug, Clone, PartialEq)]
pub struct TitratableSystem {
    sites: Vec<SiteDefinition>,
    interactions: Vec<InteractionDefinition>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSystemFile {
    sites: Vec<SiteDefinition>,
    #[serde(default)]
    interactions: Vec<InteractionDefinition>,
}

impl TitratableSystem {
    pub fn new(
        sites: Vec<SiteDefinition>,
        interactions: Vec<InteractionDefinition>,
    ) -> Result<Self, SystemLoadError> {
        let system = Self {
            sites,
            interactions,
        };
        system.validate()?;
        Ok(system)
    }

    pub fn load(path: &Path) -> Result<Self, SystemLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| SystemLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SystemLoadError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, SystemLoadError> {
        let raw: RawSystemFile = toml::from_str(content).map_err(|e| SystemLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        Self::new(raw.sites, raw.interactions)
    }

    fn validate(&self) -> Result<(), SystemLoadError> {
        let mut names = HashSet::new();
        for site in &self.sites {
            if site.instances.is_empty() {
                return Err(SystemLoadError::EmptySite(site.name.clone()));
            }
            if !names.insert(site.name.as_str()) {
                return Err(SystemLoadError::DuplicateSite(site.name.clone()));
            }
            let mut labels = HashSet::new();
            for instance in &site.instances {
                if !labels.insert(instance.label.as_str()) {
                    return Err(SystemLoadError::DuplicateInstance {
                        site: site.name.clone(),
                        label: instance.label.clone(),
                    });
                }
            }
        }

        for interaction in &self.interactions {
            self.instance_index(&interaction.first)?;
            self.instance_index(&interaction.second)?;
            if interaction.first.site == interaction.second.site {
                return Err(SystemLoadError::IntraSiteInteraction {
                    site: interaction.first.site.clone(),
                    first: interaction.first.instance.clone(),
                    second: interaction.second.instance.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn sites(&self) -> &[SiteDefinition] {
        &self.sites
    }

    pub fn interactions(&self) -> &[InteractionDefinition] {
        &self.interactions
    }

    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn n_instances(&self) -> usize {
        self.sites.iter().map(|s| s.instances.len()).sum()
    }

    pub fn site_sizes(&self) -> Vec<usize> {
        self.sites.iter().map(|s| s.instances.len()).collect()
    }

    /// All instances in global index order.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceDefinition> {
        self.sites.iter().flat_map(|s| s.instances.iter())
    }

    /// Resolves an instance reference to its global instance index.
    pub fn instance_index(&self, reference: &InstanceRef) -> Result<usize, SystemLoadError> {
        let mut offset = 0;
        for site in &self.sites {
            if site.name == reference.site {
                return site
                    .instances
                    .iter()
                    .position(|i| i.label == reference.instance)
                    .map(|position| offset + position)
                    .ok_or_else(|| SystemLoadError::UnknownInstance {
                        site: reference.site.clone(),
                        instance: reference.instance.clone(),
                    });
            }
            offset += site.instances.len();
        }
        Err(SystemLoadError::UnknownSite(reference.site.clone()))
    }

    /// Resolved `(first, second, energy)` triples for every raw matrix entry to be written,
    /// with symmetric definitions expanded into both directions.
    pub fn interaction_entries(&self) -> Result<Vec<(usize, usize, f64)>, SystemLoadError> {
        let mut entries = Vec::with_capacity(self.interactions.len() * 2);
        for interaction in &self.interactions {
            let a = self.instance_index(&interaction.first)?;
            let b = self.instance_index(&interaction.second)?;
            entries.push((a, b, interaction.energy));
            if interaction.symmetric {
                entries.push((b, a, interaction.energy));
            }
        }
        Ok(entries)
    }

    /// Index of a site by name.
    pub fn site_index(&self, name: &str) -> Option<usize> {
        self.sites.iter().position(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TWO_SITE_TOML: &str = r#"
        [[sites]]
        name = "ASP12"
        [[sites.instances]]
        label = "deprotonated"
        [[sites.instances]]
        label = "protonated"
        protons = 1
        intrinsic = -2.0
        model = -1.5

        [[sites]]
        name = "HIS31"
        [[sites.instances]]
        label = "neutral"
        [[sites.instances]]
        label = "charged"
        protons = 1
        intrinsic = 1.0

        [[interactions]]
        first = { site = "ASP12", instance = "protonated" }
        second = { site = "HIS31", instance = "charged" }
        energy = 0.75
        symmetric = true
    "#;

    #[test]
    fn from_toml_str_parses_sites_instances_and_interactions() {
        let system = TitratableSystem::from_toml_str(TWO_SITE_TOML).unwrap();
        assert_eq!(system.n_sites(), 2);
        assert_eq!(system.n_instances(), 4);
        assert_eq!(system.site_sizes(), vec![2, 2]);

        let protonated = &system.sites()[0].instances[1];
        assert_eq!(protonated.protons, 1);
        assert_eq!(protonated.intrinsic, -2.0);
        assert_eq!(protonated.model, -1.5);

        let deprotonated = &system.sites()[0].instances[0];
        assert_eq!(deprotonated.protons, 0);
        assert_eq!(deprotonated.intrinsic, 0.0);
    }

    #[test]
    fn symmetric_interactions_expand_into_both_directions() {
        let system = TitratableSystem::from_toml_str(TWO_SITE_TOML).unwrap();
        let entries = system.interaction_entries().unwrap();
        assert_eq!(entries, vec![(1, 3, 0.75), (3, 1, 0.75)]);
    }

    #[test]
    fn instance_index_resolves_global_positions() {
        let system = TitratableSystem::from_toml_str(TWO_SITE_TOML).unwrap();
        assert_eq!(
            system
                .instance_index(&InstanceRef::new("HIS31", "neutral"))
                .unwrap(),
            2
        );
        assert!(matches!(
            system.instance_index(&InstanceRef::new("GLU7", "neutral")),
            Err(SystemLoadError::UnknownSite(_))
        ));
        assert!(matches!(
            system.instance_index(&InstanceRef::new("HIS31", "tautomer")),
            Err(SystemLoadError::UnknownInstance { .. })
        ));
    }

    #[test]
    fn new_rejects_site_without_instances() {
        let result = TitratableSystem::new(vec![SiteDefinition::new("LYS1", vec![])], vec![]);
        assert!(matches!(result, Err(SystemLoadError::EmptySite(name)) if name == "LYS1"));
    }

    #[test]
    fn new_rejects_duplicate_site_names_and_labels() {
        let instance = InstanceDefinition::new("a", 0, 0.0, 0.0);
        let duplicate_sites = TitratableSystem::new(
            vec![
                SiteDefinition::new("S", vec![instance.clone()]),
                SiteDefinition::new("S", vec![instance.clone()]),
            ],
            vec![],
        );
        assert!(matches!(
            duplicate_sites,
            Err(SystemLoadError::DuplicateSite(_))
        ));

        let duplicate_labels = TitratableSystem::new(
            vec![SiteDefinition::new(
                "S",
                vec![instance.clone(), instance.clone()],
            )],
            vec![],
        );
        assert!(matches!(
            duplicate_labels,
            Err(SystemLoadError::DuplicateInstance { .. })
        ));
    }

    #[test]
    fn new_rejects_interactions_within_one_site() {
        let site = SiteDefinition::new(
            "S",
            vec![
                InstanceDefinition::new("a", 0, 0.0, 0.0),
                InstanceDefinition::new("b", 1, 0.0, 0.0),
            ],
        );
        let interaction = InteractionDefinition {
            first: InstanceRef::new("S", "a"),
            second: InstanceRef::new("S", "b"),
            energy: 1.0,
            symmetric: false,
        };
        let result = TitratableSystem::new(vec![site], vec![interaction]);
        assert!(matches!(
            result,
            Err(SystemLoadError::IntraSiteInteraction { .. })
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.toml");
        fs::write(&path, TWO_SITE_TOML).unwrap();

        let system = TitratableSystem::load(&path).unwrap();
        assert_eq!(system.site_index("HIS31"), Some(1));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = TitratableSystem::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(SystemLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(
            &path,
            "[[sites]]\nname = \"A\"\ncolor = \"red\"\ninstances = []\n",
        )
        .unwrap();
        let result = TitratableSystem::load(&path);
        assert!(matches!(result, Err(SystemLoadError::Toml { .. })));
    }
}
