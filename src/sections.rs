use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::github::Repository;

/// Number of recent repositories substituted when a section has no curated matches
pub const FALLBACK_COUNT: usize = 6;

/// The fixed set of page sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionName {
    Foundation,
    Fullstack,
    Security,
    Realestate,
    Blockchain,
    Capstone,
}

impl SectionName {
    /// Stable identifier used in element ids and navigation targets
    pub fn id(self) -> &'static str {
        match self {
            SectionName::Foundation => "foundation",
            SectionName::Fullstack => "fullstack",
            SectionName::Security => "security",
            SectionName::Realestate => "realestate",
            SectionName::Blockchain => "blockchain",
            SectionName::Capstone => "capstone",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionName::Foundation => "Foundation",
            SectionName::Fullstack => "Full-Stack",
            SectionName::Security => "Security",
            SectionName::Realestate => "Real Estate",
            SectionName::Blockchain => "Blockchain",
            SectionName::Capstone => "Capstone",
        }
    }

    /// Id of the grid container the section renders into
    pub fn grid_id(self) -> String {
        format!("{}Grid", self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Section {
    pub name: SectionName,
    pub repos: Vec<String>,
}

impl Section {
    pub fn new(name: SectionName, repos: &[&str]) -> Self {
        Self {
            name,
            repos: repos.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Ordered section configuration. Built once at startup, never mutated.
/// Each section name appears at most once.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "Vec<Section>", into = "Vec<Section>")]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    /// A repeated name keeps its first position and its last repository list
    pub fn new(sections: Vec<Section>) -> Self {
        let mut unique: Vec<Section> = Vec::with_capacity(sections.len());
        for section in sections {
            match unique.iter_mut().find(|s| s.name == section.name) {
                Some(existing) => {
                    log::warn!("section {} configured twice, keeping the last", section.name.id());
                    existing.repos = section.repos;
                }
                None => unique.push(section),
            }
        }
        Self { sections: unique }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl From<Vec<Section>> for SectionMap {
    fn from(sections: Vec<Section>) -> Self {
        Self::new(sections)
    }
}

impl From<SectionMap> for Vec<Section> {
    fn from(map: SectionMap) -> Self {
        map.sections
    }
}

impl Default for SectionMap {
    fn default() -> Self {
        Self::new(vec![
            Section::new(
                SectionName::Foundation,
                &["TributePage", "surveyForm", "exampleLandingPage"],
            ),
            Section::new(
                SectionName::Fullstack,
                &["MBM-HandyMan-Services", "modern-cuts-site", "Paint-estimator-"],
            ),
            Section::new(
                SectionName::Security,
                &["Neighborhood-watch", "security-scripts"],
            ),
            Section::new(
                SectionName::Realestate,
                &[
                    "trailer-park-sales-model-",
                    "Royal-Shelter-Society-",
                    "Tucson-Permit-Assistant",
                ],
            ),
            Section::new(
                SectionName::Blockchain,
                &["Desert-Ledger", "Day-Zero", "crypto-experiments"],
            ),
            Section::new(
                SectionName::Capstone,
                &["final-creative-build", "THE-BLOKK", "portfolio-site"],
            ),
        ])
    }
}

/// Name -> repository lookup over one fetched list
pub struct RepoIndex<'a> {
    repos: &'a [Repository],
    by_name: HashMap<&'a str, &'a Repository>,
}

impl<'a> RepoIndex<'a> {
    pub fn new(repos: &'a [Repository]) -> Self {
        let mut by_name = HashMap::with_capacity(repos.len());
        for repo in repos {
            // Last write wins on a name collision
            by_name.insert(repo.name.as_str(), repo);
        }
        Self { repos, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&'a Repository> {
        self.by_name.get(name).copied()
    }

    /// Resolve a section against the fetched list.
    ///
    /// Desired names are looked up in order and misses dropped. A repeated
    /// desired name only resolves once. When nothing matches, the first
    /// `FALLBACK_COUNT` repositories of the fetched list are used instead.
    pub fn resolve(&self, section: &Section) -> Resolved<'a> {
        let mut curated: Vec<&'a Repository> = Vec::with_capacity(section.repos.len());
        for name in &section.repos {
            if let Some(repo) = self.get(name) {
                if !curated.iter().any(|r| std::ptr::eq(*r, repo)) {
                    curated.push(repo);
                }
            }
        }

        if curated.is_empty() {
            let end = self.repos.len().min(FALLBACK_COUNT);
            Resolved {
                repos: self.repos[..end].iter().collect(),
                source: Source::Fallback,
            }
        } else {
            Resolved {
                repos: curated,
                source: Source::Curated,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Curated,
    Fallback,
}

/// The repositories a section actually displays
#[derive(Debug)]
pub struct Resolved<'a> {
    pub repos: Vec<&'a Repository>,
    pub source: Source,
}
