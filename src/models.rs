use serde::{Serialize, Deserialize};
use serde_with::{serde_as, DefaultOnNull};

/// A named bundle of parts as exposed by `GET /api/kits`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Kit {
    pub id: String,
    pub name: String,
    pub parts: Vec<String>,
}

/// A kit that has not been assigned an id by the store yet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewKit {
    pub name: String,
    pub parts: Vec<String>,
}

impl NewKit {
    pub fn new(name: &str, parts: &[&str]) -> Self {
        Self { name: name.to_string(), parts: parts.iter().map(|p| p.to_string()).collect() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Known parts in, instructions out.
    Build,
    /// Goal in, inferred parts and instructions out.
    Reverse,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    pub mode: Mode,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub kits: Vec<String>, // kit ids, build mode only
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub custom_parts: Vec<String>,
    pub goal: String,
}

/// Fixed-shape response of `POST /api/generate`. Fields that do not apply to the
/// active mode are serialized empty, never omitted.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub model_used: String,
    pub overview: String,
    pub steps: Vec<String>,
    pub wiring: String,
    pub firmware: String,
    pub parts_needed: Vec<String>,
    pub estimated_cost: String,
    pub where_to_buy: Vec<String>,
    pub tips: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub mongodb: String,
}

/// Parts grouped by kit name, in the order the kits were first resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KitParts {
    entries: Vec<(String, Vec<String>)>,
}

impl KitParts {
    pub fn new() -> Self { Self::default() }

    /// Adds a kit. A repeated name replaces the earlier parts but keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, parts: Vec<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = parts,
            None => self.entries.push((name, parts)),
        }
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_slice()))
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<String>)> for KitParts {
    fn from_iter<T: IntoIterator<Item = (N, Vec<String>)>>(iter: T) -> Self {
        let mut kp = KitParts::new();
        for (name, parts) in iter {
            kp.insert(name, parts);
        }
        kp
    }
}
