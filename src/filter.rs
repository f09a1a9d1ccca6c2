/// The two dimensions a preset can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Pack,
    Type,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Pack => "pack",
            Dimension::Type => "type",
        }
    }
}

/// Argument to the filter add operations: a single label or a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Labels {
    One(String),
    Many(Vec<String>),
}

impl Labels {
    fn into_vec(self) -> Vec<String> {
        match self {
            Labels::One(label) => vec![label],
            Labels::Many(labels) => labels,
        }
    }
}

impl From<&str> for Labels {
    fn from(label: &str) -> Self {
        Labels::One(label.to_string())
    }
}

impl From<String> for Labels {
    fn from(label: String) -> Self {
        Labels::One(label)
    }
}

impl From<Vec<String>> for Labels {
    fn from(labels: Vec<String>) -> Self {
        Labels::Many(labels)
    }
}

impl From<Vec<&str>> for Labels {
    fn from(labels: Vec<&str>) -> Self {
        Labels::Many(labels.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Labels {
    fn from(labels: [&str; N]) -> Self {
        Labels::Many(labels.iter().map(|s| s.to_string()).collect())
    }
}

/// Selected pack and type values. An empty dimension selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    packs: Vec<String>,
    types: Vec<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_pack(&mut self) {
        self.packs.clear();
    }

    pub fn add_pack(&mut self, labels: impl Into<Labels>) {
        self.packs.extend(labels.into().into_vec());
    }

    pub fn clear_type(&mut self) {
        self.types.clear();
    }

    pub fn add_type(&mut self, labels: impl Into<Labels>) {
        self.types.extend(labels.into().into_vec());
    }

    /// Clear one dimension and add the new full selection.
    pub fn replace(&mut self, dimension: Dimension, labels: impl Into<Labels>) {
        match dimension {
            Dimension::Pack => {
                self.clear_pack();
                self.add_pack(labels);
            }
            Dimension::Type => {
                self.clear_type();
                self.add_type(labels);
            }
        }
    }

    pub fn packs(&self) -> &[String] {
        &self.packs
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn has_pack(&self, pack: &str) -> bool {
        self.packs.iter().any(|p| p == pack)
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }

    /// True when both dimensions have at least one selected value.
    pub fn is_active(&self) -> bool {
        !self.packs.is_empty() && !self.types.is_empty()
    }
}
