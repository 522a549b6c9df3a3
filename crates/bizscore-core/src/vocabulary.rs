/// Bumped whenever a label is added, removed or moved. Model artifacts record
/// the version they were trained against.
pub const VOCABULARY_VERSION: u32 = 1;

pub const INDUSTRY_COUNT: usize = 21;

/// Industry labels in training column order. The position of a label is the
/// one-hot column the model reads, so this list must never be reordered
/// without bumping [`VOCABULARY_VERSION`].
pub const INDUSTRIES: [&str; INDUSTRY_COUNT] = [
    "E-commerce",
    "Finance",
    "SaaS",
    "Education",
    "Technology",
    "Healthcare",
    "Retail",
    "Manufacturing",
    "Consulting",
    "Entertainment",
    "Real Estate",
    "Transportation",
    "Hospitality",
    "Energy",
    "Telecommunications",
    "Pharmaceuticals",
    "Automotive",
    "Construction",
    "Legal",
    "Nonprofit",
    "Other",
];

pub const DEFAULT_INDUSTRY: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    pub version: u32,
    pub labels: &'static [&'static str; INDUSTRY_COUNT],
}

pub const INDUSTRY_VOCABULARY: Vocabulary = Vocabulary {
    version: VOCABULARY_VERSION,
    labels: &INDUSTRIES,
};

impl Vocabulary {
    pub fn index_of(&self, industry: &str) -> Option<usize> {
        self.labels.iter().position(|label| *label == industry)
    }

    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    pub const fn len(&self) -> usize {
        INDUSTRY_COUNT
    }

    pub const fn is_empty(&self) -> bool {
        INDUSTRY_COUNT == 0
    }
}
