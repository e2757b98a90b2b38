//! Fixed, ordered catalog of prompt optimization techniques.
//!
//! The catalog order defines the index space used for selection: a draw of
//! `v` selects `technique_at(v)`. It is built once at start-up and shared
//! read-only afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder substituted with the prompt in technique templates.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// A named, deterministic prompt transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    /// Short identifier (e.g. `"step_by_step"`).
    pub key: String,
    /// Display name, unique within a catalog (e.g. `"Step-by-Step Thinking"`).
    pub name: String,
    /// What the technique is for.
    pub description: String,
    /// Template containing [`PROMPT_PLACEHOLDER`].
    pub template: String,
}

impl Technique {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            template: template.into(),
        }
    }

    /// Apply the technique to `prompt`.
    ///
    /// Pure: the same prompt always yields the same text. Placeholder-like
    /// text inside the prompt itself is left untouched.
    pub fn apply(&self, prompt: &str) -> String {
        self.template.replace(PROMPT_PLACEHOLDER, prompt)
    }
}

/// Immutable, ordered technique registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueCatalog {
    techniques: Vec<Technique>,
}

impl TechniqueCatalog {
    /// Build a catalog, rejecting empty lists, duplicate keys or names, and
    /// templates without a prompt placeholder.
    pub fn new(techniques: Vec<Technique>) -> Result<Self> {
        if techniques.is_empty() {
            return Err(Error::Config("technique catalog is empty".to_string()));
        }
        for (i, t) in techniques.iter().enumerate() {
            if t.key.trim().is_empty() || t.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "technique #{i} has an empty key or name"
                )));
            }
            if !t.template.contains(PROMPT_PLACEHOLDER) {
                return Err(Error::Config(format!(
                    "technique '{}' template lacks {PROMPT_PLACEHOLDER}",
                    t.key
                )));
            }
            if let Some(dup) = techniques[..i]
                .iter()
                .find(|o| o.key == t.key || o.name == t.name)
            {
                return Err(Error::Config(format!(
                    "technique '{}' duplicates '{}'",
                    t.key, dup.key
                )));
            }
        }
        Ok(Self { techniques })
    }

    /// The ten built-in techniques.
    pub fn builtin() -> Self {
        Self {
            techniques: BUILTIN
                .iter()
                .map(|(key, name, description, template)| {
                    Technique::new(*key, *name, *description, *template)
                })
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.techniques.len()
    }

    /// Technique at `index`, or [`Error::IndexOutOfRange`].
    pub fn technique_at(&self, index: usize) -> Result<&Technique> {
        self.techniques.get(index).ok_or(Error::IndexOutOfRange {
            index,
            size: self.techniques.len(),
        })
    }

    /// Look up a technique by key or display name.
    pub fn find(&self, key_or_name: &str) -> Option<&Technique> {
        self.techniques
            .iter()
            .find(|t| t.key == key_or_name || t.name == key_or_name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.techniques.iter().any(|t| t.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Technique> {
        self.techniques.iter()
    }
}

impl Default for TechniqueCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a TechniqueCatalog {
    type Item = &'a Technique;
    type IntoIter = std::slice::Iter<'a, Technique>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// (key, name, description, template)
const BUILTIN: &[(&str, &str, &str, &str)] = &[
    (
        "step_by_step",
        "Step-by-Step Thinking",
        "Encourages systematic reasoning",
        "Let's think through this step-by-step:\n\n{prompt}",
    ),
    (
        "expert_role",
        "Expert Perspective",
        "Invokes domain expertise",
        "As an expert in this domain, provide a comprehensive answer:\n\n{prompt}",
    ),
    (
        "examples",
        "With Examples",
        "Adds concrete examples",
        "{prompt}\n\nPlease include specific examples to illustrate your points.",
    ),
    (
        "structured",
        "Structured Format",
        "Improves readability",
        "{prompt}\n\nOrganize your response with:\n• Clear headings\n• Bullet points for key ideas\n• A summary at the end",
    ),
    (
        "reasoning",
        "Show Reasoning",
        "Makes logic transparent",
        "{prompt}\n\nExplain your reasoning and thought process throughout your answer.",
    ),
    (
        "pros_cons",
        "Balanced Analysis",
        "Ensures balanced perspective",
        "{prompt}\n\nProvide a balanced view including:\n- Pros/Benefits\n- Cons/Limitations\n- Overall recommendation",
    ),
    (
        "eli5",
        "Simple Then Deep",
        "Accessible to all levels",
        "{prompt}\n\nFirst explain in simple terms (ELI5), then provide a more detailed technical explanation.",
    ),
    (
        "actionable",
        "Actionable Advice",
        "Emphasizes practicality",
        "{prompt}\n\nFocus on practical, actionable advice with clear next steps.",
    ),
    (
        "critical",
        "Critical Analysis",
        "Deeper analytical thinking",
        "{prompt}\n\nApply critical thinking: question assumptions, consider alternatives, and note limitations.",
    ),
    (
        "concise",
        "Concise Response",
        "Efficient communication",
        "{prompt}\n\nBe concise but comprehensive. Avoid unnecessary details while covering all important points.",
    ),
];
