//! Document-type profiles.
//!
//! A profile is the template plus type-specific guidance that parameterizes
//! every prompt of a run.

use serde::{Deserialize, Serialize};

/// A document type the workflow can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProfile {
    /// Unique identifier
    pub id: String,

    /// Display name (also used for the output file name)
    pub name: String,

    /// One-line description
    #[serde(default)]
    pub description: String,

    /// Guidance on writing this type of document
    #[serde(default)]
    pub doc_type_description: String,

    /// Markdown template the writer adheres to
    #[serde(default)]
    pub template: String,
}

impl DocumentProfile {
    /// Create a profile with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            doc_type_description: String::new(),
            template: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the document-type guidance.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.doc_type_description = guidance.into();
        self
    }

    /// Set the Markdown template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// The built-in "How-to guide" profile.
    pub fn howto() -> Self {
        Self::new("profile_howto_default", "How-to guide")
            .with_description("Provides step-by-step instructions to achieve a specific task.")
            .with_guidance(include_str!("../../assets/profiles/howto_guidance.md"))
            .with_template(include_str!("../../assets/profiles/howto_template.md"))
    }

    /// The built-in "Explanation document" profile.
    pub fn explanation() -> Self {
        Self::new("profile_explanation_default", "Explanation document")
            .with_description("Explains a concept, system, or process in detail.")
            .with_guidance(include_str!("../../assets/profiles/explanation_guidance.md"))
            .with_template(include_str!("../../assets/profiles/explanation_template.md"))
    }
}

/// Collection of profiles a run can select from.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<DocumentProfile>,
}

impl ProfileCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in profiles.
    pub fn builtin() -> Self {
        Self { profiles: vec![DocumentProfile::howto(), DocumentProfile::explanation()] }
    }

    /// Add a profile, replacing any existing profile with the same id.
    pub fn insert(&mut self, profile: DocumentProfile) {
        if let Some(existing) = self.profiles.iter_mut().find(|p| p.id == profile.id) {
            *existing = profile;
        } else {
            self.profiles.push(profile);
        }
    }

    /// Add several profiles (see [`ProfileCatalog::insert`]).
    pub fn extend(&mut self, profiles: impl IntoIterator<Item = DocumentProfile>) {
        for profile in profiles {
            self.insert(profile);
        }
    }

    /// Resolve a profile by id.
    pub fn get(&self, id: &str) -> Option<&DocumentProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// All profiles in insertion order.
    pub fn all(&self) -> &[DocumentProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
