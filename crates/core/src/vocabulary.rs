//! Known action-type identifiers, grouped by funnel meaning.
//!
//! The ads platform keeps adding synonyms for the same conversion, so the
//! sets are data: built-in defaults extended from configuration at startup.
//! Aggregation code only ever asks for a category by name.

use crate::config::VocabularyConfig;
use std::collections::{BTreeMap, BTreeSet};

pub const STORE_CLICK: &str = "store_click";
pub const INSTALL: &str = "install";
pub const ACTIVATE: &str = "activate";

/// Action type the ads API uses for a plain outbound link click.
pub const LINK_CLICK_TYPE: &str = "link_click";

const STORE_CLICK_TYPES: &[&str] = &[
    "app_store_click",
    "store_click",
    "mobile_app_store_click",
    "omni_app_store_click",
];

const INSTALL_TYPES: &[&str] = &[
    "mobile_app_install",
    "app_install",
    "omni_app_install",
    "app_custom_event.fb_mobile_install",
];

const ACTIVATE_TYPES: &[&str] = &[
    "app_custom_event.fb_mobile_activate_app",
    "mobile_app_activate",
    "omni_activate_app",
    "activate_app",
];

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Category name -> set of action types. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionVocabulary {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl ActionVocabulary {
    /// The built-in store-click, install, and activate sets.
    pub fn builtin() -> Self {
        let mut categories = BTreeMap::new();
        for (name, types) in [
            (STORE_CLICK, STORE_CLICK_TYPES),
            (INSTALL, INSTALL_TYPES),
            (ACTIVATE, ACTIVATE_TYPES),
        ] {
            categories.insert(
                name.to_string(),
                types.iter().map(|t| t.to_string()).collect(),
            );
        }
        Self { categories }
    }

    /// Built-in sets extended with configured entries. New category names
    /// are added as-is.
    pub fn from_config(config: &VocabularyConfig) -> Self {
        let mut vocabulary = Self::builtin();
        for (category, types) in &config.categories {
            vocabulary.extend(category, types.iter().cloned());
        }
        vocabulary
    }

    pub fn extend<I>(&mut self, category: &str, types: I)
    where
        I: IntoIterator<Item = String>,
    {
        let set = self.categories.entry(category.to_string()).or_default();
        set.extend(
            types
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        );
    }

    /// Types of a category; an unknown category is an empty set.
    pub fn types(&self, category: &str) -> &BTreeSet<String> {
        self.categories.get(category).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, category: &str, action_type: &str) -> bool {
        self.types(category).contains(action_type)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl Default for ActionVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}
