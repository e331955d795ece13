use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(CategoryId);
id_newtype!(ConceptId);
id_newtype!(PatientId);

/// Panels, tests and drafted drugs share one id space: a draft entry is
/// matched against a toggled concept by id alone.
pub type PanelId = ConceptId;
pub type TestId = ConceptId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConceptNameType {
    FullySpecified,
    Short,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptName {
    pub name: String,
    pub kind: ConceptNameType,
    pub locale: String,
}

/// Resolves the label shown for a concept: the short name in `locale`, then a
/// short name in any locale, then the display name.
pub fn short_name<'a>(names: &'a [ConceptName], display: &'a str, locale: &str) -> &'a str {
    let shorts = || {
        names
            .iter()
            .filter(|name| name.kind == ConceptNameType::Short)
    };

    shorts()
        .find(|name| name.locale.eq_ignore_ascii_case(locale))
        .or_else(|| shorts().next())
        .map(|name| name.name.as_str())
        .unwrap_or(display)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderableCategory {
    pub id: CategoryId,
    pub display_name: String,
    #[serde(default)]
    pub names: Vec<ConceptName>,
}

impl OrderableCategory {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(id),
            display_name: display_name.into(),
            names: Vec::new(),
        }
    }

    pub fn short_name(&self, locale: &str) -> &str {
        short_name(&self.names, &self.display_name, locale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptTest {
    pub id: TestId,
    pub name: String,
    #[serde(default)]
    pub names: Vec<ConceptName>,
}

impl ConceptTest {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ConceptId::new(id),
            name: name.into(),
            names: Vec::new(),
        }
    }

    pub fn short_name(&self, locale: &str) -> &str {
        short_name(&self.names, &self.name, locale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptPanel {
    pub id: PanelId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<ConceptTest>,
    #[serde(default)]
    pub names: Vec<ConceptName>,
}

impl ConceptPanel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, members: Vec<ConceptTest>) -> Self {
        Self {
            id: ConceptId::new(id),
            name: name.into(),
            members,
            names: Vec::new(),
        }
    }

    pub fn has_member(&self, test_id: &TestId) -> bool {
        self.members.iter().any(|test| &test.id == test_id)
    }

    pub fn short_name(&self, locale: &str) -> &str {
        short_name(&self.names, &self.name, locale)
    }
}

/// Concepts loaded for one orderable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptCatalog {
    pub category_id: CategoryId,
    #[serde(default)]
    pub panels: Vec<ConceptPanel>,
    #[serde(default)]
    pub tests: Vec<ConceptTest>,
}

impl ConceptCatalog {
    /// A category whose concepts have not arrived yet.
    pub fn empty(category_id: CategoryId) -> Self {
        Self {
            category_id,
            panels: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn panel(&self, id: &PanelId) -> Option<&ConceptPanel> {
        self.panels.iter().find(|panel| &panel.id == id)
    }

    pub fn test(&self, id: &TestId) -> Option<&ConceptTest> {
        self.tests.iter().find(|test| &test.id == id)
    }

    pub fn contains_panel(&self, id: &PanelId) -> bool {
        self.panel(id).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    Panel,
    Single,
    #[serde(rename = "drugorder")]
    Drug,
}

impl DraftKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftKind::Panel => "panel",
            DraftKind::Single => "single",
            DraftKind::Drug => "drugorder",
        }
    }

    pub fn is_lab(self) -> bool {
        !matches!(self, DraftKind::Drug)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Routine,
    Stat,
}

impl Urgency {
    pub fn toggled(self) -> Self {
        match self {
            Urgency::Routine => Urgency::Stat,
            Urgency::Stat => Urgency::Routine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderAction {
    #[default]
    New,
    Revise,
    Discontinue,
    Renew,
}

impl OrderAction {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderAction::New => "NEW",
            OrderAction::Revise => "REVISE",
            OrderAction::Discontinue => "DISCONTINUE",
            OrderAction::Renew => "RENEW",
        }
    }
}

/// A pending order awaiting sign-and-save or discard. Unique by `(id, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrderEntry {
    pub id: ConceptId,
    pub kind: DraftKind,
    pub name: String,
    #[serde(default)]
    pub action: Option<OrderAction>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<ConceptName>,
}

impl DraftOrderEntry {
    pub fn panel(panel: &ConceptPanel) -> Self {
        Self {
            id: panel.id.clone(),
            kind: DraftKind::Panel,
            name: panel.name.clone(),
            action: None,
            urgency: None,
            names: panel.names.clone(),
        }
    }

    pub fn single(test: &ConceptTest) -> Self {
        Self {
            id: test.id.clone(),
            kind: DraftKind::Single,
            name: test.name.clone(),
            action: None,
            urgency: None,
            names: test.names.clone(),
        }
    }

    pub fn drug(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ConceptId::new(id),
            kind: DraftKind::Drug,
            name: name.into(),
            action: None,
            urgency: None,
            names: Vec::new(),
        }
    }

    /// Lab entries show their concept's short name; drug entries have none
    /// and fall back to the drug name.
    pub fn label(&self, locale: &str) -> &str {
        short_name(&self.names, &self.name, locale)
    }

    pub fn matches(&self, id: &ConceptId, kind: DraftKind) -> bool {
        &self.id == id && self.kind == kind
    }
}
