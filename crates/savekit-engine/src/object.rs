//! Trackable objects and their identities.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use savekit_schema::reflect::Component;

use crate::SaveError;

// ---------------------------------------------------------------------------
// SaveId
// ---------------------------------------------------------------------------

/// Stable, non-empty identity of a trackable object. Forms the first
/// segment of every saved key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SaveId(String);

impl SaveId {
    /// Use a custom id.
    ///
    /// # Errors
    ///
    /// [`SaveError::InvalidId`] if `id` is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, SaveError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SaveError::InvalidId);
        }
        Ok(Self(id))
    }

    /// A random version-4 UUID in hyphenated form.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log output.
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(8)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SaveId {
    type Error = SaveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SaveId> for String {
    fn from(id: SaveId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// SaveObject
// ---------------------------------------------------------------------------

/// A trackable object: an optional identity plus attached components.
///
/// Objects without an id are skipped by save and load.
#[derive(Debug, Default)]
pub struct SaveObject {
    pub name: String,
    pub id: Option<SaveId>,
    components: Vec<Box<dyn Component>>,
}

impl SaveObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            components: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: SaveId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_component(mut self, component: impl Component) -> Self {
        self.add_component(component);
        self
    }

    pub fn add_component(&mut self, component: impl Component) {
        self.components.push(Box::new(component));
    }

    /// The object's id, generating one first if it has none.
    pub fn ensure_id(&mut self) -> &SaveId {
        self.id.get_or_insert_with(SaveId::generate)
    }

    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [Box<dyn Component>] {
        &mut self.components
    }

    /// The first attached component of type `T`.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| (**c).downcast_ref::<T>())
    }

    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| (**c).downcast_mut::<T>())
    }
}

// ---------------------------------------------------------------------------
// ObjectSource
// ---------------------------------------------------------------------------

/// Enumerates the trackable objects of a scene.
pub trait ObjectSource {
    fn save_objects(&self) -> Vec<&SaveObject>;

    fn save_objects_mut(&mut self) -> Vec<&mut SaveObject>;
}

impl ObjectSource for [SaveObject] {
    fn save_objects(&self) -> Vec<&SaveObject> {
        self.iter().collect()
    }

    fn save_objects_mut(&mut self) -> Vec<&mut SaveObject> {
        self.iter_mut().collect()
    }
}

impl ObjectSource for Vec<SaveObject> {
    fn save_objects(&self) -> Vec<&SaveObject> {
        self.as_slice().save_objects()
    }

    fn save_objects_mut(&mut self) -> Vec<&mut SaveObject> {
        self.as_mut_slice().save_objects_mut()
    }
}
