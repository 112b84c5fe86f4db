use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use bevy_ecs::entity::Entity;
use harrow_schema::{DisplayHint, PropertyTarget, PropertyValue, ValueType};

/// Identity of one descriptor within a presenter. Ids keep counting up across
/// refreshes, so an id from an earlier refresh never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a view hands back for an edit, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Bool(bool),
    /// The display label picked from a drop-down.
    EnumLabel(String),
    Typed(PropertyValue),
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One committed edit. `row` addresses a single cell of a sequence member.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEdit {
    pub id: PropertyId,
    pub row: Option<usize>,
    pub value: RawValue,
}

impl PropertyEdit {
    pub fn new(id: PropertyId, value: impl Into<RawValue>) -> Self {
        Self {
            id,
            row: None,
            value: value.into(),
        }
    }

    pub fn cell(id: PropertyId, row: usize, value: impl Into<RawValue>) -> Self {
        Self {
            id,
            row: Some(row),
            value: value.into(),
        }
    }
}

/// A leaf of the property tree, ready for a view to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub id: PropertyId,
    pub target: PropertyTarget,
    pub name: &'static str,
    pub label: String,
    pub value_type: ValueType,
    pub display: DisplayHint,
    pub units: Option<&'static str>,
    pub category: Option<&'static str>,
    pub read_only: bool,
    pub order: Option<i32>,
    /// Title of a separator to draw above this descriptor.
    pub separator: Option<&'static str>,
    pub value: PropertyValue,
    /// `value` rendered as text.
    pub text: String,
    /// One entry per element for `DisplayHint::Rows`.
    pub cells: Vec<String>,
    /// Choices for drop-downs: enum labels, fixed options or model names.
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyGroup {
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
    pub groups: Vec<PropertyGroup>,
}

impl PropertyGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.groups.is_empty()
    }

    /// All descriptors, depth first, each group's own properties before its
    /// child groups.
    pub fn descriptors(&self) -> Vec<&PropertyDescriptor> {
        let mut out: Vec<&PropertyDescriptor> = self.properties.iter().collect();
        for group in &self.groups {
            out.extend(group.descriptors());
        }
        out
    }

    /// First descriptor whose member path reads `path`, e.g. `canopy.height`.
    pub fn find(&self, path: &str) -> Option<&PropertyDescriptor> {
        self.descriptors()
            .into_iter()
            .find(|d| d.target.dotted_path() == path)
    }

    pub fn group(&self, name: &str) -> Option<&PropertyGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

// ---------------------------------------------------------------------------
// Id map
// ---------------------------------------------------------------------------

/// What an id resolves back to when an edit arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    pub target: PropertyTarget,
    pub value_type: ValueType,
    /// Bounds of a narrow integer member.
    pub int_range: Option<RangeInclusive<i64>>,
    pub display: DisplayHint,
    pub model_kind: Option<&'static str>,
    pub read_only: bool,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct DescriptorMap {
    next_id: u64,
    bindings: HashMap<PropertyId, PropertyBinding>,
}

impl DescriptorMap {
    pub fn allocate(&mut self, binding: PropertyBinding) -> PropertyId {
        self.next_id += 1;
        let id = PropertyId(self.next_id);
        self.bindings.insert(id, binding);
        id
    }

    /// Forgets every binding. The id counter is kept.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn get(&self, id: PropertyId) -> Option<&PropertyBinding> {
        self.bindings.get(&id)
    }

    pub fn tracks(&self, entity: Entity) -> bool {
        self.bindings.values().any(|b| b.target.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
