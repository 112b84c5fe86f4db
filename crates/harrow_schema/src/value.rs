use std::fmt;
use std::ops::RangeInclusive;

use bevy_ecs::entity::Entity;
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Enum labels
// ---------------------------------------------------------------------------

/// One variant of a labelled enum: its symbolic name and the text shown to users.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: &'static str,
    pub label: &'static str,
}

/// Static description of a labelled enum, produced by [`described_enum!`](crate::described_enum).
#[derive(Debug, PartialEq, Eq)]
pub struct EnumInfo {
    pub type_name: &'static str,
    pub variants: &'static [EnumVariant],
}

impl EnumInfo {
    pub fn label_of(&self, index: usize) -> Option<&'static str> {
        self.variants.get(index).map(|v| v.label)
    }

    /// Finds a variant by its display label. Symbolic names do not match.
    pub fn index_of_label(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.variants.iter().position(|v| v.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.iter().map(|v| v.label)
    }
}

/// Implemented by enums declared through [`described_enum!`](crate::described_enum).
pub trait DescribedEnum: Sized + Copy + 'static {
    fn info() -> &'static EnumInfo;
    fn index(self) -> usize;
    fn from_index(index: usize) -> Option<Self>;
}

/// A type-erased enum value: which enum, and which variant of it.
#[derive(Clone, Copy)]
pub struct EnumValue {
    pub info: &'static EnumInfo,
    pub index: usize,
}

impl EnumValue {
    pub fn of<E: DescribedEnum>(value: E) -> Self {
        Self {
            info: E::info(),
            index: value.index(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.info.label_of(self.index).unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        self.info
            .variants
            .get(self.index)
            .map(|v| v.name)
            .unwrap_or_default()
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.info.type_name == other.info.type_name && self.index == other.index
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.info.type_name, self.name())
    }
}

/// Declares a fieldless enum whose variants carry display labels.
///
/// ```
/// harrow_schema::described_enum! {
///     #[derive(Default)]
///     pub enum WaterTableState {
///         #[default]
///         FilledFromTop => "Filled From Top",
///         FilledFromBottom => "Filled From Bottom",
///     }
/// }
/// ```
///
/// The generated enum derives `Debug`, `Clone`, `Copy`, `PartialEq` and `Eq`,
/// and implements [`DescribedEnum`] and [`PropertyType`].
#[macro_export]
macro_rules! described_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::DescribedEnum for $name {
            fn info() -> &'static $crate::EnumInfo {
                static INFO: $crate::EnumInfo = $crate::EnumInfo {
                    type_name: stringify!($name),
                    variants: &[
                        $( $crate::EnumVariant { name: stringify!($variant), label: $label } ),+
                    ],
                };
                &INFO
            }

            fn index(self) -> usize {
                self as usize
            }

            fn from_index(index: usize) -> Option<Self> {
                [ $( $name::$variant ),+ ].get(index).copied()
            }
        }

        impl $crate::PropertyType for $name {
            fn value_type() -> $crate::ValueType {
                $crate::ValueType::Enum(<Self as $crate::DescribedEnum>::info())
            }

            fn into_value(self) -> $crate::PropertyValue {
                $crate::PropertyValue::Enum($crate::EnumValue::of(self))
            }

            fn from_value(value: $crate::PropertyValue) -> Option<Self> {
                match value {
                    $crate::PropertyValue::Enum(v) if v.info.type_name == stringify!($name) => {
                        <Self as $crate::DescribedEnum>::from_index(v.index)
                    }
                    _ => None,
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ModelRef
// ---------------------------------------------------------------------------

/// A reference from one model to another model entity in the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelRef(pub Option<Entity>);

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// Declared type of an editable member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    Date,
    Enum(&'static EnumInfo),
    FloatArray,
    IntArray,
    TextArray,
    ModelRef,
}

impl ValueType {
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::FloatArray | Self::IntArray | Self::TextArray)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Text => "Text",
            Self::Date => "Date",
            Self::Enum(info) => info.type_name,
            Self::FloatArray => "Float[]",
            Self::IntArray => "Int[]",
            Self::TextArray => "Text[]",
            Self::ModelRef => "ModelRef",
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyValue
// ---------------------------------------------------------------------------

/// A typed member value as it moves between models, commands and views.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Enum(EnumValue),
    FloatArray(Vec<f64>),
    IntArray(Vec<i64>),
    TextArray(Vec<String>),
    ModelRef(Option<Entity>),
}

impl PropertyValue {
    /// Human-readable type label, used in error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Text(_) => "Text",
            Self::Date(_) => "Date",
            Self::Enum(v) => v.info.type_name,
            Self::FloatArray(_) => "Float[]",
            Self::IntArray(_) => "Int[]",
            Self::TextArray(_) => "Text[]",
            Self::ModelRef(_) => "ModelRef",
        }
    }

    /// Whether this value can be stored in a member of type `ty` as-is.
    pub fn matches(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Self::Enum(v), ValueType::Enum(info)) => v.info.type_name == info.type_name,
            (Self::Bool(_), ValueType::Bool)
            | (Self::Int(_), ValueType::Int)
            | (Self::Float(_), ValueType::Float)
            | (Self::Text(_), ValueType::Text)
            | (Self::Date(_), ValueType::Date)
            | (Self::FloatArray(_), ValueType::FloatArray)
            | (Self::IntArray(_), ValueType::IntArray)
            | (Self::TextArray(_), ValueType::TextArray)
            | (Self::ModelRef(_), ValueType::ModelRef) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyType
// ---------------------------------------------------------------------------

/// Rust types that can back an editable member.
pub trait PropertyType: Sized + 'static {
    fn value_type() -> ValueType;
    fn into_value(self) -> PropertyValue;
    fn from_value(value: PropertyValue) -> Option<Self>;

    /// Integers the backing type can hold, when narrower than `i64`.
    fn int_range() -> Option<RangeInclusive<i64>> {
        None
    }
}

const I32_RANGE: RangeInclusive<i64> = i32::MIN as i64..=i32::MAX as i64;

macro_rules! impl_property_type {
    ($ty:ty, $value_type:ident, $variant:ident) => {
        impl PropertyType for $ty {
            fn value_type() -> ValueType {
                ValueType::$value_type
            }

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_property_type!(bool, Bool, Bool);
impl_property_type!(i64, Int, Int);
impl_property_type!(f64, Float, Float);
impl_property_type!(String, Text, Text);
impl_property_type!(NaiveDate, Date, Date);
impl_property_type!(Vec<f64>, FloatArray, FloatArray);
impl_property_type!(Vec<i64>, IntArray, IntArray);
impl_property_type!(Vec<String>, TextArray, TextArray);

impl PropertyType for i32 {
    fn value_type() -> ValueType {
        ValueType::Int
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Int(i64::from(self))
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    fn int_range() -> Option<RangeInclusive<i64>> {
        Some(I32_RANGE)
    }
}

impl PropertyType for Vec<i32> {
    fn value_type() -> ValueType {
        ValueType::IntArray
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::IntArray(self.into_iter().map(i64::from).collect())
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::IntArray(v) => v.into_iter().map(|x| i32::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    fn int_range() -> Option<RangeInclusive<i64>> {
        Some(I32_RANGE)
    }
}

impl PropertyType for ModelRef {
    fn value_type() -> ValueType {
        ValueType::ModelRef
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::ModelRef(self.0)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::ModelRef(v) => Some(ModelRef(v)),
            _ => None,
        }
    }
}
