//! Explicit property schemas for editable model components.
//!
//! A model type lists its members once, through [`ModelSchema::builder`],
//! instead of being discovered by reflection at runtime. The
//! [`SchemaRegistry`] resource then lets callers read and write any member
//! path of a model component stored on an entity.

mod error;
mod registry;
mod schema;
mod value;

pub use error::SchemaError;
pub use registry::{ModelRegistration, PropertyTarget, SchemaRegistry, read_target, write_target};
pub use schema::{
    DisplayHint, Member, MemberKind, MemberSchema, Model, ModelSchema, NestedAccessor,
    PropertyAccessor, SchemaBuilder,
};
pub use value::{
    DescribedEnum, EnumInfo, EnumValue, EnumVariant, ModelRef, PropertyType, PropertyValue,
    ValueType,
};
