use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::ops::RangeInclusive;

use crate::error::SchemaError;
use crate::value::{PropertyType, PropertyValue, ValueType};

// ---------------------------------------------------------------------------
// Model trait
// ---------------------------------------------------------------------------

/// A model type with an explicit, statically built schema.
///
/// Implementations usually keep the schema in a `OnceLock`:
///
/// ```ignore
/// impl Model for Report {
///     fn schema() -> &'static ModelSchema {
///         static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
///         SCHEMA.get_or_init(|| ModelSchema::builder::<Report>("Report").build())
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    fn schema() -> &'static ModelSchema;
}

// ---------------------------------------------------------------------------
// Display hints and member options
// ---------------------------------------------------------------------------

/// How a view should present a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
    Text,
    MultiLine,
    CheckBox,
    /// A fixed list of choices for a text member.
    DropDown(&'static [&'static str]),
    Enum,
    FileName,
    DirectoryName,
    ModelRef,
    /// One cell per sequence element.
    Rows,
    Date,
}

impl DisplayHint {
    /// Hint used when a member does not declare one.
    pub fn for_type(ty: &ValueType) -> Self {
        match ty {
            ValueType::Bool => Self::CheckBox,
            ValueType::Enum(_) => Self::Enum,
            ValueType::ModelRef => Self::ModelRef,
            ValueType::Date => Self::Date,
            _ => Self::Text,
        }
    }
}

/// Presentation options for one member. A member is only user-editable when
/// it carries a description.
#[derive(Debug, Clone, Default)]
pub struct Member {
    pub description: Option<&'static str>,
    pub units: Option<&'static str>,
    pub order: Option<i32>,
    pub display: Option<DisplayHint>,
    pub category: Option<&'static str>,
    pub separator: Option<&'static str>,
    pub model_kind: Option<&'static str>,
}

impl Member {
    pub fn described(description: &'static str) -> Self {
        Self {
            description: Some(description),
            ..Default::default()
        }
    }

    /// A member that is registered but never shown.
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn display(mut self, display: DisplayHint) -> Self {
        self.display = Some(display);
        self
    }

    pub fn category(mut self, category: &'static str) -> Self {
        self.category = Some(category);
        self
    }

    pub fn separator(mut self, title: &'static str) -> Self {
        self.separator = Some(title);
        self
    }

    /// Restricts a model reference to models of this kind.
    pub fn model_kind(mut self, kind: &'static str) -> Self {
        self.model_kind = Some(kind);
        self
    }
}

// ---------------------------------------------------------------------------
// Type-erased accessors
// ---------------------------------------------------------------------------

/// Reads and writes one scalar or sequence member of a type-erased model.
pub trait PropertyAccessor: Send + Sync {
    fn value_type(&self) -> ValueType;
    /// Bounds of an integer member backed by a type narrower than `i64`.
    fn int_range(&self) -> Option<RangeInclusive<i64>>;
    fn readable(&self) -> bool;
    fn writable(&self) -> bool;
    fn get(&self, model: &dyn Any) -> Result<PropertyValue, SchemaError>;
    fn set(&self, model: &mut dyn Any, value: PropertyValue) -> Result<(), SchemaError>;
}

/// Reaches a sub-model stored inside a type-erased parent model.
pub trait NestedAccessor: Send + Sync {
    fn schema(&self) -> &'static ModelSchema;
    /// The current sub-model, if the parent holds one.
    fn get<'a>(&self, parent: &'a dyn Any) -> Result<Option<&'a dyn Any>, SchemaError>;
    /// The sub-model, created from its default when the parent holds none.
    fn get_mut<'a>(&self, parent: &'a mut dyn Any) -> Result<&'a mut dyn Any, SchemaError>;
    fn default_value(&self) -> Box<dyn Any>;
}

enum Setter<T, V> {
    Plain(fn(&mut T, V)),
    Checked(fn(&mut T, V) -> Result<(), String>),
}

struct TypedProperty<T, V> {
    name: &'static str,
    get: Option<fn(&T) -> V>,
    set: Option<Setter<T, V>>,
}

impl<T, V> PropertyAccessor for TypedProperty<T, V>
where
    T: Any + Send + Sync,
    V: PropertyType,
{
    fn value_type(&self) -> ValueType {
        V::value_type()
    }

    fn int_range(&self) -> Option<RangeInclusive<i64>> {
        V::int_range()
    }

    fn readable(&self) -> bool {
        self.get.is_some()
    }

    fn writable(&self) -> bool {
        self.set.is_some()
    }

    fn get(&self, model: &dyn Any) -> Result<PropertyValue, SchemaError> {
        let get = self.get.ok_or(SchemaError::NotReadable(self.name))?;
        let model = model
            .downcast_ref::<T>()
            .ok_or(SchemaError::WrongModelType {
                member: self.name,
                expected: type_name::<T>(),
            })?;
        Ok(get(model).into_value())
    }

    fn set(&self, model: &mut dyn Any, value: PropertyValue) -> Result<(), SchemaError> {
        let set = self.set.as_ref().ok_or(SchemaError::NotWritable(self.name))?;
        let model = model
            .downcast_mut::<T>()
            .ok_or(SchemaError::WrongModelType {
                member: self.name,
                expected: type_name::<T>(),
            })?;
        let found = value.type_label();
        let value = V::from_value(value).ok_or(SchemaError::TypeMismatch {
            member: self.name,
            expected: type_name::<V>(),
            found,
        })?;
        match set {
            Setter::Plain(set) => {
                set(model, value);
                Ok(())
            }
            Setter::Checked(set) => set(model, value).map_err(|reason| SchemaError::Rejected {
                member: self.name,
                reason,
            }),
        }
    }
}

struct TypedNested<P, C> {
    name: &'static str,
    get: fn(&P) -> Option<&C>,
    get_mut: fn(&mut P) -> &mut C,
}

impl<P, C> NestedAccessor for TypedNested<P, C>
where
    P: Any + Send + Sync,
    C: Model + Default,
{
    fn schema(&self) -> &'static ModelSchema {
        C::schema()
    }

    fn get<'a>(&self, parent: &'a dyn Any) -> Result<Option<&'a dyn Any>, SchemaError> {
        let parent = parent
            .downcast_ref::<P>()
            .ok_or(SchemaError::WrongModelType {
                member: self.name,
                expected: type_name::<P>(),
            })?;
        Ok((self.get)(parent).map(|child| child as &dyn Any))
    }

    fn get_mut<'a>(&self, parent: &'a mut dyn Any) -> Result<&'a mut dyn Any, SchemaError> {
        let parent = parent
            .downcast_mut::<P>()
            .ok_or(SchemaError::WrongModelType {
                member: self.name,
                expected: type_name::<P>(),
            })?;
        let child: &'a mut dyn Any = (self.get_mut)(parent);
        Ok(child)
    }

    fn default_value(&self) -> Box<dyn Any> {
        Box::new(C::default())
    }
}

// ---------------------------------------------------------------------------
// MemberSchema / ModelSchema
// ---------------------------------------------------------------------------

pub enum MemberKind {
    Value(Box<dyn PropertyAccessor>),
    /// A sub-model shown as its own labelled group.
    Nested(Box<dyn NestedAccessor>),
    /// A sub-model edited through one of its own members.
    Substitute {
        sub_member: &'static str,
        nested: Box<dyn NestedAccessor>,
    },
}

pub struct MemberSchema {
    pub name: &'static str,
    pub options: Member,
    pub kind: MemberKind,
}

impl MemberSchema {
    /// Label shown to users: the description, or the member name.
    pub fn label(&self) -> &'static str {
        self.options.description.unwrap_or(self.name)
    }

    /// Carries a description and can be both read and written.
    pub fn is_editable(&self) -> bool {
        if self.options.description.is_none() {
            return false;
        }
        match &self.kind {
            MemberKind::Value(accessor) => accessor.readable() && accessor.writable(),
            MemberKind::Nested(_) | MemberKind::Substitute { .. } => true,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.kind, MemberKind::Nested(_))
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match &self.kind {
            MemberKind::Value(accessor) => Some(accessor.value_type()),
            _ => None,
        }
    }
}

pub struct ModelSchema {
    type_name: &'static str,
    kinds: Vec<&'static str>,
    members: Vec<MemberSchema>,
}

impl ModelSchema {
    pub fn builder<T: Any + Send + Sync>(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            schema: ModelSchema {
                type_name,
                kinds: Vec::new(),
                members: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberSchema] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberSchema> {
        self.members.iter().find(|m| m.name == name)
    }

    /// True for the model's own type name and for every kind it declares.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.type_name == kind || self.kinds.iter().any(|k| *k == kind)
    }
}

// ---------------------------------------------------------------------------
// SchemaBuilder
// ---------------------------------------------------------------------------

pub struct SchemaBuilder<T> {
    schema: ModelSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> SchemaBuilder<T> {
    /// Tags the model as compatible with references of `kind`.
    pub fn kind(mut self, kind: &'static str) -> Self {
        self.schema.kinds.push(kind);
        self
    }

    pub fn property<V: PropertyType>(
        self,
        name: &'static str,
        member: Member,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
    ) -> Self {
        self.value(name, member, Some(get), Some(Setter::Plain(set)))
    }

    /// A property whose setter may refuse a value.
    pub fn checked_property<V: PropertyType>(
        self,
        name: &'static str,
        member: Member,
        get: fn(&T) -> V,
        set: fn(&mut T, V) -> Result<(), String>,
    ) -> Self {
        self.value(name, member, Some(get), Some(Setter::Checked(set)))
    }

    pub fn read_only_property<V: PropertyType>(
        self,
        name: &'static str,
        member: Member,
        get: fn(&T) -> V,
    ) -> Self {
        self.value(name, member, Some(get), None)
    }

    pub fn write_only_property<V: PropertyType>(
        self,
        name: &'static str,
        member: Member,
        set: fn(&mut T, V),
    ) -> Self {
        self.value(name, member, None, Some(Setter::Plain(set)))
    }

    pub fn nested<C: Model + Default>(
        mut self,
        name: &'static str,
        member: Member,
        get: fn(&T) -> Option<&C>,
        get_mut: fn(&mut T) -> &mut C,
    ) -> Self {
        self.schema.members.push(MemberSchema {
            name,
            options: member,
            kind: MemberKind::Nested(Box::new(TypedNested { name, get, get_mut })),
        });
        self
    }

    pub fn substitute<C: Model + Default>(
        mut self,
        name: &'static str,
        member: Member,
        sub_member: &'static str,
        get: fn(&T) -> Option<&C>,
        get_mut: fn(&mut T) -> &mut C,
    ) -> Self {
        self.schema.members.push(MemberSchema {
            name,
            options: member,
            kind: MemberKind::Substitute {
                sub_member,
                nested: Box::new(TypedNested { name, get, get_mut }),
            },
        });
        self
    }

    pub fn build(self) -> ModelSchema {
        self.schema
    }

    fn value<V: PropertyType>(
        mut self,
        name: &'static str,
        member: Member,
        get: Option<fn(&T) -> V>,
        set: Option<Setter<T, V>>,
    ) -> Self {
        self.schema.members.push(MemberSchema {
            name,
            options: member,
            kind: MemberKind::Value(Box::new(TypedProperty { name, get, set })),
        });
        self
    }
}
