use std::any::{Any, TypeId};

use bevy_ecs::component::Mutable;
use bevy_ecs::prelude::*;

use crate::error::SchemaError;
use crate::schema::{MemberKind, Model, ModelSchema};
use crate::value::PropertyValue;

// ---------------------------------------------------------------------------
// PropertyTarget
// ---------------------------------------------------------------------------

/// Addresses one member of one model component: the entity, the component
/// type, and the member path from the component root (nested sub-models
/// contribute one segment each).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyTarget {
    pub entity: Entity,
    pub model: TypeId,
    pub path: Vec<&'static str>,
}

impl PropertyTarget {
    pub fn member_name(&self) -> &'static str {
        self.path.last().copied().unwrap_or_default()
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

// ---------------------------------------------------------------------------
// ModelRegistration
// ---------------------------------------------------------------------------

type ComponentRef = for<'w> fn(&'w World, Entity) -> Option<&'w dyn Any>;
type ComponentMut = for<'w> fn(&'w mut World, Entity) -> Option<&'w mut dyn Any>;

/// Everything needed to reach a registered model component without knowing
/// its Rust type.
#[derive(Clone, Copy)]
pub struct ModelRegistration {
    pub type_id: TypeId,
    schema: fn() -> &'static ModelSchema,
    component_ref: ComponentRef,
    component_mut: ComponentMut,
}

impl ModelRegistration {
    pub fn schema(&self) -> &'static ModelSchema {
        (self.schema)()
    }

    pub fn read<'w>(&self, world: &'w World, entity: Entity) -> Option<&'w dyn Any> {
        (self.component_ref)(world, entity)
    }

    pub fn read_mut<'w>(&self, world: &'w mut World, entity: Entity) -> Option<&'w mut dyn Any> {
        (self.component_mut)(world, entity)
    }
}

fn component_ref<T: Component>(world: &World, entity: Entity) -> Option<&dyn Any> {
    world.get::<T>(entity).map(|c| c as &dyn Any)
}

fn component_mut<T: Component<Mutability = Mutable>>(
    world: &mut World,
    entity: Entity,
) -> Option<&mut dyn Any> {
    world
        .get_mut::<T>(entity)
        .map(|c| c.into_inner() as &mut dyn Any)
}

// ---------------------------------------------------------------------------
// SchemaRegistry resource
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
pub struct SchemaRegistry {
    registrations: Vec<ModelRegistration>,
}

impl SchemaRegistry {
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Model + Component<Mutability = Mutable>,
    {
        let type_id = TypeId::of::<T>();
        if self.get(type_id).is_none() {
            self.registrations.push(ModelRegistration {
                type_id,
                schema: T::schema,
                component_ref: component_ref::<T>,
                component_mut: component_mut::<T>,
            });
        }
        self
    }

    pub fn get(&self, type_id: TypeId) -> Option<&ModelRegistration> {
        self.registrations.iter().find(|r| r.type_id == type_id)
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.get(TypeId::of::<T>()).is_some()
    }

    /// The first registered model component present on `entity`.
    pub fn model_of(&self, world: &World, entity: Entity) -> Option<ModelRegistration> {
        self.registrations
            .iter()
            .find(|r| r.read(world, entity).is_some())
            .copied()
    }
}

// ---------------------------------------------------------------------------
// Path access
// ---------------------------------------------------------------------------

/// Reads the member `target` points at. A sub-model that is absent reads as
/// its default.
pub fn read_target(world: &World, target: &PropertyTarget) -> Result<PropertyValue, SchemaError> {
    let registration = *world
        .get_resource::<SchemaRegistry>()
        .ok_or(SchemaError::MissingRegistry)?
        .get(target.model)
        .ok_or(SchemaError::UnregisteredModel)?;
    let root = registration
        .read(world, target.entity)
        .ok_or(SchemaError::MissingModel(target.entity))?;
    read_path(registration.schema(), root, &target.path, target)
}

/// Writes `value` into the member `target` points at, creating absent
/// sub-models from their defaults on the way.
pub fn write_target(
    world: &mut World,
    target: &PropertyTarget,
    value: PropertyValue,
) -> Result<(), SchemaError> {
    let registration = *world
        .get_resource::<SchemaRegistry>()
        .ok_or(SchemaError::MissingRegistry)?
        .get(target.model)
        .ok_or(SchemaError::UnregisteredModel)?;
    let root = registration
        .read_mut(world, target.entity)
        .ok_or(SchemaError::MissingModel(target.entity))?;
    write_path(registration.schema(), root, &target.path, value, target)
}

fn read_path(
    schema: &'static ModelSchema,
    model: &dyn Any,
    path: &[&'static str],
    target: &PropertyTarget,
) -> Result<PropertyValue, SchemaError> {
    let (name, rest) = path
        .split_first()
        .ok_or_else(|| SchemaError::InvalidPath(target.dotted_path()))?;
    let member = schema.member(name).ok_or_else(|| SchemaError::UnknownMember {
        model: schema.type_name(),
        member: name.to_string(),
    })?;
    match (&member.kind, rest.is_empty()) {
        (MemberKind::Value(accessor), true) => accessor.get(model),
        (MemberKind::Nested(nested) | MemberKind::Substitute { nested, .. }, false) => {
            match nested.get(model)? {
                Some(child) => read_path(nested.schema(), child, rest, target),
                None => {
                    let fallback = nested.default_value();
                    read_path(nested.schema(), &*fallback, rest, target)
                }
            }
        }
        _ => Err(SchemaError::InvalidPath(target.dotted_path())),
    }
}

fn write_path(
    schema: &'static ModelSchema,
    model: &mut dyn Any,
    path: &[&'static str],
    value: PropertyValue,
    target: &PropertyTarget,
) -> Result<(), SchemaError> {
    let (name, rest) = path
        .split_first()
        .ok_or_else(|| SchemaError::InvalidPath(target.dotted_path()))?;
    let member = schema.member(name).ok_or_else(|| SchemaError::UnknownMember {
        model: schema.type_name(),
        member: name.to_string(),
    })?;
    match (&member.kind, rest.is_empty()) {
        (MemberKind::Value(accessor), true) => accessor.set(model, value),
        (MemberKind::Nested(nested) | MemberKind::Substitute { nested, .. }, false) => {
            let child = nested.get_mut(model)?;
            write_path(nested.schema(), child, rest, value, target)
        }
        _ => Err(SchemaError::InvalidPath(target.dotted_path())),
    }
}
