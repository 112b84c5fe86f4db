use std::any::{Any, TypeId};

use bevy_ecs::name::Name;
use bevy_ecs::prelude::*;
use harrow_schema::{
    DisplayHint, MemberKind, MemberSchema, ModelSchema, PropertyAccessor, PropertyTarget,
    PropertyValue, SchemaError, SchemaRegistry, ValueType,
};
use tracing::warn;

use super::coerce::{CoercionContext, render_cells, render_value};
use super::descriptor::{DescriptorMap, PropertyBinding, PropertyDescriptor, PropertyGroup};
use crate::config::BindingConfig;
use crate::error::BindingError;
use crate::scope::{ModelScope, ModelScopeService};

/// Caller-supplied restriction on which members are shown. Runs after the
/// built-in editable check.
pub type PropertyFilter = Box<dyn Fn(&MemberSchema) -> bool + Send + Sync>;

#[derive(Default)]
pub struct PresenterOptions {
    pub filter: Option<PropertyFilter>,
    pub read_only: bool,
}

impl PresenterOptions {
    pub fn filter(mut self, filter: impl Fn(&MemberSchema) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Only members in `category` are shown.
    pub fn category(self, category: &'static str) -> Self {
        self.filter(move |member| member.options.category == Some(category))
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Builds the property tree for the model on `entity` and records an id for
/// every leaf in `map`. The previous contents of `map` are dropped.
pub fn extract_properties(
    world: &World,
    entity: Entity,
    options: &PresenterOptions,
    map: &mut DescriptorMap,
) -> Result<PropertyGroup, BindingError> {
    let registry = world
        .get_resource::<SchemaRegistry>()
        .ok_or(BindingError::MissingResource("SchemaRegistry"))?;
    let registration = registry
        .model_of(world, entity)
        .ok_or(SchemaError::MissingModel(entity))?;
    let model = registration
        .read(world, entity)
        .ok_or(SchemaError::MissingModel(entity))?;
    let schema = registration.schema();

    let fallback_config = BindingConfig::default();
    let mut extractor = Extractor {
        world,
        entity,
        model_type: registration.type_id,
        options,
        config: world
            .get_resource::<BindingConfig>()
            .unwrap_or(&fallback_config),
        scope: world.get_resource::<ModelScopeService>().map(|s| s.scope()),
        map,
    };
    extractor.map.clear();

    let name = world
        .get::<Name>(entity)
        .map(|n| n.as_str().to_string())
        .unwrap_or_else(|| schema.type_name().to_string());
    extractor.group(schema, model, &[], name, 0)
}

/// Editable members that pass the filter, by display order then declaration
/// order.
pub fn ordered_members<'s>(
    schema: &'s ModelSchema,
    options: &PresenterOptions,
) -> Vec<&'s MemberSchema> {
    let mut members: Vec<&MemberSchema> = schema
        .members()
        .iter()
        .filter(|m| m.is_editable())
        .filter(|m| options.filter.as_ref().is_none_or(|keep| keep(*m)))
        .collect();
    members.sort_by_key(|m| m.options.order.unwrap_or(i32::MAX));
    members
}

struct Extractor<'a> {
    world: &'a World,
    entity: Entity,
    model_type: TypeId,
    options: &'a PresenterOptions,
    config: &'a BindingConfig,
    scope: Option<&'a dyn ModelScope>,
    map: &'a mut DescriptorMap,
}

impl Extractor<'_> {
    fn group(
        &mut self,
        schema: &'static ModelSchema,
        model: &dyn Any,
        path: &[&'static str],
        name: String,
        depth: usize,
    ) -> Result<PropertyGroup, BindingError> {
        let mut group = PropertyGroup::new(name);
        let mut separator = None;

        for member in ordered_members(schema, self.options) {
            if member.options.separator.is_some() {
                separator = member.options.separator;
            }
            let mut member_path = path.to_vec();
            member_path.push(member.name);

            match &member.kind {
                MemberKind::Value(accessor) => {
                    let value = accessor.get(model)?;
                    let descriptor = self.leaf(
                        member,
                        None,
                        accessor.as_ref(),
                        value,
                        member_path,
                        separator.take(),
                    );
                    group.properties.push(descriptor);
                }
                MemberKind::Nested(nested) => {
                    if depth >= self.config.max_nesting_depth {
                        warn!(
                            model = schema.type_name(),
                            member = member.name,
                            max_depth = self.config.max_nesting_depth,
                            "sub-model nested too deeply, not shown"
                        );
                        continue;
                    }
                    let label = match member.options.units {
                        Some(units) if self.config.units_in_labels => {
                            format!("{} ({units})", member.label())
                        }
                        _ => member.label().to_string(),
                    };
                    let child = match nested.get(model)? {
                        Some(child) => {
                            self.group(nested.schema(), child, &member_path, label, depth + 1)?
                        }
                        None => {
                            let fallback = nested.default_value();
                            self.group(nested.schema(), &*fallback, &member_path, label, depth + 1)?
                        }
                    };
                    group.groups.push(child);
                }
                MemberKind::Substitute { sub_member, nested } => {
                    let sub_schema = nested.schema();
                    let missing = || BindingError::MissingSubProperty {
                        model: sub_schema.type_name(),
                        member: *sub_member,
                    };
                    let inner = sub_schema.member(sub_member).ok_or_else(missing)?;
                    let MemberKind::Value(accessor) = &inner.kind else {
                        return Err(missing());
                    };
                    if !(accessor.readable() && accessor.writable()) {
                        return Err(missing());
                    }
                    let value = match nested.get(model)? {
                        Some(child) => accessor.get(child)?,
                        None => accessor.get(&*nested.default_value())?,
                    };
                    member_path.push(*sub_member);
                    let descriptor = self.leaf(
                        member,
                        Some(inner),
                        accessor.as_ref(),
                        value,
                        member_path,
                        separator.take(),
                    );
                    group.properties.push(descriptor);
                }
            }
        }
        Ok(group)
    }

    /// `inner` is the sub-model member a substituted member stands in for; its
    /// options fill in whatever the outer member leaves unset.
    fn leaf(
        &mut self,
        member: &MemberSchema,
        inner: Option<&MemberSchema>,
        accessor: &dyn PropertyAccessor,
        value: PropertyValue,
        path: Vec<&'static str>,
        separator: Option<&'static str>,
    ) -> PropertyDescriptor {
        let value_type = accessor.value_type();
        let display = member
            .options
            .display
            .or_else(|| inner.and_then(|m| m.options.display))
            .unwrap_or_else(|| DisplayHint::for_type(&value_type));
        let units = member
            .options
            .units
            .or_else(|| inner.and_then(|m| m.options.units));
        let model_kind = member
            .options
            .model_kind
            .or_else(|| inner.and_then(|m| m.options.model_kind));

        let target = PropertyTarget {
            entity: self.entity,
            model: self.model_type,
            path,
        };
        let label = member.label().to_string();
        let read_only = self.options.read_only;
        let id = self.map.allocate(PropertyBinding {
            target: target.clone(),
            value_type,
            int_range: accessor.int_range(),
            display,
            model_kind,
            read_only,
            label: label.clone(),
        });

        PropertyDescriptor {
            id,
            target,
            name: member.name,
            label,
            value_type,
            display,
            units,
            category: member.options.category,
            read_only,
            order: member.options.order,
            separator,
            text: render_value(&self.render_context(), &value, display, model_kind),
            cells: if display == DisplayHint::Rows {
                render_cells(&value)
            } else {
                Vec::new()
            },
            options: self.options_for(value_type, display, model_kind),
            value,
        }
    }

    fn render_context(&self) -> CoercionContext<'_> {
        CoercionContext {
            world: self.world,
            config: self.config,
            scope: self.scope,
            origin: self.entity,
        }
    }

    fn options_for(
        &self,
        value_type: ValueType,
        display: DisplayHint,
        model_kind: Option<&'static str>,
    ) -> Vec<String> {
        match (value_type, display) {
            (_, DisplayHint::DropDown(choices)) => {
                choices.iter().map(|c| c.to_string()).collect()
            }
            (ValueType::Enum(info), _) => info.labels().map(str::to_string).collect(),
            (ValueType::ModelRef, _) => self
                .scope
                .map(|scope| scope.names(self.world, self.entity, model_kind))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
