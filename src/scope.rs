use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::name::Name;
use bevy_ecs::prelude::*;
use harrow_schema::SchemaRegistry;

/// Looks up models by name on behalf of model-reference members.
pub trait ModelScope: Send + Sync + 'static {
    /// The model that `name` means when written on `from`, if it is
    /// compatible with `kind`. Missing or ambiguous names resolve to `None`.
    fn resolve(&self, world: &World, from: Entity, name: &str, kind: Option<&str>)
    -> Option<Entity>;

    /// How `target` is written on `from` so that [`resolve`](Self::resolve)
    /// finds it again.
    fn display_name(&self, world: &World, from: Entity, target: Entity, kind: Option<&str>)
    -> String;

    /// Choices offered for a reference from `from`, one per model.
    fn names(&self, world: &World, from: Entity, kind: Option<&str>) -> Vec<String>;
}

#[derive(Resource)]
pub struct ModelScopeService(Box<dyn ModelScope>);

impl ModelScopeService {
    pub fn new(scope: impl ModelScope) -> Self {
        Self(Box::new(scope))
    }

    pub fn scope(&self) -> &dyn ModelScope {
        self.0.as_ref()
    }
}

// ---------------------------------------------------------------------------
// DocumentScope
// ---------------------------------------------------------------------------

/// Every named model in the same document tree as the origin.
///
/// A plain name (`Wheat`) is looked up among the origin's descendants first,
/// then its parent's, and so on out to the root; the first level with any
/// match decides, and more than one match there is ambiguous. A full path
/// (`.Simulations.Field.Wheat`) names one model anywhere in the document.
pub struct DocumentScope;

impl DocumentScope {
    fn candidates(world: &World, from: Entity, kind: Option<&str>) -> Vec<(Entity, String)> {
        let Some(registry) = world.get_resource::<SchemaRegistry>() else {
            return Vec::new();
        };
        let Some(mut named) = world.try_query::<(Entity, &Name)>() else {
            return Vec::new();
        };
        let root = root_of(world, from);
        named
            .iter(world)
            .filter(|(entity, _)| root_of(world, *entity) == root)
            .filter(|(entity, _)| {
                registry
                    .model_of(world, *entity)
                    .is_some_and(|model| kind.is_none_or(|kind| model.schema().is_kind(kind)))
            })
            .map(|(entity, name)| (entity, name.as_str().to_string()))
            .collect()
    }

    fn find_by_name(
        candidates: &[(Entity, String)],
        world: &World,
        from: Entity,
        name: &str,
    ) -> Option<Entity> {
        let named: Vec<Entity> = candidates
            .iter()
            .filter(|(_, candidate)| candidate == name)
            .map(|(entity, _)| *entity)
            .collect();
        for level in ancestors(world, from) {
            let mut in_level = named.iter().filter(|e| is_within(world, **e, level));
            if let Some(found) = in_level.next() {
                return in_level.next().is_none().then_some(*found);
            }
        }
        None
    }
}

impl ModelScope for DocumentScope {
    fn resolve(
        &self,
        world: &World,
        from: Entity,
        name: &str,
        kind: Option<&str>,
    ) -> Option<Entity> {
        let name = name.trim();
        let candidates = Self::candidates(world, from, kind);
        if name.starts_with('.') {
            let mut matches = candidates
                .iter()
                .filter(|(entity, _)| full_path(world, *entity) == name)
                .map(|(entity, _)| *entity);
            let found = matches.next()?;
            return matches.next().is_none().then_some(found);
        }
        Self::find_by_name(&candidates, world, from, name)
    }

    fn display_name(
        &self,
        world: &World,
        from: Entity,
        target: Entity,
        kind: Option<&str>,
    ) -> String {
        let Some(name) = world.get::<Name>(target) else {
            return full_path(world, target);
        };
        let candidates = Self::candidates(world, from, kind);
        if Self::find_by_name(&candidates, world, from, name.as_str()) == Some(target) {
            name.as_str().to_string()
        } else {
            full_path(world, target)
        }
    }

    fn names(&self, world: &World, from: Entity, kind: Option<&str>) -> Vec<String> {
        let candidates = Self::candidates(world, from, kind);
        let mut names: Vec<String> = candidates
            .iter()
            .map(|(entity, name)| {
                if Self::find_by_name(&candidates, world, from, name) == Some(*entity) {
                    name.clone()
                } else {
                    full_path(world, *entity)
                }
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// `entity` itself, then each parent up to the root.
fn ancestors(world: &World, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
    std::iter::successors(Some(entity), move |e| world.get::<ChildOf>(*e).map(|c| c.0))
}

fn is_within(world: &World, entity: Entity, ancestor: Entity) -> bool {
    ancestors(world, entity).any(|e| e == ancestor)
}

fn root_of(world: &World, entity: Entity) -> Entity {
    ancestors(world, entity).last().unwrap_or(entity)
}

/// Dotted path of names from the document root, e.g. `.Simulations.Field.Wheat`.
pub fn full_path(world: &World, entity: Entity) -> String {
    let mut names: Vec<String> = ancestors(world, entity)
        .map(|e| {
            world
                .get::<Name>(e)
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| e.to_string())
        })
        .collect();
    names.reverse();
    format!(".{}", names.join("."))
}
