mod coerce;
mod descriptor;
mod extract;

pub use coerce::{CoercionContext, coerce, parse_text, render_cells, render_value};
pub use descriptor::*;
pub use extract::{PresenterOptions, PropertyFilter, extract_properties, ordered_members};

use std::any::Any;

use bevy_ecs::prelude::*;
use harrow_commands::{CommandGroup, EditorCommand, ModelChangedListener};
use harrow_schema::{PropertyTarget, PropertyValue, read_target};
use tracing::{debug, error, warn};

use crate::commands::ChangeProperty;
use crate::config::BindingConfig;
use crate::error::BindingError;
use crate::scope::ModelScopeService;
use crate::view::PropertyView;

/// Counters for the refresh handler, mostly for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenterStats {
    /// Times the view was repopulated, including the initial attach.
    pub rebuilds: usize,
    /// Model-changed notifications skipped because this presenter made the change.
    pub suppressed: usize,
    /// Notifications about models this presenter does not show.
    pub ignored: usize,
}

/// Binds one model entity to one [`PropertyView`].
///
/// The presenter lives on its own entity next to a [`ModelChangedListener`],
/// so every command submitted to the [`harrow_commands::CommandHistory`]
/// (including undo and redo) refreshes the view when it touches the model.
#[derive(Component)]
pub struct PropertyPresenter {
    model: Entity,
    view: Box<dyn PropertyView>,
    options: PresenterOptions,
    descriptors: DescriptorMap,
    root: PropertyGroup,
    suppress_refresh: bool,
    stats: PresenterStats,
}

impl PropertyPresenter {
    pub fn attach(
        world: &mut World,
        model: Entity,
        view: impl PropertyView,
    ) -> Result<Entity, BindingError> {
        Self::attach_with(world, model, view, PresenterOptions::default())
    }

    /// Extracts the model's properties, populates `view` and starts
    /// listening for model changes. Returns the presenter entity.
    pub fn attach_with(
        world: &mut World,
        model: Entity,
        view: impl PropertyView,
        options: PresenterOptions,
    ) -> Result<Entity, BindingError> {
        let mut presenter = PropertyPresenter {
            model,
            view: Box::new(view),
            options,
            descriptors: DescriptorMap::default(),
            root: PropertyGroup::default(),
            suppress_refresh: false,
            stats: PresenterStats::default(),
        };
        presenter.rebuild(world)?;
        let entity = world
            .spawn((
                presenter,
                ModelChangedListener {
                    handler: on_model_changed,
                },
            ))
            .id();
        debug!(presenter = %entity, model = %model, "attached property presenter");
        Ok(entity)
    }

    /// Flushes any edit still in progress, stops listening and hands the
    /// view back.
    pub fn detach(
        world: &mut World,
        presenter: Entity,
    ) -> Result<Box<dyn PropertyView>, BindingError> {
        world
            .get_mut::<PropertyPresenter>(presenter)
            .ok_or(BindingError::NotAPresenter(presenter))?
            .view
            .end_edit();
        Self::process_edits(world, presenter)?;

        let taken = world
            .entity_mut(presenter)
            .take::<PropertyPresenter>()
            .ok_or(BindingError::NotAPresenter(presenter))?;
        world.despawn(presenter);
        debug!(presenter = %presenter, model = %taken.model, "detached property presenter");
        Ok(taken.view)
    }

    /// Rebinds the presenter to `model` and repopulates the view.
    pub fn refresh_view(
        world: &mut World,
        presenter: Entity,
        model: Entity,
    ) -> Result<(), BindingError> {
        with_presenter(world, presenter, |presenter, world| {
            presenter.model = model;
            presenter.rebuild(world)
        })
    }

    /// Coerces one edit and submits it as an undoable command.
    pub fn apply_change(
        world: &mut World,
        presenter: Entity,
        edit: PropertyEdit,
    ) -> Result<(), BindingError> {
        let command = build_change(world, presenter, &edit, &[])?;
        submit_quietly(world, presenter, Box::new(command))
    }

    /// Drains the view's committed edits and submits them as one undoable
    /// step. Edits the user got wrong are reported through
    /// [`PropertyView::show_error`] and skipped; any other failure is
    /// returned. Returns how many edits were applied.
    pub fn process_edits(world: &mut World, presenter: Entity) -> Result<usize, BindingError> {
        let edits = world
            .get_mut::<PropertyPresenter>(presenter)
            .ok_or(BindingError::NotAPresenter(presenter))?
            .view
            .take_edits();
        if edits.is_empty() {
            return Ok(0);
        }

        let mut commands: Vec<ChangeProperty> = Vec::new();
        let mut rejected = Vec::new();
        for edit in &edits {
            let pending: Vec<(PropertyTarget, PropertyValue)> = commands
                .iter()
                .map(|c| (c.target.clone(), c.new_value.clone()))
                .collect();
            match build_change(world, presenter, edit, &pending) {
                Ok(command) => commands.push(command),
                Err(err) if err.is_user_facing() => {
                    warn!(property = %edit.id, %err, "edit rejected");
                    rejected.push(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        let mut applied = commands.len();
        let submitted = match applied {
            0 => Ok(()),
            1 => submit_quietly(world, presenter, Box::new(commands.remove(0))),
            _ => {
                let group = CommandGroup {
                    label: format!("Set {applied} properties"),
                    commands: commands
                        .into_iter()
                        .map(|c| Box::new(c) as Box<dyn EditorCommand>)
                        .collect(),
                };
                submit_quietly(world, presenter, Box::new(group))
            }
        };
        match submitted {
            Ok(()) => {}
            Err(err) if err.is_user_facing() => {
                warn!(%err, "model refused the edit");
                rejected.push(err.to_string());
                applied = 0;
            }
            Err(err) => return Err(err),
        }

        if !rejected.is_empty()
            && let Some(mut presenter) = world.get_mut::<PropertyPresenter>(presenter)
        {
            for message in &rejected {
                presenter.view.show_error(message);
            }
        }
        Ok(applied)
    }

    pub fn model(&self) -> Entity {
        self.model
    }

    /// The property tree the view currently shows.
    pub fn root(&self) -> &PropertyGroup {
        &self.root
    }

    /// True when the model has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn stats(&self) -> PresenterStats {
        self.stats
    }

    pub fn view<V: PropertyView>(&self) -> Option<&V> {
        let view: &dyn Any = self.view.as_ref();
        view.downcast_ref()
    }

    pub fn view_mut<V: PropertyView>(&mut self) -> Option<&mut V> {
        let view: &mut dyn Any = self.view.as_mut();
        view.downcast_mut()
    }

    fn tracks(&self, entity: Entity) -> bool {
        self.model == entity || self.descriptors.tracks(entity)
    }

    fn rebuild(&mut self, world: &World) -> Result<(), BindingError> {
        let root = extract_properties(world, self.model, &self.options, &mut self.descriptors)?;
        self.view.populate(&root);
        self.root = root;
        self.stats.rebuilds += 1;
        debug!(
            model = %self.model,
            properties = self.descriptors.len(),
            "property view rebuilt"
        );
        Ok(())
    }
}

/// Runs `f` with the presenter component taken out of the world, so it can
/// borrow the world alongside.
fn with_presenter<R>(
    world: &mut World,
    presenter: Entity,
    f: impl FnOnce(&mut PropertyPresenter, &World) -> Result<R, BindingError>,
) -> Result<R, BindingError> {
    if world.get::<PropertyPresenter>(presenter).is_none() {
        return Err(BindingError::NotAPresenter(presenter));
    }
    let mut taken = world
        .entity_mut(presenter)
        .take::<PropertyPresenter>()
        .ok_or(BindingError::NotAPresenter(presenter))?;
    let result = f(&mut taken, world);
    world.entity_mut(presenter).insert(taken);
    result
}

/// Resolves and coerces `edit`. `pending` holds values already set by
/// earlier edits of the same batch, latest last.
fn build_change(
    world: &World,
    presenter: Entity,
    edit: &PropertyEdit,
    pending: &[(PropertyTarget, PropertyValue)],
) -> Result<ChangeProperty, BindingError> {
    let state = world
        .get::<PropertyPresenter>(presenter)
        .ok_or(BindingError::NotAPresenter(presenter))?;
    let binding = state
        .descriptors
        .get(edit.id)
        .ok_or(BindingError::UnknownProperty(edit.id))?;
    if binding.read_only {
        return Err(BindingError::ReadOnly(binding.label.clone()));
    }

    let current = match pending.iter().rev().find(|(t, _)| *t == binding.target) {
        Some((_, value)) => value.clone(),
        None => read_target(world, &binding.target)?,
    };
    let fallback_config = BindingConfig::default();
    let ctx = CoercionContext {
        world,
        config: world
            .get_resource::<BindingConfig>()
            .unwrap_or(&fallback_config),
        scope: world.get_resource::<ModelScopeService>().map(|s| s.scope()),
        origin: state.model,
    };
    let new_value = coerce(&ctx, binding, &current, edit.row, edit.value.clone())?;
    Ok(ChangeProperty::from_values(
        binding.target.clone(),
        current,
        new_value,
    ))
}

/// Submits a command this presenter originated. The broadcast it triggers
/// is counted but does not rebuild the view.
fn submit_quietly(
    world: &mut World,
    presenter: Entity,
    command: Box<dyn EditorCommand>,
) -> Result<(), BindingError> {
    set_suppressed(world, presenter, true)?;
    let result = harrow_commands::submit(world, command);
    set_suppressed(world, presenter, false)?;
    Ok(result?)
}

fn set_suppressed(world: &mut World, presenter: Entity, suppressed: bool) -> Result<(), BindingError> {
    world
        .get_mut::<PropertyPresenter>(presenter)
        .ok_or(BindingError::NotAPresenter(presenter))?
        .suppress_refresh = suppressed;
    Ok(())
}

fn on_model_changed(world: &mut World, listener: Entity, changed: Entity) {
    {
        let Some(mut presenter) = world.get_mut::<PropertyPresenter>(listener) else {
            return;
        };
        if !presenter.tracks(changed) {
            presenter.stats.ignored += 1;
            return;
        }
        if presenter.suppress_refresh {
            presenter.stats.suppressed += 1;
            debug!(model = %changed, "skipping refresh for own change");
            return;
        }
    }

    if let Err(err) = with_presenter(world, listener, |presenter, world| presenter.rebuild(world)) {
        error!(presenter = %listener, model = %changed, %err, "failed to refresh property view");
    }
}
