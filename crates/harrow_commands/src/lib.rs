use bevy_ecs::prelude::*;
use tracing::debug;

// ---------------------------------------------------------------------------
// EditorCommand trait
// ---------------------------------------------------------------------------

pub trait EditorCommand: Send + Sync + 'static {
    fn execute(&self, world: &mut World) -> anyhow::Result<()>;
    fn undo(&self, world: &mut World) -> anyhow::Result<()>;
    fn description(&self) -> &str;

    /// Model entities this command mutates. Each one is broadcast after the
    /// command is applied, undone or redone.
    fn changed_models(&self) -> Vec<Entity> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// CommandHistory resource
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
pub struct CommandHistory {
    pub undo_stack: Vec<Box<dyn EditorCommand>>,
    pub redo_stack: Vec<Box<dyn EditorCommand>>,
}

impl CommandHistory {
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Executes `command`, records it for undo, and broadcasts the models it
/// changed. A command that fails to execute is not recorded.
pub fn submit(world: &mut World, command: Box<dyn EditorCommand>) -> anyhow::Result<()> {
    if !world.contains_resource::<CommandHistory>() {
        anyhow::bail!("no CommandHistory in this world");
    }
    command.execute(world)?;
    let changed = command.changed_models();
    debug!(command = command.description(), "submitted");
    {
        let mut history = world.resource_mut::<CommandHistory>();
        history.undo_stack.push(command);
        history.redo_stack.clear();
    }
    broadcast_all(world, &changed);
    Ok(())
}

/// Reverts the most recent command. Returns `false` when there is nothing to undo.
pub fn undo(world: &mut World) -> anyhow::Result<bool> {
    // Take ownership to avoid borrow conflict with world
    let Some(command) = world
        .get_resource_mut::<CommandHistory>()
        .and_then(|mut history| history.undo_stack.pop())
    else {
        return Ok(false);
    };

    if let Err(err) = command.undo(world) {
        world.resource_mut::<CommandHistory>().undo_stack.push(command);
        return Err(err);
    }
    let changed = command.changed_models();
    debug!(command = command.description(), "undone");
    world.resource_mut::<CommandHistory>().redo_stack.push(command);
    broadcast_all(world, &changed);
    Ok(true)
}

/// Re-applies the most recently undone command. Returns `false` when there
/// is nothing to redo.
pub fn redo(world: &mut World) -> anyhow::Result<bool> {
    let Some(command) = world
        .get_resource_mut::<CommandHistory>()
        .and_then(|mut history| history.redo_stack.pop())
    else {
        return Ok(false);
    };

    if let Err(err) = command.execute(world) {
        world.resource_mut::<CommandHistory>().redo_stack.push(command);
        return Err(err);
    }
    let changed = command.changed_models();
    debug!(command = command.description(), "redone");
    world.resource_mut::<CommandHistory>().undo_stack.push(command);
    broadcast_all(world, &changed);
    Ok(true)
}

// ---------------------------------------------------------------------------
// CommandGroup
// ---------------------------------------------------------------------------

pub struct CommandGroup {
    pub commands: Vec<Box<dyn EditorCommand>>,
    pub label: String,
}

impl EditorCommand for CommandGroup {
    fn execute(&self, world: &mut World) -> anyhow::Result<()> {
        for (applied, cmd) in self.commands.iter().enumerate() {
            if let Err(err) = cmd.execute(world) {
                for done in self.commands[..applied].iter().rev() {
                    done.undo(world)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&self, world: &mut World) -> anyhow::Result<()> {
        for cmd in self.commands.iter().rev() {
            cmd.undo(world)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.label
    }

    fn changed_models(&self) -> Vec<Entity> {
        let mut changed: Vec<Entity> = Vec::new();
        for entity in self.commands.iter().flat_map(|c| c.changed_models()) {
            if !changed.contains(&entity) {
                changed.push(entity);
            }
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Model-changed broadcast
// ---------------------------------------------------------------------------

/// Called with the listener entity and the model entity that changed.
pub type ModelChangedHandler = fn(&mut World, Entity, Entity);

/// Subscribes the entity it is attached to to model-changed broadcasts.
/// Removing the component (or despawning the entity) unsubscribes.
#[derive(Component, Clone, Copy)]
pub struct ModelChangedListener {
    pub handler: ModelChangedHandler,
}

/// Synchronously notifies every listener that `changed` was mutated.
pub fn broadcast_model_changed(world: &mut World, changed: Entity) {
    let mut listeners = world.query::<(Entity, &ModelChangedListener)>();
    let listeners: Vec<(Entity, ModelChangedHandler)> = listeners
        .iter(world)
        .map(|(entity, listener)| (entity, listener.handler))
        .collect();
    debug!(model = %changed, listeners = listeners.len(), "model changed");

    for (listener, handler) in listeners {
        // An earlier handler may have detached this one.
        if world.get::<ModelChangedListener>(listener).is_none() {
            continue;
        }
        handler(world, listener, changed);
    }
}

fn broadcast_all(world: &mut World, changed: &[Entity]) {
    for &entity in changed {
        broadcast_model_changed(world, entity);
    }
}
