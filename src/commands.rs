use bevy_ecs::prelude::*;
use harrow_commands::EditorCommand;
use harrow_schema::{PropertyTarget, PropertyValue, SchemaError, read_target, write_target};

// ---------------------------------------------------------------------------
// ChangeProperty
// ---------------------------------------------------------------------------

/// Sets one member of one model and restores the previous value on undo.
pub struct ChangeProperty {
    pub target: PropertyTarget,
    pub old_value: PropertyValue,
    pub new_value: PropertyValue,
    description: String,
}

impl ChangeProperty {
    /// Snapshots the member's current value as the undo value.
    pub fn new(
        world: &World,
        target: PropertyTarget,
        new_value: PropertyValue,
    ) -> Result<Self, SchemaError> {
        let old_value = read_target(world, &target)?;
        Ok(Self::from_values(target, old_value, new_value))
    }

    /// Builds the command from an already known previous value, for edits
    /// chained inside one batch.
    pub fn from_values(
        target: PropertyTarget,
        old_value: PropertyValue,
        new_value: PropertyValue,
    ) -> Self {
        let description = format!("Set {}", target.dotted_path());
        Self {
            target,
            old_value,
            new_value,
            description,
        }
    }
}

impl EditorCommand for ChangeProperty {
    fn execute(&self, world: &mut World) -> anyhow::Result<()> {
        write_target(world, &self.target, self.new_value.clone())?;
        Ok(())
    }

    fn undo(&self, world: &mut World) -> anyhow::Result<()> {
        write_target(world, &self.target, self.old_value.clone())?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn changed_models(&self) -> Vec<Entity> {
        vec![self.target.entity]
    }
}
