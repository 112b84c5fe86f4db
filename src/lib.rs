//! Property-grid binding for model documents held in a bevy `World`.
//!
//! Models are components with an explicit [`harrow_schema::ModelSchema`].
//! A [`PropertyPresenter`] extracts a model's editable members into a tree
//! of descriptors, hands it to a [`PropertyView`], turns committed edits into
//! undoable [`ChangeProperty`] commands, and refreshes the view whenever the
//! command history reports that the model changed.

pub mod commands;
pub mod config;
pub mod error;
pub mod inspector;
pub mod latest;
pub mod scope;
pub mod view;

pub use commands::ChangeProperty;
pub use config::BindingConfig;
pub use error::{BindingError, CoercionError, ConfigError};
pub use inspector::{
    PresenterOptions, PresenterStats, PropertyDescriptor, PropertyEdit, PropertyGroup,
    PropertyId, PropertyPresenter, RawValue,
};
pub use latest::{LatestRequest, RequestTicket};
pub use scope::{DocumentScope, ModelScope, ModelScopeService};
pub use view::{HeadlessView, PropertyView};

pub use harrow_commands;
pub use harrow_schema;

use bevy_app::{App, Plugin};
use bevy_ecs::component::Mutable;
use bevy_ecs::prelude::*;
use harrow_commands::CommandHistory;
use harrow_schema::{Model, SchemaRegistry};

/// Installs the command history, schema registry, binding config and the
/// document model scope.
#[derive(Default)]
pub struct PropertyGridPlugin {
    pub config: BindingConfig,
}

impl Plugin for PropertyGridPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandHistory>()
            .init_resource::<SchemaRegistry>()
            .insert_resource(self.config.clone())
            .insert_resource(ModelScopeService::new(DocumentScope));
    }
}

pub trait RegisterModel {
    /// Makes `T` available to presenters and commands.
    fn register_model<T>(&mut self) -> &mut Self
    where
        T: Model + Component<Mutability = Mutable>;
}

impl RegisterModel for World {
    fn register_model<T>(&mut self) -> &mut Self
    where
        T: Model + Component<Mutability = Mutable>,
    {
        self.get_resource_or_init::<SchemaRegistry>()
            .register::<T>();
        self
    }
}

impl RegisterModel for App {
    fn register_model<T>(&mut self) -> &mut Self
    where
        T: Model + Component<Mutability = Mutable>,
    {
        self.world_mut().register_model::<T>();
        self
    }
}
