use bevy_ecs::entity::Entity;
use harrow_schema::SchemaError;

use crate::inspector::PropertyId;

/// Raw input that could not be turned into the member's declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("'{input}' is not a number")]
    InvalidNumber { input: String },
    #[error("'{input}' is not a whole number")]
    InvalidInteger { input: String },
    #[error("{value} is not between {min} and {max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("'{input}' is not a date")]
    InvalidDate { input: String },
    #[error("'{input}' is neither true nor false")]
    InvalidBool { input: String },
    #[error("'{label}' is not one of the {type_name} options")]
    UnknownEnumLabel {
        type_name: &'static str,
        label: String,
    },
    #[error("{member} has no rows to edit")]
    NotASequence { member: &'static str },
    #[error("row {row} is past the last of {limit} editable rows")]
    RowOutOfRange { row: usize, limit: usize },
    #[error("{type_name} values cannot be parsed from text")]
    NotText { type_name: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("{0} is read-only")]
    ReadOnly(String),
    #[error("no property with id {0} in the current binding")]
    UnknownProperty(PropertyId),
    #[error("entity {0} is not an attached property presenter")]
    NotAPresenter(Entity),
    #[error("sub-model `{model}` has no editable member `{member}` to stand in for it")]
    MissingSubProperty {
        model: &'static str,
        member: &'static str,
    },
    #[error("no {0} resource in this world; was PropertyGridPlugin added?")]
    MissingResource(&'static str),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

impl BindingError {
    /// Errors caused by what the user typed, as opposed to programming errors
    /// or collaborator failures.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Coercion(_) | Self::ReadOnly(_) => true,
            // A checked setter turned the value down.
            Self::Command(err) => matches!(
                err.downcast_ref::<SchemaError>(),
                Some(SchemaError::Rejected { .. })
            ),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid binding config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid binding config: {0}")]
    Invalid(String),
}
