use bevy_ecs::entity::Entity;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("`{model}` has no member named `{member}`")]
    UnknownMember { model: &'static str, member: String },
    #[error("member `{0}` cannot be read")]
    NotReadable(&'static str),
    #[error("member `{0}` cannot be written")]
    NotWritable(&'static str),
    #[error("member `{member}` expects {expected}, got {found}")]
    TypeMismatch {
        member: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("member `{member}` rejected the value: {reason}")]
    Rejected { member: &'static str, reason: String },
    #[error("member `{member}` was handed a model that is not a {expected}")]
    WrongModelType {
        member: &'static str,
        expected: &'static str,
    },
    #[error("property path `{0}` does not end at a value member")]
    InvalidPath(String),
    #[error("no SchemaRegistry resource in this world")]
    MissingRegistry,
    #[error("model type is not registered")]
    UnregisteredModel,
    #[error("entity {0} has no registered model component")]
    MissingModel(Entity),
}
