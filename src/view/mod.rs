mod headless;

pub use headless::*;

use std::any::Any;

use crate::inspector::{PropertyEdit, PropertyGroup};

/// What a property presenter needs from a widget toolkit.
///
/// The presenter never touches widgets; it hands the view a property tree and
/// drains the edits the user committed since the last call.
pub trait PropertyView: Any + Send + Sync {
    /// Replaces everything shown with `root`. Any edit still in progress is
    /// dropped.
    fn populate(&mut self, root: &PropertyGroup);

    /// Edits committed since the last call, oldest first.
    fn take_edits(&mut self) -> Vec<PropertyEdit>;

    /// Commits the edit in progress in a focused control, if any.
    fn end_edit(&mut self);

    fn show_error(&mut self, message: &str);
}
