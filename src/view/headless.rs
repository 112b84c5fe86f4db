use std::mem;

use harrow_schema::{DisplayHint, PropertyValue};
use serde::Serialize;

use super::PropertyView;
use crate::inspector::{PropertyDescriptor, PropertyEdit, PropertyGroup, PropertyId, RawValue};

/// A view without widgets. Rows stand in for controls, and the methods that
/// take a row key play the part of the user.
///
/// Rows are keyed by member path (`title`, `canopy.height`) and sections by
/// their group name.
#[derive(Debug, Default, Serialize)]
pub struct HeadlessView {
    rows: Vec<Row>,
    errors: Vec<String>,
    discarded: Vec<String>,
    populate_count: usize,
    #[serde(skip)]
    focused: Option<FocusedEdit>,
    #[serde(skip)]
    committed: Vec<PropertyEdit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    #[serde(skip)]
    pub id: Option<PropertyId>,
    pub key: String,
    pub label: String,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub read_only: bool,
    pub text: String,
    pub widget: Widget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    TextBox,
    MultiLine,
    CheckBox { checked: bool },
    DropDown { options: Vec<String> },
    FileButton { directory: bool },
    DateTime,
    Rows { cells: Vec<String> },
    Section,
}

#[derive(Debug)]
struct FocusedEdit {
    id: PropertyId,
    row: Option<usize>,
    text: String,
}

impl HeadlessView {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.row(key).map(|r| r.text.as_str())
    }

    /// Types into a control without committing, as if it still had focus.
    pub fn type_text(&mut self, key: &str, text: &str) -> bool {
        let Some(row) = self.editable_row(key) else {
            return false;
        };
        row.text = text.to_string();
        let id = row.id;
        self.focus(id, None, text)
    }

    /// Types into one cell of a per-row control without committing.
    pub fn type_cell(&mut self, key: &str, cell: usize, text: &str) -> bool {
        let Some(row) = self.editable_row(key) else {
            return false;
        };
        if let Widget::Rows { cells } = &mut row.widget {
            if cells.len() <= cell {
                cells.resize(cell + 1, String::new());
            }
            cells[cell] = text.to_string();
        }
        let id = row.id;
        self.focus(id, Some(cell), text)
    }

    /// Commits the focused control.
    pub fn commit(&mut self) {
        if let Some(edit) = self.focused.take() {
            self.committed.push(PropertyEdit {
                id: edit.id,
                row: edit.row,
                value: RawValue::Text(edit.text),
            });
        }
    }

    /// Types `text` and presses enter.
    pub fn enter(&mut self, key: &str, text: &str) -> bool {
        let typed = self.type_text(key, text);
        if typed {
            self.commit();
        }
        typed
    }

    pub fn enter_cell(&mut self, key: &str, cell: usize, text: &str) -> bool {
        let typed = self.type_cell(key, cell, text);
        if typed {
            self.commit();
        }
        typed
    }

    /// Clicks a check box.
    pub fn toggle(&mut self, key: &str) -> bool {
        let Some(row) = self.editable_row(key) else {
            return false;
        };
        let Widget::CheckBox { checked } = &mut row.widget else {
            return false;
        };
        *checked = !*checked;
        let value = *checked;
        row.text = value.to_string();
        let Some(id) = row.id else {
            return false;
        };
        self.committed.push(PropertyEdit::new(id, value));
        true
    }

    /// Picks `option` from a drop-down.
    pub fn select(&mut self, key: &str, option: &str) -> bool {
        let Some(row) = self.editable_row(key) else {
            return false;
        };
        if !matches!(row.widget, Widget::DropDown { .. }) {
            return false;
        }
        row.text = option.to_string();
        let Some(id) = row.id else {
            return false;
        };
        self.committed.push(PropertyEdit {
            id,
            row: None,
            value: RawValue::EnumLabel(option.to_string()),
        });
        true
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn dismiss_errors(&mut self) {
        self.errors.clear();
    }

    /// Text of uncommitted edits thrown away by a refresh.
    pub fn discarded(&self) -> &[String] {
        &self.discarded
    }

    pub fn populate_count(&self) -> usize {
        self.populate_count
    }

    /// The rows, errors and refresh count as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn editable_row(&mut self, key: &str) -> Option<&mut Row> {
        self.rows
            .iter_mut()
            .find(|r| r.key == key && r.id.is_some() && !r.read_only)
    }

    fn focus(&mut self, id: Option<PropertyId>, row: Option<usize>, text: &str) -> bool {
        let Some(id) = id else {
            return false;
        };
        // Moving focus commits whatever the previous control held.
        if self.focused.as_ref().is_some_and(|f| f.id != id || f.row != row) {
            self.commit();
        }
        self.focused = Some(FocusedEdit {
            id,
            row,
            text: text.to_string(),
        });
        true
    }

    fn push_group(&mut self, group: &PropertyGroup, depth: usize) {
        for descriptor in &group.properties {
            self.rows.push(Row::property(descriptor, depth));
        }
        for child in &group.groups {
            self.rows.push(Row {
                id: None,
                key: child.name.clone(),
                label: child.name.clone(),
                depth,
                separator: None,
                units: None,
                read_only: false,
                text: String::new(),
                widget: Widget::Section,
            });
            self.push_group(child, depth + 1);
        }
    }
}

impl Row {
    fn property(descriptor: &PropertyDescriptor, depth: usize) -> Self {
        let widget = match descriptor.display {
            DisplayHint::Text => Widget::TextBox,
            DisplayHint::MultiLine => Widget::MultiLine,
            DisplayHint::CheckBox => Widget::CheckBox {
                checked: descriptor.value == PropertyValue::Bool(true),
            },
            DisplayHint::DropDown(_) | DisplayHint::Enum | DisplayHint::ModelRef => {
                Widget::DropDown {
                    options: descriptor.options.clone(),
                }
            }
            DisplayHint::FileName => Widget::FileButton { directory: false },
            DisplayHint::DirectoryName => Widget::FileButton { directory: true },
            DisplayHint::Rows => Widget::Rows {
                cells: descriptor.cells.clone(),
            },
            DisplayHint::Date => Widget::DateTime,
        };
        Self {
            id: Some(descriptor.id),
            key: descriptor.target.dotted_path(),
            label: descriptor.label.clone(),
            depth,
            separator: descriptor.separator.map(str::to_string),
            units: descriptor.units.map(str::to_string),
            read_only: descriptor.read_only,
            text: descriptor.text.clone(),
            widget,
        }
    }
}

impl PropertyView for HeadlessView {
    fn populate(&mut self, root: &PropertyGroup) {
        if let Some(edit) = self.focused.take() {
            self.discarded.push(edit.text);
        }
        // Committed edits not yet drained point at ids the new tree replaces.
        for edit in self.committed.drain(..) {
            self.discarded.push(match edit.value {
                RawValue::Text(text) | RawValue::EnumLabel(text) => text,
                RawValue::Bool(value) => value.to_string(),
                RawValue::Typed(value) => format!("{value:?}"),
            });
        }
        self.rows.clear();
        self.push_group(root, 0);
        self.populate_count += 1;
    }

    fn take_edits(&mut self) -> Vec<PropertyEdit> {
        mem::take(&mut self.committed)
    }

    fn end_edit(&mut self) {
        self.commit();
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
