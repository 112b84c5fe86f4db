//! Integration tests for raw edit coercion through an attached presenter.

mod common;

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::name::Name;
use bevy_ecs::prelude::*;
use chrono::NaiveDate;
use common::*;
use harrow::{BindingError, CoercionError, PropertyEdit, PropertyId, PropertyPresenter, RawValue};
use harrow_schema::{DescribedEnum, ModelRef, PropertyValue};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn id_of(world: &World, presenter: Entity, path: &str) -> PropertyId {
    common::presenter(world, presenter)
        .root()
        .find(path)
        .unwrap_or_else(|| panic!("no descriptor for {path}"))
        .id
}

fn apply(
    world: &mut World,
    presenter: Entity,
    path: &str,
    value: impl Into<RawValue>,
) -> Result<(), BindingError> {
    let id = id_of(world, presenter, path);
    PropertyPresenter::apply_change(world, presenter, PropertyEdit::new(id, value))
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn text_and_numbers_parse_invariantly() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    apply(doc.world(), p, "title", "Soil water").unwrap();
    apply(doc.world(), p, "layers", " 7 ").unwrap();
    apply(doc.world(), p, "irrigation.amount", "12.5").unwrap();

    let model = doc.report();
    assert_eq!(model.title, "Soil water");
    assert_eq!(model.layers, 7);
    assert_eq!(model.irrigation.as_ref().unwrap().amount, 12.5);
}

#[test]
fn unparsable_numbers_leave_the_model_alone() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let err = apply(doc.world(), p, "layers", "7,5").unwrap_err();
    assert!(matches!(
        err,
        BindingError::Coercion(CoercionError::InvalidInteger { .. })
    ));
    assert_eq!(doc.report().layers, 2);
}

#[test]
fn check_boxes_send_booleans() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    apply(doc.world(), p, "enabled", true).unwrap();
    assert!(doc.report().enabled);
    apply(doc.world(), p, "enabled", "FALSE").unwrap();
    assert!(!doc.report().enabled);
}

#[test]
fn typed_values_skip_parsing() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    apply(doc.world(), p, "start", RawValue::Typed(PropertyValue::Date(date))).unwrap();
    assert_eq!(doc.report().start, date);

    apply(doc.world(), p, "start", "15/06/2001").unwrap();
    assert_eq!(doc.report().start, NaiveDate::from_ymd_opt(2001, 6, 15).unwrap());
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn enum_members_resolve_by_display_label() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    apply(doc.world(), p, "water_table", RawValue::EnumLabel("Filled From Bottom".into())).unwrap();
    assert_eq!(doc.report().water_table, WaterTableState::FilledFromBottom);
}

#[test]
fn unknown_enum_labels_fail_without_mutating() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let err = apply(doc.world(), p, "water_table", "FilledFromBottom").unwrap_err();
    assert!(matches!(
        err,
        BindingError::Coercion(CoercionError::UnknownEnumLabel {
            type_name: "WaterTableState",
            ..
        })
    ));
    assert_eq!(doc.report().water_table, WaterTableState::FilledFromTop);
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn editing_the_row_after_the_last_grows_the_array() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let id = id_of(doc.world(), p, "thickness");
    PropertyPresenter::apply_change(doc.world(), p, PropertyEdit::cell(id, 2, "3.5")).unwrap();
    assert_eq!(doc.report().thickness, vec![100.0, 200.0, 3.5]);
}

#[test]
fn rows_skipped_over_are_not_a_number() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let id = id_of(doc.world(), p, "thickness");
    PropertyPresenter::apply_change(doc.world(), p, PropertyEdit::cell(id, 4, "50")).unwrap();

    let thickness = &doc.report().thickness;
    assert_eq!(thickness.len(), 5);
    assert_eq!(&thickness[..2], &[100.0, 200.0]);
    assert!(thickness[2].is_nan() && thickness[3].is_nan());
    assert_eq!(thickness[4], 50.0);
}

#[test]
fn row_edits_in_one_batch_build_on_each_other() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    let grid = view_mut(doc.world(), p);
    assert!(grid.enter_cell("thickness", 0, "150"));
    assert!(grid.enter_cell("thickness", 2, "300"));
    assert_eq!(PropertyPresenter::process_edits(doc.world(), p).unwrap(), 2);
    assert_eq!(doc.report().thickness, vec![150.0, 200.0, 300.0]);

    harrow_commands::undo(doc.world()).unwrap();
    assert_eq!(doc.report().thickness, vec![100.0, 200.0]);
}

#[test]
fn multi_line_text_is_one_entry_per_line() {
    let mut doc = document();
    let report = doc.report;
    let p = attach_headless(doc.world(), report);

    apply(doc.world(), p, "notes", "sown late\n\nwet spring\n").unwrap();
    assert_eq!(doc.report().notes, vec!["sown late", "wet spring"]);
    // The edit came from this presenter, so the view is not repopulated.
    assert_eq!(view(doc.world(), p).populate_count(), 1);
}

// ============================================================================
// Model references
// ============================================================================

#[test]
fn references_resolve_by_name_or_full_path() {
    let mut doc = document();
    let (report, wheat, barley) = (doc.report, doc.wheat, doc.barley);
    let p = attach_headless(doc.world(), report);

    apply(doc.world(), p, "crop", "Wheat").unwrap();
    assert_eq!(doc.report().crop, ModelRef(Some(wheat)));

    apply(doc.world(), p, "crop", ".Simulations.Field.Barley").unwrap();
    assert_eq!(doc.report().crop, ModelRef(Some(barley)));
}

#[test]
fn unresolvable_or_empty_references_clear_the_member() {
    let mut doc = document();
    let (report, wheat) = (doc.report, doc.wheat);
    doc.world().get_mut::<Report>(report).unwrap().crop = ModelRef(Some(wheat));
    let p = attach_headless(doc.world(), report);

    // A zone is not a plant.
    apply(doc.world(), p, "crop", "Field").unwrap();
    assert_eq!(doc.report().crop, ModelRef(None));

    apply(doc.world(), p, "crop", "Wheat").unwrap();
    apply(doc.world(), p, "crop", "").unwrap();
    assert_eq!(doc.report().crop, ModelRef(None));
}

#[test]
fn same_named_crops_in_other_fields_stay_distinguishable() {
    let mut doc = document();
    let (field, report, wheat) = (doc.field, doc.report, doc.wheat);
    let root = doc.world().get::<ChildOf>(field).unwrap().0;
    let east = doc.world().spawn((Zone, Name::new("East"), ChildOf(root))).id();
    let east_wheat = doc
        .world()
        .spawn((Crop { sowing_density: 80.0 }, Name::new("Wheat"), ChildOf(east)))
        .id();
    doc.world().get_mut::<Report>(report).unwrap().crop = ModelRef(Some(east_wheat));
    let p = attach_headless(doc.world(), report);

    let crop = common::presenter(doc.world(), p).root().find("crop").unwrap();
    let (text, options) = (crop.text.clone(), crop.options.clone());
    assert_eq!(text, ".Simulations.East.Wheat");
    assert_eq!(options, vec![".Simulations.East.Wheat", "Barley", "Wheat"]);

    // What the view shows goes back in unchanged.
    apply(doc.world(), p, "crop", text.as_str()).unwrap();
    assert_eq!(doc.report().crop, ModelRef(Some(east_wheat)));

    // A plain name means the crop in the report's own field.
    apply(doc.world(), p, "crop", "Wheat").unwrap();
    assert_eq!(doc.report().crop, ModelRef(Some(wheat)));
    PropertyPresenter::refresh_view(doc.world(), p, report).unwrap();
    assert_eq!(view(doc.world(), p).text("crop"), Some("Wheat"));
}

// ============================================================================
// Round trips
// ============================================================================

fn snapshot(world: &World, presenter: Entity) -> Vec<(String, PropertyValue)> {
    common::presenter(world, presenter)
        .root()
        .descriptors()
        .into_iter()
        .map(|d| (d.target.dotted_path(), d.value.clone()))
        .collect()
}

proptest! {
    #[test]
    fn resubmitting_rendered_text_changes_nothing(
        title in "[A-Za-z0-9 ]{0,12}",
        layers in 1i32..50,
        thickness in prop::collection::vec(-1.0e6f64..1.0e6, 0..5),
        notes in prop::collection::vec("[a-z]{1,8}", 0..4),
        water_table in 0usize..3,
        days in 700_000i32..760_000,
        enabled in any::<bool>(),
        crop in 0usize..3,
        amount in 0.0f64..500.0,
    ) {
        let mut doc = document();
        let (report, wheat, barley) = (doc.report, doc.wheat, doc.barley);
        {
            let mut model = doc.world().get_mut::<Report>(report).unwrap();
            model.title = title;
            model.layers = layers;
            model.thickness = thickness;
            model.notes = notes;
            model.water_table = WaterTableState::from_index(water_table).unwrap();
            model.start = NaiveDate::from_num_days_from_ce_opt(days).unwrap();
            model.enabled = enabled;
            model.crop = ModelRef([None, Some(wheat), Some(barley)][crop]);
            model.irrigation = Some(Irrigation { amount, ..Default::default() });
        }
        let p = attach_headless(doc.world(), report);
        let before = snapshot(doc.world(), p);

        let edits: Vec<PropertyEdit> = common::presenter(doc.world(), p)
            .root()
            .descriptors()
            .into_iter()
            .map(|d| PropertyEdit::new(d.id, d.text.as_str()))
            .collect();
        for edit in edits {
            PropertyPresenter::apply_change(doc.world(), p, edit).unwrap();
        }

        PropertyPresenter::refresh_view(doc.world(), p, report).unwrap();
        prop_assert_eq!(snapshot(doc.world(), p), before);
    }
}
