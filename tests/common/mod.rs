//! Shared fixture: a small soil/crop document with one report model that
//! exercises every member shape the property grid supports.

#![allow(dead_code)]

use std::sync::OnceLock;

use bevy_app::App;
use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::name::Name;
use bevy_ecs::prelude::*;
use chrono::NaiveDate;
use harrow::{HeadlessView, PropertyGridPlugin, PropertyPresenter, RegisterModel};
use harrow_schema::{DisplayHint, Member, Model, ModelRef, ModelSchema};

harrow_schema::described_enum! {
    #[derive(Default)]
    pub enum WaterTableState {
        #[default]
        FilledFromTop => "Filled From Top",
        FilledFromBottom => "Filled From Bottom",
        Empty => "Empty",
    }
}

// ============================================================================
// Models
// ============================================================================

#[derive(Component, Default)]
pub struct Zone;

impl Model for Zone {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| ModelSchema::builder::<Zone>("Zone").build())
    }
}

#[derive(Component, Default)]
pub struct Crop {
    pub sowing_density: f64,
}

impl Model for Crop {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::builder::<Crop>("Crop")
                .kind("Plant")
                .property(
                    "sowing_density",
                    Member::described("Sowing density").units("plants/m2"),
                    |c| c.sowing_density,
                    |c, v| c.sowing_density = v,
                )
                .build()
        })
    }
}

#[derive(Default)]
pub struct Schedule {
    pub interval_days: i64,
}

impl Model for Schedule {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::builder::<Schedule>("Schedule")
                .property(
                    "interval_days",
                    Member::described("Interval").units("d"),
                    |s| s.interval_days,
                    |s, v| s.interval_days = v,
                )
                .build()
        })
    }
}

#[derive(Default)]
pub struct Irrigation {
    pub amount: f64,
    pub efficiency: f64,
    pub schedule: Option<Schedule>,
}

impl Model for Irrigation {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::builder::<Irrigation>("Irrigation")
                .property(
                    "amount",
                    Member::described("Amount").units("mm"),
                    |i| i.amount,
                    |i, v| i.amount = v,
                )
                .property(
                    "efficiency",
                    Member::described("Efficiency"),
                    |i| i.efficiency,
                    |i, v| i.efficiency = v,
                )
                .nested(
                    "schedule",
                    Member::described("Schedule"),
                    |i| i.schedule.as_ref(),
                    |i| i.schedule.get_or_insert_with(Schedule::default),
                )
                .build()
        })
    }
}

#[derive(Default)]
pub struct Script {
    pub code: String,
    pub language: String,
}

impl Model for Script {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::builder::<Script>("Script")
                .property(
                    "code",
                    Member::described("Code"),
                    |s| s.code.clone(),
                    |s, v| s.code = v,
                )
                .property(
                    "language",
                    Member::hidden(),
                    |s| s.language.clone(),
                    |s, v| s.language = v,
                )
                .build()
        })
    }
}

#[derive(Component, Default)]
pub struct Report {
    pub title: String,
    pub layers: i32,
    pub thickness: Vec<f64>,
    pub notes: Vec<String>,
    pub water_table: WaterTableState,
    pub start: NaiveDate,
    pub enabled: bool,
    pub crop: ModelRef,
    pub output_file: String,
    pub internal_id: i64,
    pub irrigation: Option<Irrigation>,
    pub manager: Option<Script>,
}

impl Model for Report {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::builder::<Report>("Report")
                .property(
                    "thickness",
                    Member::described("Layer thickness")
                        .units("mm")
                        .display(DisplayHint::Rows),
                    |r| r.thickness.clone(),
                    |r, v| r.thickness = v,
                )
                .property(
                    "notes",
                    Member::described("Notes")
                        .display(DisplayHint::MultiLine)
                        .category("Output"),
                    |r| r.notes.clone(),
                    |r, v| r.notes = v,
                )
                .property(
                    "title",
                    Member::described("Title").order(1),
                    |r| r.title.clone(),
                    |r, v| r.title = v,
                )
                .checked_property(
                    "layers",
                    Member::described("Number of layers").order(2),
                    |r| r.layers,
                    |r, v| {
                        if v < 1 {
                            return Err("at least one layer is required".to_string());
                        }
                        r.layers = v;
                        Ok(())
                    },
                )
                .property(
                    "water_table",
                    Member::described("Water table"),
                    |r| r.water_table,
                    |r, v| r.water_table = v,
                )
                .property(
                    "start",
                    Member::described("Start date").separator("Timing"),
                    |r| r.start,
                    |r, v| r.start = v,
                )
                .property(
                    "enabled",
                    Member::described("Enabled"),
                    |r| r.enabled,
                    |r, v| r.enabled = v,
                )
                .property(
                    "crop",
                    Member::described("Crop to report").model_kind("Plant"),
                    |r| r.crop,
                    |r, v| r.crop = v,
                )
                .property(
                    "output_file",
                    Member::described("Output file")
                        .display(DisplayHint::FileName)
                        .category("Output"),
                    |r| r.output_file.clone(),
                    |r, v| r.output_file = v,
                )
                .property(
                    "internal_id",
                    Member::hidden(),
                    |r| r.internal_id,
                    |r, v| r.internal_id = v,
                )
                .read_only_property("total_thickness", Member::described("Total thickness"), |r| {
                    r.thickness.iter().sum::<f64>()
                })
                .write_only_property("reset_thickness", Member::described("Reset to"), |r, v: f64| {
                    r.thickness = vec![v; r.thickness.len()]
                })
                .nested(
                    "irrigation",
                    Member::described("Irrigation").units("mm"),
                    |r| r.irrigation.as_ref(),
                    |r| r.irrigation.get_or_insert_with(Irrigation::default),
                )
                .substitute(
                    "manager",
                    Member::described("Manager script"),
                    "code",
                    |r| r.manager.as_ref(),
                    |r| r.manager.get_or_insert_with(Script::default),
                )
                .build()
        })
    }
}

/// Member paths of the report's root-level descriptors, in display order.
pub const REPORT_ROOT_PATHS: &[&str] = &[
    "title",
    "layers",
    "thickness",
    "notes",
    "water_table",
    "start",
    "enabled",
    "crop",
    "output_file",
    "manager.code",
];

// ============================================================================
// Document
// ============================================================================

pub struct Document {
    pub app: App,
    pub field: Entity,
    pub wheat: Entity,
    pub barley: Entity,
    pub report: Entity,
}

impl Document {
    pub fn world(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn report(&mut self) -> &Report {
        let report = self.report;
        self.world().get::<Report>(report).unwrap()
    }
}

/// `.Simulations.Field` holding two crops and a report titled "A" over a
/// two-layer profile.
pub fn document() -> Document {
    let mut app = App::new();
    app.add_plugins(PropertyGridPlugin::default())
        .register_model::<Zone>()
        .register_model::<Crop>()
        .register_model::<Report>();

    let world = app.world_mut();
    let root = world.spawn((Zone, Name::new("Simulations"))).id();
    let field = world.spawn((Zone, Name::new("Field"), ChildOf(root))).id();
    let wheat = world
        .spawn((Crop { sowing_density: 120.0 }, Name::new("Wheat"), ChildOf(field)))
        .id();
    let barley = world
        .spawn((Crop { sowing_density: 90.0 }, Name::new("Barley"), ChildOf(field)))
        .id();
    let report = world
        .spawn((
            Report {
                title: "A".to_string(),
                layers: 2,
                thickness: vec![100.0, 200.0],
                start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                ..Default::default()
            },
            Name::new("Report"),
            ChildOf(field),
        ))
        .id();

    Document {
        app,
        field,
        wheat,
        barley,
        report,
    }
}

pub fn attach_headless(world: &mut World, model: Entity) -> Entity {
    PropertyPresenter::attach(world, model, HeadlessView::default()).unwrap()
}

pub fn presenter(world: &World, presenter: Entity) -> &PropertyPresenter {
    world.get::<PropertyPresenter>(presenter).unwrap()
}

pub fn view(world: &World, presenter: Entity) -> &HeadlessView {
    self::presenter(world, presenter)
        .view::<HeadlessView>()
        .unwrap()
}

pub fn view_mut(world: &mut World, presenter: Entity) -> &mut HeadlessView {
    world
        .get_mut::<PropertyPresenter>(presenter)
        .unwrap()
        .into_inner()
        .view_mut::<HeadlessView>()
        .unwrap()
}
