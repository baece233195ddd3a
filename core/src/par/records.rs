//! Simulation control and report selection records.

use crate::record::{FieldSpec, Record, RecordSchema};

/// `SIMULOINNIN_OHJAUS`: 17 slots, most reserved by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlSchema;

impl RecordSchema for ControlSchema {
    const NAME: &'static str = "control";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::int("branch_stop_year"),
        FieldSpec::int("max_events"),
        FieldSpec::constant("_3", 0.0),
        FieldSpec::constant("_4", 0.0),
        FieldSpec::constant("_5", 1000.0),
        FieldSpec::constant("_6", 0.0),
        FieldSpec::constant("_7", 1.0),
        FieldSpec::int("max_branches"),
        FieldSpec::constant("_9", 0.0),
        FieldSpec::constant("_10", 0.0),
        FieldSpec::int("max_plots"),
        FieldSpec::int("smr_year"),
        FieldSpec::constant("_13", 0.0),
        FieldSpec::constant("_14", 0.0),
        FieldSpec::int("force_stop_year"),
        FieldSpec::int("land_value_mode"),
        FieldSpec::int("sim_mode"),
    ];
}

/// `TULOSTUS`: 10 slots of report switches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputSchema;

impl RecordSchema for OutputSchema {
    const NAME: &'static str = "output";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::bool("msc"),
        FieldSpec::bool("forest_sum"),
        FieldSpec::value("terminal_summary"),
        FieldSpec::value("terminal_data_report"),
        FieldSpec::bool("unit_sum"),
        FieldSpec::constant("_6", 0.0),
        FieldSpec::constant("_7", 0.0),
        FieldSpec::constant("_8", 0.0),
        FieldSpec::bool("smr"),
        FieldSpec::constant("_10", 0.0),
    ];
}

pub type Control = Record<ControlSchema>;
pub type Output = Record<OutputSchema>;
