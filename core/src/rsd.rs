//! Sample-plot/tree inventory records (MSB logical record type 1).

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::record::{FieldKind, FieldSpec, FloatStream, Record, RecordSchema};

/// Logical record type tag of [`InitialData`]
pub const INITIAL_DATA_RECORD_TYPE: i64 = 1;

const OPT_VALUE: FieldKind = FieldKind::Value;
const OPT_INT: FieldKind = FieldKind::Int;

/// Sample plot schema (34 slots).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplePlotSchema;

impl RecordSchema for SamplePlotSchema {
    const NAME: &'static str = "sample plot";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::int("id"),
        FieldSpec::int("year"),
        FieldSpec::value("area"),
        FieldSpec::value("area_weight"),
        FieldSpec::value("X"),
        FieldSpec::value("Y"),
        FieldSpec::optional("stand_id", &OPT_VALUE),
        FieldSpec::value("height"),
        FieldSpec::value("dd"),
        FieldSpec::int("owner_category"),
        FieldSpec::int("land_use_category"),
        FieldSpec::int("soil_category"),
        FieldSpec::int("site_type_category"),
        FieldSpec::int("taxation_class"),
        // forest taxation class or site fertility category
        FieldSpec::int("fftcsfc"),
        FieldSpec::int("drainage_category"),
        FieldSpec::int("drainage_feasibility"),
        FieldSpec::constant("_18", 0.0),
        FieldSpec::int("last_drainage_year"),
        FieldSpec::int("last_fertilization_year"),
        // soil surface preparation
        FieldSpec::int("last_ssp_year"),
        FieldSpec::int("natural_regen_feasibility"),
        FieldSpec::int("last_cleaning_year"),
        FieldSpec::optional("development_class", &OPT_VALUE),
        FieldSpec::int("last_artif_regen_year"),
        FieldSpec::int("last_tending_young_year"),
        FieldSpec::int("last_pruning_year"),
        FieldSpec::int("last_cutting_year"),
        FieldSpec::int("forestry_center"),
        FieldSpec::int("management_category"),
        FieldSpec::int("last_cutting_method"),
        FieldSpec::int("municipality"),
        FieldSpec::reserved("_33"),
        FieldSpec::reserved("_34"),
    ];
}

/// Tree schema (17 slots).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreeSchema;

impl RecordSchema for TreeSchema {
    const NAME: &'static str = "tree";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::value("f"),
        FieldSpec::int("spe"),
        FieldSpec::value("d"),
        FieldSpec::value("h"),
        FieldSpec::value("age"),
        FieldSpec::value("bio_age"),
        // reduction to model-based saw log volume
        FieldSpec::optional("rmswl", &OPT_VALUE),
        FieldSpec::optional("prune_year", &OPT_VALUE),
        // age at 1.3 m when diameter reached 10 cm
        FieldSpec::optional("age_13_10", &OPT_VALUE),
        FieldSpec::optional("origin", &OPT_INT),
        FieldSpec::optional("sample_id", &OPT_INT),
        FieldSpec::optional("orig_angle", &OPT_VALUE),
        FieldSpec::optional("orig_dist", &OPT_VALUE),
        FieldSpec::optional("orig_hdif", &OPT_VALUE),
        FieldSpec::optional("h_low_branch", &OPT_VALUE),
        FieldSpec::optional("management_category", &OPT_INT),
        FieldSpec::reserved("_17"),
    ];
}

pub type SamplePlot = Record<SamplePlotSchema>;
pub type Tree = Record<TreeSchema>;

fn plot_len() -> usize {
    SamplePlot::schema_len()
}

fn tree_len() -> usize {
    Tree::schema_len()
}

/// Initial inventory data of one sample plot and its trees.
///
/// The field counts record how many schema slots the producer wrote, so a
/// partially-populated record re-encodes to the same prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialData {
    #[serde(flatten)]
    pub plot: SamplePlot,
    #[serde(default = "plot_len")]
    pub plot_field_count: usize,
    #[serde(default = "tree_len")]
    pub tree_field_count: usize,
    #[serde(default)]
    pub trees: Vec<Tree>,
}

impl Default for InitialData {
    fn default() -> Self {
        Self::new(SamplePlot::new(), Vec::new())
    }
}

impl InitialData {
    /// Create a record that uses the full plot and tree schemas
    pub fn new(plot: SamplePlot, trees: Vec<Tree>) -> Self {
        Self {
            plot,
            plot_field_count: plot_len(),
            tree_field_count: tree_len(),
            trees,
        }
    }

    /// Decode the payload `[nv, plot..., nt, ntv, trees...]`.
    ///
    /// Every value must be consumed; leftovers are a format violation.
    pub fn from_floats(values: &[f64]) -> Result<Self, RecordError> {
        let mut stream = FloatStream::from_vec(values.to_vec());

        let plot_field_count = field_count::<SamplePlotSchema>(stream.read_int()?)?;
        let plot = SamplePlot::decode_prefix(&mut stream, plot_field_count)?;

        let tree_count = stream.read_int()?;
        let tree_count = usize::try_from(tree_count).map_err(|_| RecordError::InvalidCount {
            what: "tree",
            count: tree_count,
        })?;
        let tree_field_count = field_count::<TreeSchema>(stream.read_int()?)?;

        // zero-field trees carry no values, so any count is unbounded
        if tree_field_count == 0 && tree_count > stream.remaining() {
            return Err(RecordError::InvalidCount {
                what: "tree",
                count: tree_count as i64,
            });
        }
        // each tree needs at least its field count in values
        if tree_count.saturating_mul(tree_field_count) > stream.remaining() {
            return Err(RecordError::BufferOverrun);
        }

        let trees = (0..tree_count)
            .map(|_| Tree::decode_prefix(&mut stream, tree_field_count))
            .collect::<Result<Vec<_>, _>>()?;

        if !stream.is_exhausted() {
            return Err(RecordError::TrailingValues {
                record: "initial data",
                count: stream.remaining(),
            });
        }

        Ok(Self {
            plot,
            plot_field_count,
            tree_field_count,
            trees,
        })
    }

    /// Encode the payload using the stored field counts.
    pub fn to_floats(&self) -> Result<Vec<f64>, RecordError> {
        let mut stream = FloatStream::new();
        stream.write(field_count::<SamplePlotSchema>(self.plot_field_count as i64)? as f64);
        self.plot.encode_prefix(&mut stream, self.plot_field_count)?;
        stream.write(self.trees.len() as f64);
        stream.write(field_count::<TreeSchema>(self.tree_field_count as i64)? as f64);
        for tree in &self.trees {
            tree.encode_prefix(&mut stream, self.tree_field_count)?;
        }
        Ok(stream.into_vec())
    }
}

/// Validate a field count header against a schema.
fn field_count<K: RecordSchema>(given: i64) -> Result<usize, RecordError> {
    let max = K::FIELDS.len();
    match usize::try_from(given) {
        Ok(n) if n <= max => Ok(n),
        _ => Err(RecordError::TooManyFields {
            record: K::NAME,
            given,
            max,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn plot_floats() -> Vec<f64> {
        let mut v = vec![
            101.0, 2020.0, 1.5, 0.8, 6800000.0, 3400000.0, 0.0, 95.0, 1200.0,
        ];
        // owner .. drainage_feasibility
        v.extend([1.0, 1.0, 1.0, 3.0, 2.0, 3.0, 0.0, 0.0]);
        // _18, last drainage .. last cleaning
        v.extend([0.0, 1990.0, 0.0, 0.0, 1.0, 2005.0]);
        // development_class .. municipality, reserved
        v.extend([4.0, 1998.0, 2003.0, 0.0, 2012.0, 4.0, 1.0, 2.0, 91.0, 7.0, 8.0]);
        v
    }

    fn tree_floats(f: f64) -> Vec<f64> {
        let mut v = vec![f, 1.0, 21.5, 18.0, 45.0, 50.0];
        v.extend([0.0; 10]);
        v.push(3.0);
        v
    }

    #[test]
    fn test_schema_sizes() {
        assert_eq!(SamplePlot::schema_len(), 34);
        assert_eq!(Tree::schema_len(), 17);
    }

    #[test]
    fn test_decode_full_record() {
        let mut payload = vec![34.0];
        payload.extend(plot_floats());
        payload.extend([2.0, 17.0]);
        payload.extend(tree_floats(120.0));
        payload.extend(tree_floats(80.0));

        let data = InitialData::from_floats(&payload).unwrap();
        assert_eq!(data.plot.get_i64("id"), Some(101));
        assert_eq!(data.plot.get("stand_id"), None);
        assert_eq!(data.plot.get_f64("development_class"), Some(4.0));
        assert_eq!(data.trees.len(), 2);
        assert_eq!(data.trees[1].get_f64("f"), Some(80.0));
        assert_eq!(data.trees[0].get("origin"), None);

        // reserved slots come back as zero
        let mut expected = payload.clone();
        expected[33] = 0.0;
        expected[34] = 0.0;
        expected[35 + 2 + 16] = 0.0;
        expected[35 + 2 + 17 + 16] = 0.0;
        assert_eq!(data.to_floats().unwrap(), expected);
    }

    #[test]
    fn test_partial_field_counts_roundtrip() {
        let payload = vec![3.0, 7.0, 2001.0, 2.5, 1.0, 2.0, 9.0, 1.0];
        let data = InitialData::from_floats(&payload).unwrap();
        assert_eq!(data.plot_field_count, 3);
        assert_eq!(data.tree_field_count, 2);
        assert_eq!(data.plot.get("area_weight"), None);
        assert_eq!(data.trees[0].get_i64("spe"), Some(1));
        assert_eq!(data.to_floats().unwrap(), payload);
    }

    #[test]
    fn test_field_count_too_large() {
        let err = InitialData::from_floats(&[35.0]).unwrap_err();
        assert_eq!(
            err,
            RecordError::TooManyFields {
                record: "sample plot",
                given: 35,
                max: 34
            }
        );
        assert_eq!(
            err.to_string(),
            "given 35 sample plot fields but only have 34"
        );
    }

    #[test]
    fn test_negative_tree_count() {
        let err = InitialData::from_floats(&[0.0, -1.0, 17.0]).unwrap_err();
        assert!(matches!(err, RecordError::InvalidCount { count: -1, .. }));
    }

    #[test]
    fn test_huge_tree_count_without_fields() {
        let err = InitialData::from_floats(&[0.0, 1_000_000.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidCount {
                what: "tree",
                count: 1_000_000
            }
        ));
        assert_eq!(err.kind(), ErrorKind::FormatViolation);

        let empty = InitialData::from_floats(&[0.0, 0.0, 0.0]).unwrap();
        assert!(empty.trees.is_empty());
    }

    #[test]
    fn test_trailing_values_rejected() {
        let err = InitialData::from_floats(&[0.0, 0.0, 0.0, 5.0]).unwrap_err();
        assert!(matches!(err, RecordError::TrailingValues { count: 1, .. }));
    }

    #[test]
    fn test_truncated_tree() {
        let err = InitialData::from_floats(&[0.0, 2.0, 2.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, RecordError::BufferOverrun);
    }

    #[test]
    fn test_json_shape() {
        let payload = vec![2.0, 7.0, 2001.0, 1.0, 1.0, 2.0];
        let data = InitialData::from_floats(&payload).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "year": 2001,
                "plot_field_count": 2,
                "tree_field_count": 1,
                "trees": [{ "f": 2.0 }]
            })
        );
        let back: InitialData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_json_counts_default_to_full_schema() {
        let data: InitialData = serde_json::from_value(serde_json::json!({
            "id": 7,
            "trees": []
        }))
        .unwrap();
        assert_eq!(data.plot_field_count, 34);
        assert_eq!(data.tree_field_count, 17);
    }
}
