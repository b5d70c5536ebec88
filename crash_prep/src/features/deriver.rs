//! Derivation of the categorical and list-valued feature inputs.
//!
//! The rest of the pipeline only relies on the contract of
//! [`FeatureDeriver`]: given the labeled table, produce one that contains
//! `borough`, `zip code`, `on street name`, `vehicles` and `factors`, with
//! the same rows in the same order, plus whatever base columns should be
//! carried into the feature matrix.

use polars::prelude::*;

use crate::core::columns::{
    has_column, require_columns, string_values, BOROUGH, CONTRIBUTING_FACTORS, FEATURE_BOROUGH,
    FEATURE_FACTORS, FEATURE_STREET, FEATURE_VEHICLES, FEATURE_ZIP_CODE, ON_STREET_NAME,
    VEHICLE_TYPE_CODES, ZIP_CODE,
};
use crate::error::Result;

/// Produces the feature input columns from a labeled collision table.
pub trait FeatureDeriver {
    fn derive_features(&self, df: DataFrame) -> Result<DataFrame>;
}

/// Reference deriver for the collision export layout.
///
/// Categorical columns are trimmed and uppercased, blanks become missing.
/// The up-to-five vehicle type and contributing factor slots of each crash
/// are joined into space-separated lists; spaces inside an entry become
/// underscores so every entry stays a single token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrashFeatureDeriver;

/// Uppercases and trims; blank values are missing.
fn normalize_level(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
}

/// One list entry: internal whitespace runs collapse to `_`.
fn normalize_entry(value: &str) -> Option<String> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("_").to_uppercase())
    }
}

/// Joins the present slots of each row into a space-separated list.
///
/// The first slot is required; later slots are optional since older exports
/// omit them.
fn join_slots(df: &DataFrame, slots: &[&str]) -> Result<(Vec<String>, Vec<String>)> {
    require_columns(df, &slots[..1])?;

    let present: Vec<String> = slots
        .iter()
        .filter(|slot| has_column(df, slot))
        .map(|slot| slot.to_string())
        .collect();

    let mut lists = vec![Vec::new(); df.height()];
    for slot in &present {
        for (row, value) in string_values(df, slot)?.into_iter().enumerate() {
            if let Some(entry) = value.as_deref().and_then(normalize_entry) {
                lists[row].push(entry);
            }
        }
    }

    let joined = lists.into_iter().map(|entries| entries.join(" ")).collect();
    Ok((joined, present))
}

impl FeatureDeriver for CrashFeatureDeriver {
    fn derive_features(&self, mut df: DataFrame) -> Result<DataFrame> {
        require_columns(&df, &[BOROUGH, ZIP_CODE, ON_STREET_NAME])?;

        for (source, target) in [
            (BOROUGH, FEATURE_BOROUGH),
            (ZIP_CODE, FEATURE_ZIP_CODE),
            (ON_STREET_NAME, FEATURE_STREET),
        ] {
            let levels: Vec<Option<String>> = string_values(&df, source)?
                .into_iter()
                .map(normalize_level)
                .collect();
            df = df.drop(source)?;
            df.with_column(Series::new(target.into(), levels))?;
        }

        let (vehicles, vehicle_slots) = join_slots(&df, &VEHICLE_TYPE_CODES)?;
        let (factors, factor_slots) = join_slots(&df, &CONTRIBUTING_FACTORS)?;

        df = df.drop_many(vehicle_slots.iter().chain(&factor_slots).map(String::as_str));

        df.with_column(Series::new(FEATURE_VEHICLES.into(), vehicles))?;
        df.with_column(Series::new(FEATURE_FACTORS.into(), factors))?;

        log::debug!("Derived feature inputs for {} rows", df.height());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::columns::column_names;
    use crate::error::PipelineError;

    fn frame() -> DataFrame {
        df!(
            "BOROUGH" => [Some(" brooklyn "), None, Some("")],
            "ZIP CODE" => [Some(11201i64), None, Some(10001)],
            "ON STREET NAME" => [Some("ATLANTIC AVENUE"), Some("BROADWAY"), None],
            "VEHICLE TYPE CODE 1" => [Some("Sedan"), Some("Bike"), None],
            "VEHICLE TYPE CODE 2" => [Some("Station Wagon/Sport Utility Vehicle"), None, None],
            "CONTRIBUTING FACTOR VEHICLE 1" => [Some("Unspecified"), Some("Driver Inattention/Distraction"), None],
            "outcome" => [Some(0i32), Some(1), None],
        )
        .unwrap()
    }

    #[test]
    fn test_derives_contract_columns() {
        let df = CrashFeatureDeriver.derive_features(frame()).unwrap();
        let names = column_names(&df);

        assert_eq!(
            names,
            vec!["outcome", "borough", "zip code", "on street name", "vehicles", "factors"]
        );
        assert_eq!(df.height(), 3);

        let borough = string_values(&df, "borough").unwrap();
        assert_eq!(borough, vec![Some("BROOKLYN".to_string()), None, None]);

        let zip = string_values(&df, "zip code").unwrap();
        assert_eq!(zip[0].as_deref(), Some("11201"));

        let vehicles = string_values(&df, "vehicles").unwrap();
        assert_eq!(
            vehicles,
            vec![
                Some("SEDAN STATION_WAGON/SPORT_UTILITY_VEHICLE".to_string()),
                Some("BIKE".to_string()),
                Some(String::new()),
            ]
        );

        let factors = string_values(&df, "factors").unwrap();
        assert_eq!(factors[1].as_deref(), Some("DRIVER_INATTENTION/DISTRACTION"));
    }

    #[test]
    fn test_first_slot_is_required() {
        let df = frame().drop("VEHICLE TYPE CODE 1").unwrap();
        assert!(matches!(
            CrashFeatureDeriver.derive_features(df),
            Err(PipelineError::Schema(_))
        ));
    }
}
