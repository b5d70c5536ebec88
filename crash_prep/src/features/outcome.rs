//! Cyclist outcome labeling.

use polars::prelude::*;

use crate::core::columns::{
    count_values, drop_columns, require_columns, CYCLIST_INJURED, CYCLIST_KILLED, OUTCOME,
};
use crate::core::domain::Outcome;
use crate::error::Result;

/// Adds the ordinal `outcome` column and removes the two cyclist counts.
///
/// `0` no cyclist injury, `1` injury, `2` fatality. A fatality overrides an
/// injury on the same row. Rows whose injured count is missing and that have
/// no fatality keep a null outcome.
///
/// # Examples
///
/// ```
/// use crash_prep::features::label_outcome;
/// use polars::prelude::*;
///
/// let df = df!(
///     "NUMBER OF CYCLIST INJURED" => [0i64, 1, 1],
///     "NUMBER OF CYCLIST KILLED" => [0i64, 0, 1],
/// ).unwrap();
///
/// let labeled = label_outcome(&df).unwrap();
/// let outcome = labeled.column("outcome").unwrap().i32().unwrap();
/// assert_eq!(outcome.into_iter().collect::<Vec<_>>(), vec![Some(0), Some(1), Some(2)]);
/// assert_eq!(labeled.width(), 1);
/// ```
pub fn label_outcome(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[CYCLIST_INJURED, CYCLIST_KILLED])?;

    let injured = count_values(df, CYCLIST_INJURED)?;
    let killed = count_values(df, CYCLIST_KILLED)?;

    let outcomes: Vec<Option<i32>> = injured
        .into_iter()
        .zip(killed)
        .map(|(injured, killed)| Outcome::from_counts(injured, killed).map(Outcome::code))
        .collect();

    let unlabeled = outcomes.iter().filter(|o| o.is_none()).count();
    if unlabeled > 0 {
        log::warn!("{} rows have no outcome label", unlabeled);
    }

    let mut labeled = drop_columns(df.clone(), &[CYCLIST_INJURED, CYCLIST_KILLED])?;
    labeled.with_column(Series::new(OUTCOME.into(), outcomes))?;
    Ok(labeled)
}
