use std::fmt;

use balance_client::domain::Observation;

/// What [`merge_observation_with_outcome`] did to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Appended,
    Replaced,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOutcome::Appended => f.write_str("appended"),
            MergeOutcome::Replaced => f.write_str("replaced last"),
        }
    }
}

/// True when both observations fall into the same UTC calendar hour.
pub fn same_hour(a: &Observation, b: &Observation) -> bool {
    a.hour_bucket() == b.hour_bucket()
}

/// Pure same-hour coalescing of a new observation into the series.
///
/// Rules:
/// - the tail is replaced when `new_obs` is in the same hour bucket as it;
/// - otherwise `new_obs` is appended once;
/// - entries before the tail are never touched.
pub fn merge_observation(series: Vec<Observation>, new_obs: Observation) -> Vec<Observation> {
    merge_observation_with_outcome(series, new_obs).0
}

pub fn merge_observation_with_outcome(
    mut series: Vec<Observation>,
    new_obs: Observation,
) -> (Vec<Observation>, MergeOutcome) {
    if series.last().is_some_and(|last| same_hour(last, &new_obs)) {
        series.pop();
        series.push(new_obs);
        return (series, MergeOutcome::Replaced);
    }

    series.push(new_obs);
    (series, MergeOutcome::Appended)
}
