pub use crate::config::*;

/// A builder collecting the results rows and the reference data of one election cycle.
///
/// ```
/// use house_fairness::builder::Builder;
/// use house_fairness::{ElectionCycle, MetricsErrors, RawCandidateRow};
///
/// let mut builder = Builder::new("2014".parse::<ElectionCycle>()?)
///     .apportionment(2010, "Vermont", 625_741, 1)
///     .vote_share("VT", 100, 120, 10);
///
/// builder.add_row(RawCandidateRow::new("VT", "Vermont", "0", "D", "Peter Welch", "123,349").winner());
/// builder.add_row(RawCandidateRow::new("VT", "Vermont", "0", "R", "Mark Donka", "59,432"));
///
/// let report = builder.run();
/// assert_eq!(report.result.states[0].tally.num_reps.d, 1);
/// # Ok::<(), MetricsErrors>(())
/// ```
pub struct Builder {
    pub(crate) _cycle: ElectionCycle,
    pub(crate) _reference: ReferenceData,
    pub(crate) _rows: Vec<RawCandidateRow>,
}

impl Builder {
    pub fn new(cycle: ElectionCycle) -> Builder {
        Builder {
            _cycle: cycle,
            _reference: ReferenceData::default(),
            _rows: Vec::new(),
        }
    }

    /// Replaces all the reference data.
    pub fn reference(self, reference: ReferenceData) -> Builder {
        Builder {
            _cycle: self._cycle,
            _reference: reference,
            _rows: self._rows,
        }
    }

    pub fn apportionment(
        mut self,
        decade: u32,
        state_name: &str,
        population: u64,
        seats: u32,
    ) -> Builder {
        self._reference
            .apportionments
            .entry(decade)
            .or_default()
            .insert(state_name.to_string(), ApportionmentRecord { population, seats });
        self
    }

    pub fn vote_share(mut self, state: &str, d: u64, r: u64, other: u64) -> Builder {
        self._reference
            .vote_shares
            .insert(state.to_string(), StateVoteShare { d, r, other });
        self
    }

    pub fn add_row(&mut self, row: RawCandidateRow) {
        self._rows.push(row);
    }

    pub fn add_rows(&mut self, rows: Vec<RawCandidateRow>) {
        self._rows.extend(rows);
    }

    pub fn run(&self) -> FairnessReport {
        crate::run_fairness_metrics(&self._rows, self._cycle, &self._reference)
    }
}
