// ********* Reference tables ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::ops::AddAssign;
use std::str::FromStr;

/// Party labels that are major parties on their own.
pub const MAJOR_PARTIES: [&str; 2] = ["D", "R"];

/// Minor-party labels that are affiliated with a major party.
pub const PARTY_AFFILIATIONS: [(&str, MajorParty); 3] = [
    ("DFL", MajorParty::D),
    ("DNL", MajorParty::D),
    ("WF", MajorParty::D),
];

pub const VALID_STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

/// Vote fields that mark a row as unusable. Compared after lower-casing.
pub const INVALID_VOTES_STRINGS: [&str; 2] = ["n/a", "#"];

pub const UNOPPOSED_MARKER: &str = "unopposed";

/// The election cycles for which results can be processed.
pub const SUPPORTED_CYCLES: [u32; 3] = [2014, 2012, 2010];

// ********* Input data structures ***********

/// One of the two parties recognized by the fairness metrics.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum MajorParty {
    D,
    R,
}

impl MajorParty {
    /// Exact match on a major party label.
    pub fn from_label(label: &str) -> Option<MajorParty> {
        match label {
            "D" => Some(MajorParty::D),
            "R" => Some(MajorParty::R),
            _ => None,
        }
    }

    pub fn opponent(self) -> MajorParty {
        match self {
            MajorParty::D => MajorParty::R,
            MajorParty::R => MajorParty::D,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MajorParty::D => "D",
            MajorParty::R => "R",
        }
    }
}

impl Display for MajorParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of the results file, as delivered by the readers.
///
/// Nothing is validated at this point: all the fields are optional strings, exactly as they
/// appear in the source. `normalize_row` turns it into a `CandidateRecord`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawCandidateRow {
    pub state_abbreviation: Option<String>,
    pub state_name: Option<String>,
    pub district: Option<String>,
    pub party: Option<String>,
    pub candidate_name: Option<String>,
    pub general_votes: Option<String>,
    pub general_percent: Option<String>,
    pub incumbent_indicator: Option<String>,
    pub winner_indicator: Option<String>,
}

impl RawCandidateRow {
    pub fn new(
        state: &str,
        state_name: &str,
        district: &str,
        party: &str,
        name: &str,
        votes: &str,
    ) -> RawCandidateRow {
        RawCandidateRow {
            state_abbreviation: Some(state.to_string()),
            state_name: Some(state_name.to_string()),
            district: Some(district.to_string()),
            party: Some(party.to_string()),
            candidate_name: Some(name.to_string()),
            general_votes: Some(votes.to_string()),
            ..Default::default()
        }
    }

    pub fn percent(mut self, pct: &str) -> RawCandidateRow {
        self.general_percent = Some(pct.to_string());
        self
    }

    pub fn winner(mut self) -> RawCandidateRow {
        self.winner_indicator = Some("W".to_string());
        self
    }

    pub fn incumbent(mut self) -> RawCandidateRow {
        self.incumbent_indicator = Some("(I)".to_string());
        self
    }
}

/// A validated candidate line of the results.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateRecord {
    pub state: String,
    pub state_name: String,
    /// The first two characters of the district column. Not necessarily numeric.
    pub district: String,
    pub party: String,
    pub name: String,
    /// None when the count could not be resolved (unopposed or unparseable).
    pub votes: Option<u64>,
    /// Fraction in [0, 1]. None for unopposed races.
    pub pct: Option<f64>,
    pub incumbent: bool,
    pub won: bool,
    pub unopposed: bool,
}

// ******** Intermediate data structures *********

/// A person running in a district, after merging all the ballot lines under the same name.
#[derive(PartialEq, Debug, Clone)]
pub struct ResolvedCandidate {
    pub record: CandidateRecord,
    pub major_party: Option<MajorParty>,
    /// Party labels merged into this candidate, in encounter order.
    pub other_parties: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct District {
    pub state: String,
    pub number: u32,
    pub candidates: Vec<ResolvedCandidate>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct RepCounts {
    pub d: u32,
    pub r: u32,
    pub other: u32,
    /// Counted independently of the party counters.
    pub unopposed: u32,
}

impl RepCounts {
    pub fn total(&self) -> u32 {
        self.d + self.r + self.other
    }
}

/// Wasted votes of a district or of a whole state.
///
/// The wasted votes of a winner can be negative if the input is inconsistent (a flagged winner
/// with fewer votes than the opponent).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct WastedVotes {
    pub wasted_d: i64,
    pub wasted_r: i64,
    pub total_dr: u64,
}

impl AddAssign for WastedVotes {
    fn add_assign(&mut self, rhs: WastedVotes) {
        self.wasted_d = self.wasted_d.saturating_add(rhs.wasted_d);
        self.wasted_r = self.wasted_r.saturating_add(rhs.wasted_r);
        self.total_dr = self.total_dr.saturating_add(rhs.total_dr);
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StateTally {
    pub id: String,
    pub name: String,
    pub num_reps: RepCounts,
    /// The district winners, in district order.
    pub winners: Vec<ResolvedCandidate>,
    pub wasted: WastedVotes,
    /// Number of districts that contributed to the wasted votes.
    pub qualifying_districts: u32,
}

impl StateTally {
    /// (wasted R - wasted D) / total D and R votes. None if no district qualified.
    pub fn efficiency_gap_d(&self) -> Option<f64> {
        if self.wasted.total_dr == 0 {
            return None;
        }
        let gap = self.wasted.wasted_r.saturating_sub(self.wasted.wasted_d);
        Some(gap as f64 / self.wasted.total_dr as f64)
    }

    pub fn efficiency_gap_seats_d(&self) -> Option<f64> {
        self.efficiency_gap_d()
            .map(|eg| eg * (self.num_reps.d + self.num_reps.r) as f64)
    }
}

// ******** Reference data *********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ApportionmentRecord {
    pub population: u64,
    pub seats: u32,
}

/// decade -> state full name -> apportionment
pub type ApportionmentTable = BTreeMap<u32, BTreeMap<String, ApportionmentRecord>>;

/// Statewide House votes from an independent source.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct StateVoteShare {
    pub d: u64,
    pub r: u64,
    pub other: u64,
}

impl StateVoteShare {
    pub fn total(&self) -> u64 {
        self.d.saturating_add(self.r).saturating_add(self.other)
    }

    fn share(&self, count: u64) -> Option<f64> {
        match self.total() {
            0 => None,
            t => Some(count as f64 / t as f64),
        }
    }

    pub fn d_pct(&self) -> Option<f64> {
        self.share(self.d)
    }

    pub fn r_pct(&self) -> Option<f64> {
        self.share(self.r)
    }

    pub fn other_pct(&self) -> Option<f64> {
        self.share(self.other)
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReferenceData {
    pub apportionments: ApportionmentTable,
    /// Keyed by state abbreviation.
    pub vote_shares: BTreeMap<String, StateVoteShare>,
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct StateFairnessMetrics {
    pub tally: StateTally,
    pub votes: StateVoteShare,
    pub popular_vote_seats_d: i64,
    /// Positive when the Democratic seats exceed what the statewide vote share predicts.
    pub popular_representation_delta: i64,
    pub efficiency_gap_d: Option<f64>,
    pub efficiency_gap_seats_d: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct FairnessResult {
    /// Sorted by increasing `efficiency_gap_seats_d`. States without a defined efficiency gap
    /// come last.
    pub states: Vec<StateFairnessMetrics>,
    pub total_efficiency_gap_seats_d: f64,
    pub total_popular_representation_delta: i64,
}

impl FairnessResult {
    /// The same states, sorted by increasing popular representation delta.
    pub fn ranked_by_popular_representation(&self) -> Vec<&StateFairnessMetrics> {
        let mut res: Vec<&StateFairnessMetrics> = self.states.iter().collect();
        res.sort_by(|a, b| {
            a.popular_representation_delta
                .cmp(&b.popular_representation_delta)
                .then_with(|| a.tally.id.cmp(&b.tally.id))
        });
        res
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct FairnessReport {
    pub cycle: ElectionCycle,
    pub result: FairnessResult,
    pub warnings: Vec<Warning>,
}

/// Conditions that do not stop the processing. The affected row, district or state is either
/// defaulted or excluded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Warning {
    UnparseableVotes {
        state: String,
        value: String,
    },
    AmbiguousMajorParty {
        state: String,
        district: u32,
        name: String,
        party: String,
    },
    NoWinner {
        state: String,
        district: u32,
    },
    MultipleWinners {
        state: String,
        district: u32,
        count: usize,
        kept: String,
    },
    MissingApportionmentDecade {
        year: u32,
        decade: u32,
    },
    MissingApportionmentState {
        state: String,
        name: String,
        decade: u32,
    },
    ApportionmentMismatch {
        state: String,
        expected: u32,
        actual: u32,
    },
    MissingVoteShare {
        state: String,
    },
}

impl Warning {
    /// True for the warnings telling that a state could not be checked against the
    /// apportionment counts.
    pub fn is_cannot_validate(&self) -> bool {
        matches!(
            self,
            Warning::MissingApportionmentDecade { .. } | Warning::MissingApportionmentState { .. }
        )
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnparseableVotes { state, value } => {
                write!(f, "votes is not a number: {} [{}]", value, state)
            }
            Warning::AmbiguousMajorParty {
                state,
                district,
                name,
                party,
            } => write!(
                f,
                "{}-{:02}: no major party for winner {} ({})",
                state, district, name, party
            ),
            Warning::NoWinner { state, district } => {
                write!(f, "No winner found in {}-{:02}", state, district)
            }
            Warning::MultipleWinners {
                state,
                district,
                count,
                kept,
            } => write!(
                f,
                "{} winners found in {}-{:02}, keeping {}",
                count, state, district, kept
            ),
            Warning::MissingApportionmentDecade { year, decade } => write!(
                f,
                "Cannot validate states results for House year {}; no apportionments data available for {}",
                year, decade
            ),
            Warning::MissingApportionmentState {
                state,
                name,
                decade,
            } => write!(
                f,
                "Cannot validate state {}; no apportionment for {} in {}",
                state, name, decade
            ),
            Warning::ApportionmentMismatch {
                state,
                expected,
                actual,
            } => write!(
                f,
                "Incorrect number of reps for state {}; expected:{}, actual:{}",
                state, expected, actual
            ),
            Warning::MissingVoteShare { state } => write!(f, "No house votes data for {}", state),
        }
    }
}

// ********* Configuration **********

/// A validated election year.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ElectionCycle(u32);

impl ElectionCycle {
    pub fn new(year: u32) -> Result<ElectionCycle, MetricsErrors> {
        if SUPPORTED_CYCLES.contains(&year) {
            Ok(ElectionCycle(year))
        } else {
            Err(MetricsErrors::UnsupportedCycle(year.to_string()))
        }
    }

    pub fn year(&self) -> u32 {
        self.0
    }

    /// The census decade whose apportionment governs this election.
    pub fn decade(&self) -> u32 {
        (self.0 / 10) * 10
    }
}

impl FromStr for ElectionCycle {
    type Err = MetricsErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(year) => ElectionCycle::new(year),
            Err(_) => Err(MetricsErrors::UnsupportedCycle(s.to_string())),
        }
    }
}

impl Display for ElectionCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that prevent the computation from starting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MetricsErrors {
    UnsupportedCycle(String),
}

impl Error for MetricsErrors {}

impl Display for MetricsErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsErrors::UnsupportedCycle(year) => {
                let supported: Vec<String> =
                    SUPPORTED_CYCLES.iter().map(|y| y.to_string()).collect();
                write!(
                    f,
                    "Year '{}' not available. Supported years: {}",
                    year,
                    supported.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_share_percentages() {
        let share = StateVoteShare {
            d: 30,
            r: 60,
            other: 10,
        };
        assert_eq!(share.total(), 100);
        assert_eq!(share.d_pct(), Some(0.3));
        assert_eq!(share.r_pct(), Some(0.6));
        assert_eq!(share.other_pct(), Some(0.1));
    }

    #[test]
    fn empty_vote_share_has_no_percentages() {
        let share = StateVoteShare::default();
        assert_eq!(share.total(), 0);
        assert_eq!(share.d_pct(), None);
        assert_eq!(share.r_pct(), None);
        assert_eq!(share.other_pct(), None);
    }

    #[test]
    fn efficiency_gap_saturates() {
        let tally = StateTally {
            id: "CT".to_string(),
            name: "Connecticut".to_string(),
            num_reps: RepCounts::default(),
            winners: vec![],
            wasted: WastedVotes {
                wasted_d: i64::MIN,
                wasted_r: i64::MAX,
                total_dr: u64::MAX,
            },
            qualifying_districts: 2,
        };
        assert!(tally.efficiency_gap_d().unwrap().is_finite());
    }
}
