use crate::fair::*;

pub const COL_STATE_ABBREVIATION: &str = "STATE ABBREVIATION";
pub const COL_STATE: &str = "STATE";
pub const COL_DISTRICT: &str = "D";
pub const COL_PARTY: &str = "PARTY";
pub const COL_CANDIDATE_NAME: &str = "CANDIDATE NAME";
// The trailing space is part of the column name in the published files.
pub const COL_GENERAL_VOTES: &str = "GENERAL VOTES ";
pub const COL_GENERAL_PCT: &str = "GENERAL %";
pub const COL_INCUMBENT: &str = "(I)";
pub const COL_WINNER: &str = "GE WINNER INDICATOR";

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn column_index<S: AsRef<str>>(header: &[S], column: &str, path: &str) -> HouseResult<usize> {
    header
        .iter()
        .position(|h| h.as_ref() == column)
        .context(MissingColumnSnafu { column, path })
}

fn optional_column_index<S: AsRef<str>>(header: &[S], column: &str) -> Option<usize> {
    let idx = header.iter().position(|h| h.as_ref() == column);
    if idx.is_none() {
        debug!("optional column {:?} not found", column);
    }
    idx
}

/// A count with thousands separators. Anything else counts as zero.
pub fn parse_count(s: &str) -> u64 {
    s.replace(',', "").trim().parse::<u64>().unwrap_or(0)
}

/// Positions of the columns of the results file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultsColumns {
    state_abbreviation: usize,
    state: usize,
    district: usize,
    party: usize,
    candidate_name: usize,
    general_votes: usize,
    pub general_percent: Option<usize>,
    incumbent: Option<usize>,
    winner: usize,
}

impl ResultsColumns {
    pub fn from_header<S: AsRef<str>>(header: &[S], path: &str) -> HouseResult<ResultsColumns> {
        Ok(ResultsColumns {
            state_abbreviation: column_index(header, COL_STATE_ABBREVIATION, path)?,
            state: column_index(header, COL_STATE, path)?,
            district: column_index(header, COL_DISTRICT, path)?,
            party: column_index(header, COL_PARTY, path)?,
            candidate_name: column_index(header, COL_CANDIDATE_NAME, path)?,
            general_votes: column_index(header, COL_GENERAL_VOTES, path)?,
            general_percent: optional_column_index(header, COL_GENERAL_PCT),
            incumbent: optional_column_index(header, COL_INCUMBENT),
            winner: column_index(header, COL_WINNER, path)?,
        })
    }

    /// Builds the raw row. Short lines leave the missing fields empty.
    pub fn row<S: AsRef<str>>(&self, cells: &[S]) -> RawCandidateRow {
        let get = |idx: usize| cells.get(idx).map(|s| s.as_ref().to_string());
        RawCandidateRow {
            state_abbreviation: get(self.state_abbreviation),
            state_name: get(self.state),
            district: get(self.district),
            party: get(self.party),
            candidate_name: get(self.candidate_name),
            general_votes: get(self.general_votes),
            general_percent: self.general_percent.and_then(get),
            incumbent_indicator: self.incumbent.and_then(get),
            winner_indicator: get(self.winner),
        }
    }
}
