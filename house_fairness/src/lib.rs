mod config;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap};

pub mod builder;
pub mod manual;

pub use crate::config::*;

// **** Pipeline context ****

/// The warnings raised while processing one run.
///
/// Every warning is logged when it is recorded. A fresh context is created for each run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn warn(&mut self, w: Warning) {
        warn!("{}", w);
        self.warnings.push(w);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// state -> district number -> candidate records, in encounter order.
pub type GroupedRecords = BTreeMap<String, BTreeMap<u32, Vec<CandidateRecord>>>;

/// Runs the whole aggregation for one election cycle.
///
/// Arguments:
/// * `rows` the candidate rows of the results file, in file order
/// * `cycle` the election year these rows belong to
/// * `reference` the apportionment counts and the statewide vote shares
pub fn run_fairness_metrics(
    rows: &[RawCandidateRow],
    cycle: ElectionCycle,
    reference: &ReferenceData,
) -> FairnessReport {
    info!("Processing {:?} rows for cycle {}", rows.len(), cycle);
    let mut diagnostics = Diagnostics::new();

    let records: Vec<CandidateRecord> = rows
        .iter()
        .filter_map(|row| normalize_row(row, &mut diagnostics))
        .collect();
    info!("{:?} candidate records after normalization", records.len());

    let grouped = group_districts(records);
    let tallies = aggregate_states(grouped, &mut diagnostics);
    for t in tallies.iter() {
        info!(
            "[{}]:{} -- (D{} R{} O{})",
            t.id,
            t.num_reps.total(),
            t.num_reps.d,
            t.num_reps.r,
            t.num_reps.other
        );
    }

    validate_apportionment(&tallies, cycle, &reference.apportionments, &mut diagnostics);
    let result = compute_fairness(tallies, &reference.vote_shares, &mut diagnostics);
    info!(
        "{:?} states in the ranking, total efficiency gap seats: {:?}",
        result.states.len(),
        result.total_efficiency_gap_seats_d
    );

    FairnessReport {
        cycle,
        result,
        warnings: diagnostics.into_warnings(),
    }
}

// **** Record normalization ****

/// Validates one raw row.
///
/// Returns None when the row must be dropped: unknown state, no vote field or an invalid vote
/// sentinel. A vote count that cannot be parsed is kept as unresolved, with a warning.
pub fn normalize_row(
    row: &RawCandidateRow,
    diagnostics: &mut Diagnostics,
) -> Option<CandidateRecord> {
    let state = row.state_abbreviation.as_deref()?;
    if !VALID_STATES.contains(&state) {
        debug!("normalize_row: skipping state {:?}", state);
        return None;
    }
    let votes = match row.general_votes.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            debug!("normalize_row: no votes in row {:?}", row);
            return None;
        }
    };

    let votes_lower = votes.to_lowercase();
    if INVALID_VOTES_STRINGS.contains(&votes_lower.as_str()) {
        debug!("normalize_row: invalid votes {:?} in {}", votes, state);
        return None;
    }
    let unopposed = votes_lower.contains(UNOPPOSED_MARKER);

    let parsed_votes = votes.replace(',', "").parse::<u64>().ok();
    if parsed_votes.is_none() && !unopposed {
        diagnostics.warn(Warning::UnparseableVotes {
            state: state.to_string(),
            value: votes.to_string(),
        });
    }

    let pct = if unopposed {
        None
    } else {
        row.general_percent.as_deref().and_then(parse_percent)
    };

    Some(CandidateRecord {
        state: state.to_string(),
        state_name: row.state_name.as_deref().unwrap_or("").trim().to_string(),
        district: row
            .district
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(2)
            .collect(),
        party: row.party.as_deref().unwrap_or("").trim().to_string(),
        name: clean_candidate_name(row.candidate_name.as_deref().unwrap_or("")),
        votes: parsed_votes,
        pct,
        incumbent: is_present(&row.incumbent_indicator),
        won: is_present(&row.winner_indicator),
        unopposed,
    })
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn parse_percent(s: &str) -> Option<f64> {
    s.replace('%', "")
        .trim()
        .parse::<f64>()
        .ok()
        .map(|p| p / 100.0)
        .filter(|p| (0.0..=1.0).contains(p))
}

// Some names carry a trailing ' #' marker in the source files.
fn clean_candidate_name(name: &str) -> String {
    let name = name.trim();
    match name.find(" #") {
        Some(idx) => name[..idx].trim_end().to_string(),
        None => name.to_string(),
    }
}

// **** Grouping ****

/// The number of a district key, if the key starts with digits.
///
/// Metadata rows carry non-numeric values in the district column.
pub fn numbered_district(key: &str) -> Option<u32> {
    let digits: String = key
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok()
}

/// Groups the records by state and by numbered district. Records from non-numbered districts
/// are dropped.
pub fn group_districts(records: Vec<CandidateRecord>) -> GroupedRecords {
    let mut grouped: GroupedRecords = BTreeMap::new();
    for r in records {
        let number = match numbered_district(&r.district) {
            Some(n) => n,
            None => {
                debug!(
                    "group_districts: dropping {}-{:?} ({})",
                    r.state, r.district, r.name
                );
                continue;
            }
        };
        grouped
            .entry(r.state.clone())
            .or_default()
            .entry(number)
            .or_default()
            .push(r);
    }
    grouped
}

// **** Candidate resolution ****

/// The major party a party label maps to, if any.
pub fn infer_major_party(label: &str) -> Option<MajorParty> {
    MajorParty::from_label(label)
        .or_else(|| affiliated_party(label))
        .or_else(|| {
            if label.starts_with("D/") {
                Some(MajorParty::D)
            } else if label.starts_with("R/") {
                Some(MajorParty::R)
            } else if label.contains("(D)") {
                Some(MajorParty::D)
            } else if label.contains("(R)") {
                Some(MajorParty::R)
            } else {
                None
            }
        })
}

fn affiliated_party(label: &str) -> Option<MajorParty> {
    PARTY_AFFILIATIONS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, p)| *p)
}

fn is_major_line(label: &str) -> bool {
    MAJOR_PARTIES.contains(&label) || affiliated_party(label).is_some()
}

/// Index of the record with the most votes. The first one wins ties, unresolved counts lose.
fn highest_votes_index<I>(votes: I) -> Option<usize>
where
    I: Iterator<Item = Option<u64>>,
{
    let mut best: Option<(usize, Option<u64>)> = None;
    for (idx, v) in votes.enumerate() {
        match best {
            Some((_, bv)) if v <= bv => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn add_votes(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        // A sum that does not fit is as unusable as an unparseable count.
        (Some(x), Some(y)) => x.checked_add(y),
        _ => None,
    }
}

/// Merges the ballot lines of one person into a single candidate.
///
/// The canonical line is the first major-party (or affiliated) line, otherwise the line with
/// the most votes. The votes of the lines under a different party label are added to it. The
/// labels of all the other lines are kept in `other_parties`.
/// Panics if `lines` is empty.
fn merge_ballot_lines(mut lines: Vec<CandidateRecord>) -> ResolvedCandidate {
    assert!(!lines.is_empty());
    let canonical_idx = if lines.len() == 1 {
        0
    } else {
        lines
            .iter()
            .position(|c| is_major_line(&c.party))
            .or_else(|| highest_votes_index(lines.iter().map(|c| c.votes)))
            .unwrap_or(0)
    };
    let mut canonical = lines.remove(canonical_idx);

    let mut other_parties: Vec<String> = Vec::new();
    for line in lines.iter() {
        // The same person may appear twice under the same label. Do not double count.
        if line.party != canonical.party {
            canonical.votes = add_votes(canonical.votes, line.votes);
        }
        other_parties.push(line.party.clone());
        canonical.won |= line.won;
        canonical.incumbent |= line.incumbent;
    }

    let major_party = infer_major_party(&canonical.party);
    ResolvedCandidate {
        record: canonical,
        major_party,
        other_parties,
    }
}

/// Resolves the candidates of one district: one entry per candidate name, in encounter order.
pub fn resolve_candidates(
    state: &str,
    district: u32,
    records: Vec<CandidateRecord>,
) -> Vec<ResolvedCandidate> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut by_name: Vec<Vec<CandidateRecord>> = Vec::new();
    for r in records {
        match positions.get(&r.name) {
            Some(&idx) => by_name[idx].push(r),
            None => {
                positions.insert(r.name.clone(), by_name.len());
                by_name.push(vec![r]);
            }
        }
    }

    let mut res: Vec<ResolvedCandidate> = Vec::new();
    for lines in by_name {
        if lines.len() > 1 {
            debug!(
                "resolve_candidates: {}-{:02}: merging {} lines for {}",
                state,
                district,
                lines.len(),
                lines[0].name
            );
        }
        res.push(merge_ballot_lines(lines));
    }
    res
}

// **** Winners and state tallies ****

/// The winner of a district.
///
/// If several candidates are flagged as winners, the one with the most votes is kept.
pub fn select_winner<'a>(
    district: &'a District,
    diagnostics: &mut Diagnostics,
) -> Option<&'a ResolvedCandidate> {
    let flagged: Vec<&ResolvedCandidate> =
        district.candidates.iter().filter(|c| c.record.won).collect();
    match flagged.as_slice() {
        [] => {
            diagnostics.warn(Warning::NoWinner {
                state: district.state.clone(),
                district: district.number,
            });
            None
        }
        [winner] => Some(*winner),
        _ => {
            let idx = highest_votes_index(flagged.iter().map(|c| c.record.votes)).unwrap_or(0);
            let winner = flagged[idx];
            diagnostics.warn(Warning::MultipleWinners {
                state: district.state.clone(),
                district: district.number,
                count: flagged.len(),
                kept: winner.record.name.clone(),
            });
            Some(winner)
        }
    }
}

/// The wasted votes of a district, for the efficiency gap.
///
/// Returns None if the winner is not from a major party, or if the vote count of either major
/// party is unknown.
pub fn district_wasted_votes(
    district: &District,
    winner: &ResolvedCandidate,
) -> Option<WastedVotes> {
    let winner_party = winner.major_party?;
    let winner_votes = winner.record.votes?;
    let loser_votes = district
        .candidates
        .iter()
        .filter(|c| c.major_party == Some(winner_party.opponent()))
        .filter_map(|c| c.record.votes)
        .max()?;

    let total_dr = match winner_votes.checked_add(loser_votes) {
        Some(t) if t <= i64::MAX as u64 => t,
        _ => {
            debug!(
                "district_wasted_votes: {}-{:02}: vote counts out of range",
                district.state, district.number
            );
            return None;
        }
    };
    let votes_needed_to_win = total_dr / 2 + 1;
    // Both counts are at most total_dr, which fits in an i64.
    let wasted_winner = winner_votes as i64 - votes_needed_to_win as i64;
    let wasted_loser = loser_votes as i64;
    let (wasted_d, wasted_r) = match winner_party {
        MajorParty::D => (wasted_winner, wasted_loser),
        MajorParty::R => (wasted_loser, wasted_winner),
    };
    Some(WastedVotes {
        wasted_d,
        wasted_r,
        total_dr,
    })
}

/// Resolves every district and collects the winners of each state.
pub fn aggregate_states(grouped: GroupedRecords, diagnostics: &mut Diagnostics) -> Vec<StateTally> {
    let mut res: Vec<StateTally> = Vec::new();
    for (state, districts) in grouped {
        let name = districts
            .values()
            .flat_map(|records| records.iter())
            .map(|r| r.state_name.clone())
            .next()
            .unwrap_or_default();
        let mut tally = StateTally {
            id: state.clone(),
            name,
            num_reps: RepCounts::default(),
            winners: Vec::new(),
            wasted: WastedVotes::default(),
            qualifying_districts: 0,
        };

        for (number, records) in districts {
            let district = District {
                state: state.clone(),
                number,
                candidates: resolve_candidates(&state, number, records),
            };
            let winner = match select_winner(&district, diagnostics) {
                Some(w) => w,
                None => continue,
            };
            if winner.major_party.is_none() {
                diagnostics.warn(Warning::AmbiguousMajorParty {
                    state: state.clone(),
                    district: number,
                    name: winner.record.name.clone(),
                    party: winner.record.party.clone(),
                });
            }

            if let Some(wasted) = district_wasted_votes(&district, winner) {
                debug!(
                    "aggregate_states: {}-{:02}: wasted votes {:?}",
                    state, number, wasted
                );
                tally.wasted += wasted;
                tally.qualifying_districts += 1;
            }

            match winner.major_party {
                Some(MajorParty::D) => tally.num_reps.d += 1,
                Some(MajorParty::R) => tally.num_reps.r += 1,
                None => tally.num_reps.other += 1,
            }
            if winner.record.unopposed {
                tally.num_reps.unopposed += 1;
            }
            tally.winners.push(winner.clone());
        }
        res.push(tally);
    }
    res
}

// **** Validation ****

/// Checks the number of winners of each state against the apportionment of the decade.
///
/// Only emits warnings.
pub fn validate_apportionment(
    tallies: &[StateTally],
    cycle: ElectionCycle,
    apportionments: &ApportionmentTable,
    diagnostics: &mut Diagnostics,
) {
    let decade = cycle.decade();
    let seats = match apportionments.get(&decade) {
        Some(x) => x,
        None => {
            diagnostics.warn(Warning::MissingApportionmentDecade {
                year: cycle.year(),
                decade,
            });
            return;
        }
    };

    for tally in tallies.iter() {
        let actual = tally.num_reps.total();
        match seats.get(&tally.name) {
            None => diagnostics.warn(Warning::MissingApportionmentState {
                state: tally.id.clone(),
                name: tally.name.clone(),
                decade,
            }),
            Some(rec) if rec.seats != actual => {
                diagnostics.warn(Warning::ApportionmentMismatch {
                    state: tally.id.clone(),
                    expected: rec.seats,
                    actual,
                })
            }
            Some(_) => {
                debug!("validate_apportionment: {}: {} seats", tally.id, actual);
            }
        }
    }
}

// **** Fairness metrics ****

fn compare_efficiency_gap_seats(
    a: &StateFairnessMetrics,
    b: &StateFairnessMetrics,
) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let by_value = match (a.efficiency_gap_seats_d, b.efficiency_gap_seats_d) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value.then_with(|| a.tally.id.cmp(&b.tally.id))
}

/// Computes the metrics of every state that has statewide vote data, ranked by increasing
/// efficiency gap seats.
pub fn compute_fairness(
    tallies: Vec<StateTally>,
    vote_shares: &BTreeMap<String, StateVoteShare>,
    diagnostics: &mut Diagnostics,
) -> FairnessResult {
    let mut states: Vec<StateFairnessMetrics> = Vec::new();
    for tally in tallies {
        let (votes, d_pct) = match vote_shares
            .get(&tally.id)
            .and_then(|v| v.d_pct().map(|p| (*v, p)))
        {
            Some(x) => x,
            None => {
                diagnostics.warn(Warning::MissingVoteShare {
                    state: tally.id.clone(),
                });
                continue;
            }
        };

        let total_reps = tally.num_reps.total();
        let popular_vote_seats_d = (d_pct * total_reps as f64).round() as i64;
        let popular_representation_delta = tally.num_reps.d as i64 - popular_vote_seats_d;
        debug!(
            "compute_fairness: {}: D share {:.4}, {} of {} seats expected, delta {}",
            tally.id, d_pct, popular_vote_seats_d, total_reps, popular_representation_delta
        );

        states.push(StateFairnessMetrics {
            efficiency_gap_d: tally.efficiency_gap_d(),
            efficiency_gap_seats_d: tally.efficiency_gap_seats_d(),
            tally,
            votes,
            popular_vote_seats_d,
            popular_representation_delta,
        });
    }

    states.sort_by(compare_efficiency_gap_seats);
    let total_efficiency_gap_seats_d = states
        .iter()
        .filter_map(|s| s.efficiency_gap_seats_d)
        .sum();
    let total_popular_representation_delta = states
        .iter()
        .map(|s| s.popular_representation_delta)
        .sum();

    FairnessResult {
        states,
        total_efficiency_gap_seats_d,
        total_popular_representation_delta,
    }
}
