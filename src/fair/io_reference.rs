// The reference datasets: apportionment tables and statewide House votes.

use std::collections::BTreeMap;

use crate::fair::{
    io_common::{column_index, parse_count, simplify_file_name},
    io_csv::{csv_header, csv_reader},
    *,
};

/// Reads the statewide House votes, keyed by state abbreviation.
///
/// The rows that are not one of the 50 states (totals, territories) are dropped.
/// Counts that cannot be read are taken as zero.
pub fn read_house_votes(path: &Path) -> HouseResult<BTreeMap<String, StateVoteShare>> {
    let file_name = simplify_file_name(path);
    let mut rdr = csv_reader(path)?;
    let header = csv_header(&mut rdr, path)?;
    let state_idx = column_index(&header, "State", &file_name)?;
    let d_idx = column_index(&header, "General_Democratic", &file_name)?;
    let r_idx = column_index(&header, "General_Republican", &file_name)?;
    let other_idx = column_index(&header, "General_Other", &file_name)?;

    let mut res: BTreeMap<String, StateVoteShare> = BTreeMap::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let line = line_r.context(CsvLineParseSnafu {
            path: file_name.clone(),
            lineno: idx + 2,
        })?;
        let state = line.get(state_idx).unwrap_or("").trim();
        if !VALID_STATES.contains(&state) {
            debug!("read_house_votes: skipping {:?}", state);
            continue;
        }
        let count = |i: usize| line.get(i).map(parse_count).unwrap_or(0);
        res.insert(
            state.to_string(),
            StateVoteShare {
                d: count(d_idx),
                r: count(r_idx),
                other: count(other_idx),
            },
        );
    }
    info!("read_house_votes: {}: {} states", file_name, res.len());
    Ok(res)
}

/// Reads one apportionment table, keyed by the full name of the state.
pub fn read_apportionment(path: &Path) -> HouseResult<BTreeMap<String, ApportionmentRecord>> {
    let file_name = simplify_file_name(path);
    let mut rdr = csv_reader(path)?;
    let header = csv_header(&mut rdr, path)?;
    let state_idx = column_index(&header, "state", &file_name)?;
    let population_idx = column_index(&header, "population", &file_name)?;
    let seats_idx = column_index(&header, "house_seats", &file_name)?;

    let mut res: BTreeMap<String, ApportionmentRecord> = BTreeMap::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: file_name.clone(),
            lineno,
        })?;
        let state = line.get(state_idx).unwrap_or("").trim();
        let population = line
            .get(population_idx)
            .and_then(|s| s.replace(',', "").trim().parse::<u64>().ok());
        let seats = line
            .get(seats_idx)
            .and_then(|s| s.trim().parse::<u32>().ok());
        match (state, population, seats) {
            ("", _, _) => {
                debug!("read_apportionment: {}:{}: no state", file_name, lineno);
            }
            (_, Some(population), Some(seats)) => {
                res.insert(state.to_string(), ApportionmentRecord { population, seats });
            }
            _ => {
                warn!(
                    "read_apportionment: {}:{}: cannot read the record for {}, skipping",
                    file_name, lineno, state
                );
            }
        }
    }
    Ok(res)
}

/// Reads the apportionment tables of all the decades.
///
/// A decade whose file does not exist is skipped: the states of the cycles in that decade
/// will not be validated.
pub fn read_apportionments(files: &BTreeMap<u32, PathBuf>) -> HouseResult<ApportionmentTable> {
    let mut res: ApportionmentTable = BTreeMap::new();
    for (decade, path) in files.iter() {
        if !path.exists() {
            warn!(
                "No apportionment file {} for the decade {}",
                path.display(),
                decade
            );
            continue;
        }
        let table = read_apportionment(path)?;
        debug!("read_apportionments: {}: {} states", decade, table.len());
        res.insert(*decade, table);
    }
    Ok(res)
}
