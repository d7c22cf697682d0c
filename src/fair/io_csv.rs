// Primitives for reading CSV files.

use std::fs::File;

use csv::Reader;

use crate::fair::{
    io_common::{simplify_file_name, ResultsColumns},
    *,
};

/// Opens a CSV file with a header row. Lines starting with '~' are comments.
pub fn csv_reader(path: &Path) -> HouseResult<Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'~'))
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.display().to_string(),
        })
}

/// The header of an opened CSV file, with the surrounding quotes already removed.
pub fn csv_header(rdr: &mut Reader<File>, path: &Path) -> HouseResult<Vec<String>> {
    let header = rdr.headers().context(CsvLineParseSnafu {
        path: path.display().to_string(),
        lineno: 1_usize,
    })?;
    Ok(header.iter().map(|s| s.to_string()).collect())
}

pub fn read_csv_results(path: &Path) -> HouseResult<Vec<RawCandidateRow>> {
    let file_name = simplify_file_name(path);
    let mut rdr = csv_reader(path)?;
    let header = csv_header(&mut rdr, path)?;
    debug!("read_csv_results: {}: header: {:?}", file_name, header);
    let cols = ResultsColumns::from_header(&header, &file_name)?;

    let mut res: Vec<RawCandidateRow> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: file_name.clone(),
            lineno,
        })?;
        let cells: Vec<&str> = line.iter().collect();
        res.push(cols.row(&cells));
    }
    info!("read_csv_results: {}: {} lines", file_name, res.len());
    Ok(res)
}
