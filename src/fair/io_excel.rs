// Reading the results from the Excel workbook published by the FEC.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::fair::{
    io_common::{simplify_file_name, ResultsColumns},
    *,
};

fn get_range(path: &Path, worksheet_name_o: Option<&str>) -> HouseResult<Range<DataType>> {
    let path_s = path.display().to_string();
    debug!(
        "read_excel_results: path: {:?} worksheet: {:?}",
        &path_s, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;

    match worksheet_name_o {
        // A worksheet name was provided, use it.
        Some(worksheet_name) => workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                path: path_s.clone(),
            })?
            .context(OpeningExcelSnafu { path: path_s }),
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {
                path: path_s.clone(),
            })?
            .context(OpeningExcelSnafu { path: path_s }),
    }
}

/// The textual form of a cell, as it would appear in the CSV export.
///
/// Whole numbers lose their decimal part. The percentages are stored as fractions in the
/// workbook and come back with a '%' sign.
fn cell_to_string(cell: &DataType, is_percent: bool) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if is_percent => format!("{}%", f * 100.0),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => String::new(),
        x => {
            debug!("cell_to_string: unexpected cell {:?}", x);
            String::new()
        }
    }
}

pub fn read_excel_results(
    path: &Path,
    worksheet_name_o: Option<&str>,
) -> HouseResult<Vec<RawCandidateRow>> {
    let file_name = simplify_file_name(path);
    let wrange = get_range(path, worksheet_name_o)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu {
            path: file_name.clone(),
        })?
        .iter()
        .map(|c| cell_to_string(c, false).trim_start().to_string())
        .collect();
    debug!("read_excel_results: header: {:?}", header);
    let cols = ResultsColumns::from_header(&header, &file_name)?;

    let res: Vec<RawCandidateRow> = iter
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(idx, c)| cell_to_string(c, Some(idx) == cols.general_percent))
                .collect();
            cols.row(&cells)
        })
        .collect();
    info!("read_excel_results: {}: {} lines", file_name, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::Float(123349.0), false), "123349");
        assert_eq!(cell_to_string(&DataType::Float(0.5), true), "50%");
        assert_eq!(cell_to_string(&DataType::Float(2.5), false), "2.5");
        assert_eq!(cell_to_string(&DataType::Int(7), false), "7");
        assert_eq!(
            cell_to_string(&DataType::String("Unopposed".to_string()), false),
            "Unopposed"
        );
        assert_eq!(cell_to_string(&DataType::Empty, false), "");
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_results(Path::new("does/not/exist.xlsx"), None);
        assert!(matches!(res, Err(HouseError::OpeningExcel { .. })));
    }
}
