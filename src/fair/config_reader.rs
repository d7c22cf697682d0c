use crate::fair::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The census decades for which an apportionment file is looked up by default.
pub const APPORTIONMENT_DECADES: [u32; 3] = [1990, 2000, 2010];

const DEFAULT_INPUT_DIR: &str = "./input";
const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Optional JSON configuration. All the paths are relative to the input directory.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct HouseConfig {
    #[serde(rename = "inputDirectory")]
    pub input_directory: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "resultsProvider")]
    pub results_provider: Option<String>,
    #[serde(rename = "resultsFile")]
    pub results_file: Option<String>,
    #[serde(rename = "votesFile")]
    pub votes_file: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// decade -> file
    #[serde(rename = "apportionmentFiles")]
    pub apportionment_files: Option<BTreeMap<String, String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ResultsProvider {
    Csv,
    Xlsx,
}

impl ResultsProvider {
    fn extension(&self) -> &'static str {
        match self {
            ResultsProvider::Csv => "csv",
            ResultsProvider::Xlsx => "xlsx",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// The resolved locations of all the inputs and of the output.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputPaths {
    pub results: PathBuf,
    pub provider: ResultsProvider,
    pub excel_worksheet_name: Option<String>,
    pub votes: PathBuf,
    pub apportionments: BTreeMap<u32, PathBuf>,
    pub output: OutputTarget,
}

pub fn read_config(path: &str) -> HouseResult<HouseConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: HouseConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> HouseResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn parse_provider(s: &str) -> HouseResult<ResultsProvider> {
    match s {
        "csv" => Ok(ResultsProvider::Csv),
        "xlsx" | "excel" => Ok(ResultsProvider::Xlsx),
        x => whatever!("Input type {:?} not implemented (expected csv or xlsx)", x),
    }
}

/// Combines the command line, the configuration file and the default file layout.
///
/// `config_dir` is the directory of the configuration file: a relative input or output
/// directory given in the configuration is relative to it.
pub fn resolve_paths(
    args: &Args,
    config: &HouseConfig,
    config_dir: Option<&Path>,
    cycle: ElectionCycle,
) -> HouseResult<InputPaths> {
    let from_config = |d: &Option<String>| -> Option<PathBuf> {
        d.as_ref().map(|p| match config_dir {
            Some(root) => root.join(p),
            None => PathBuf::from(p),
        })
    };
    let input_dir: PathBuf = args
        .input_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config(&config.input_directory))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let output_dir: PathBuf = args
        .output_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config(&config.output_directory))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let provider = match args
        .input_type
        .as_deref()
        .or(config.results_provider.as_deref())
    {
        Some(s) => parse_provider(s)?,
        None => ResultsProvider::Csv,
    };

    let year = cycle.year();
    let results = input_dir.join(config.results_file.clone().unwrap_or_else(|| {
        format!("houseResults{}.{}", year, provider.extension())
    }));
    let votes = input_dir.join(
        config
            .votes_file
            .clone()
            .unwrap_or_else(|| format!("houseVotes{}.csv", year)),
    );

    let mut apportionments: BTreeMap<u32, PathBuf> = BTreeMap::new();
    match &config.apportionment_files {
        Some(files) => {
            for (decade, file) in files.iter() {
                let d = match decade.parse::<u32>() {
                    Ok(d) if d % 10 == 0 => d,
                    _ => whatever!("Invalid decade {:?} in apportionmentFiles", decade),
                };
                apportionments.insert(d, input_dir.join(file));
            }
        }
        None => {
            for d in APPORTIONMENT_DECADES {
                apportionments.insert(d, input_dir.join(format!("apportionment{}.csv", d)));
            }
        }
    }

    let output = match args.out.as_deref() {
        Some("stdout") => OutputTarget::Stdout,
        Some(p) if !p.is_empty() => OutputTarget::File(PathBuf::from(p)),
        _ => OutputTarget::File(output_dir.join(format!("states-{}.json", year))),
    };

    Ok(InputPaths {
        results,
        provider,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.excel_worksheet_name.clone()),
        votes,
        apportionments,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            year: "2014".to_string(),
            config: None,
            input_dir: None,
            output_dir: None,
            out: None,
            input_type: None,
            excel_worksheet_name: None,
            reference: None,
            verbose: false,
        }
    }

    fn cycle() -> ElectionCycle {
        ElectionCycle::new(2014).unwrap()
    }

    #[test]
    fn default_layout() {
        let paths = resolve_paths(&bare_args(), &HouseConfig::default(), None, cycle()).unwrap();
        assert_eq!(paths.results, Path::new("./input/houseResults2014.csv"));
        assert_eq!(paths.votes, Path::new("./input/houseVotes2014.csv"));
        assert_eq!(paths.provider, ResultsProvider::Csv);
        assert_eq!(
            paths.apportionments.keys().cloned().collect::<Vec<u32>>(),
            vec![1990, 2000, 2010]
        );
        assert_eq!(
            paths.output,
            OutputTarget::File(PathBuf::from("./output/states-2014.json"))
        );
    }

    #[test]
    fn command_line_overrides_config() {
        let config: HouseConfig = serde_json::from_str(
            r#"{
                "inputDirectory": "data",
                "resultsProvider": "xlsx",
                "excelWorksheetName": "2014 US House Results by State",
                "apportionmentFiles": {"2010": "app2010.csv"}
            }"#,
        )
        .unwrap();
        let mut args = bare_args();
        args.out = Some("stdout".to_string());
        let paths = resolve_paths(&args, &config, Some(Path::new("/etc/house")), cycle()).unwrap();
        assert_eq!(paths.results, Path::new("/etc/house/data/houseResults2014.xlsx"));
        assert_eq!(paths.provider, ResultsProvider::Xlsx);
        assert_eq!(
            paths.excel_worksheet_name.as_deref(),
            Some("2014 US House Results by State")
        );
        assert_eq!(
            paths.apportionments.get(&2010),
            Some(&PathBuf::from("/etc/house/data/app2010.csv"))
        );
        assert_eq!(paths.apportionments.len(), 1);
        assert_eq!(paths.output, OutputTarget::Stdout);

        args.input_dir = Some("elsewhere".to_string());
        args.input_type = Some("csv".to_string());
        let paths = resolve_paths(&args, &config, None, cycle()).unwrap();
        assert_eq!(paths.results, Path::new("elsewhere/houseResults2014.csv"));
    }

    #[test]
    fn unknown_provider() {
        let mut args = bare_args();
        args.input_type = Some("dominion".to_string());
        assert!(resolve_paths(&args, &HouseConfig::default(), None, cycle()).is_err());
    }
}
