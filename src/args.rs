use clap::Parser;

/// Computes partisan fairness metrics for each state from the U.S. House general election results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (year) The election cycle to process. Only 2010, 2012 and 2014 are currently supported.
    #[clap(short, long, value_parser)]
    pub year: String,

    /// (file path, optional) A JSON file describing the location of the input files.
    /// The options given on the command line take precedence over this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default ./input) The directory containing the results, statewide votes and
    /// apportionment files.
    #[clap(short, long, value_parser)]
    pub input_dir: Option<String>,

    /// (directory, default ./output) The directory in which states-YEAR.json is written.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location instead of the output directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default csv) The type of the results file: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, housefair will check that
    /// the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
