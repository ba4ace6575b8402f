use clap::Parser;

/// This is a tabulation program for online survey forms.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the analysis (sources of the form and
    /// of the responses, rules). The other flags override what it contains.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the outcome of an analysis in JSON format. If provided, formtally will
    /// check that the output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The structure of the form, as returned by the Forms API.
    #[clap(short, long, value_parser)]
    pub form: Option<String>,

    /// (file path) The file containing the responses. Setting this option overrides what may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default forms_json) The type of the input. Either forms_json, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// The id of the form. By default, the id found in the form structure.
    #[clap(long, value_parser)]
    pub form_id: Option<String>,

    /// (default 200, or 50 with --responses) The maximum number of responses to analyze or to
    /// list, between 1 and 500.
    #[clap(long, value_parser)]
    pub limit: Option<i64>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// When using a spreadsheet, the delimiter between the values of checkbox cells.
    #[clap(long, value_parser)]
    pub multi_value_delimiter: Option<String>,

    /// If passed as an argument, prints the canonical questions of the form instead of the analysis.
    #[clap(long, takes_value = false)]
    pub form_detail: bool,

    /// If passed as an argument, prints one page of the responses instead of the analysis.
    #[clap(long, takes_value = false, conflicts_with = "form-detail")]
    pub responses: bool,

    /// With --responses, the page to print: the nextPageToken of the previous page.
    #[clap(long, value_parser, requires = "responses")]
    pub page_token: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn flags() {
        Args::command().debug_assert();

        let args = Args::parse_from([
            "formtally",
            "--form",
            "form.json",
            "--responses",
            "--page-token",
            "50",
        ]);
        assert!(args.responses);
        assert_eq!(args.page_token, Some("50".to_string()));
        assert!(Args::try_parse_from(["formtally", "--page-token", "50"]).is_err());
        assert!(Args::try_parse_from(["formtally", "--responses", "--form-detail"]).is_err());
    }

    #[test]
    fn verbose_logs_to_stderr() {
        let command = Args::command();
        let verbose = command
            .get_arguments()
            .find(|a| a.get_id() == "verbose")
            .unwrap();
        let help = verbose.get_help().unwrap();
        assert!(help.contains("standard error"));
        assert!(!help.contains("standard output"));
    }
}
