/*!

This is the long-form manual for `survey_analysis` and `formtally`.

## Question kinds

Every question of a form is reduced to one of the following kinds. The name in
parentheses is the one used in the JSON output.

* `SingleChoice` (`CHOICE`): multiple choice, dropdown and checkbox questions, as well
  as the rows of a multiple choice grid. Checkbox questions outside of a grid are also
  reported under this kind, although their answers may hold several values.
* `MultiChoice` (`CHOICE_MULTI`): the rows of a checkbox grid.
* `Scale` (`SCALE`): linear scales. One option is generated for each score between the
  low and the high value, and the end points carry their labels: `1 (Bad)`, `2`, ..., `5 (Good)`.
  A scale wider than 100 scores is reduced to its low value, with a warning.
* `Text` (`TEXT`): short answers, paragraphs, dates and times.
* `Unknown` (`UNKNOWN`): everything else (file uploads for instance).

## Grids

A grid is turned into one question per row. The title of the question is
`{grid title} - {row title}` and all the rows share the column labels as options.
Each row has its own question id in the forms provider, and answers are matched on
this id.

## Statistics

For each question, the number of respondents who gave at least one non-blank answer
is the *answered count*. It is the denominator of all the rates of this question,
which are percentages rounded to 2 decimal places.

* Choice questions report only the values that were actually given, the most
  frequent first. The order between values with the same count is not specified.
* Scale questions report every score, in ascending order, including the ones that
  nobody picked. Answers are matched to scores using their leading number, so that
  `5`, `5 (Good)` and ` 5 points` all count for the score `5`. Answers that do not
  start with a digit are not counted.
* Text and unknown questions report the number of answers and the first 20 answers,
  in the order of the responses.

The metadata of the result contains the total number of responses that were
analyzed, regardless of which questions they answered.

## Input formats

The form structure is always read from the JSON returned by the Forms API
(`forms.get`). The responses can be provided in the following formats:

* `forms_json` the JSON returned by the Forms API (`forms.responses.list`). This is the default.
* `csv` a CSV export of the linked responses spreadsheet.
* `xlsx` an Excel export of the linked responses spreadsheet.

### `csv` and `xlsx`

The first row is expected to contain the titles of the questions, as written by the
spreadsheet export. Columns are matched to questions by title. The columns of grids
are written `Grid title [Row title]` by the export, and both this form and the
canonical `Grid title - Row title` are understood. Columns that do not match a
question (`Timestamp`, `Email Address`) are ignored.

Checkbox questions and checkbox grids store all the selected options in the same
cell. Use the `multiValueDelimiter` option (usually `,`) to split them. Only the rows
of checkbox grids and the questions that the form declares as checkboxes are split.

Excel date cells are written `2024-05-01`, or `2024-05-01 10:30:00` when they hold a
time of day.

## Listing the responses

`--responses` prints one page of the responses instead of the analysis, in the shape
of the Forms API: `formId`, `nextPageToken` and for each response its `responseId`,
`createTime`, `lastSubmittedTime` and `answers` (`values` and `files` per question id).
The page holds 50 responses unless `--limit` says otherwise. Pass the
`nextPageToken` to `--page-token` to get the next page. Without a form structure,
the answers of spreadsheet exports are keyed by the titles of the columns.

## Configuration

Instead of passing all the options on the command line, they can be written in a
JSON configuration file passed with `--config`. Paths are relative to the
configuration file.

```json
{
  "outputSettings": {
    "outputPath": "summary.json"
  },
  "formSource": {
    "provider": "forms_json",
    "filePath": "form.json",
    "formId": "1FAIpQLSd"
  },
  "responseSource": {
    "provider": "csv",
    "filePath": "responses.csv",
    "multiValueDelimiter": ","
  },
  "rules": {
    "limit": 200,
    "textSampleSize": 20
  }
}
```

`limit` is the maximum number of responses to analyze. It is clamped between 1 and
500, and only the first page of responses is read.
*/
