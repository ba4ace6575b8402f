/*!

# Quick start with Google Forms

This example goes through the analysis of a Google Forms survey, end to end.

**Getting the form structure** The structure of the form (the questions, their type and
their options) is returned by the Forms API. Using the
[API explorer](https://developers.google.com/forms/api/reference/rest/v1/forms/get) or `curl`
with an access token, save the form to a file:

```bash
curl -H "Authorization: Bearer $TOKEN" \
  https://forms.googleapis.com/v1/forms/$FORM_ID > form.json
```

**Getting the responses** The responses can be saved the same way:

```bash
curl -H "Authorization: Bearer $TOKEN" \
  "https://forms.googleapis.com/v1/forms/$FORM_ID/responses?pageSize=500" > responses.json
```

Alternatively, in the `Responses` tab of the form, use the `Link to Sheets` option and
download the spreadsheet in the CSV or the Excel format.

**Running the analysis**

```bash
formtally --form form.json -i responses.json
```

or, with the spreadsheet:

```bash
formtally --form form.json -i responses.csv --input-type csv --multi-value-delimiter ','
```

The summary is printed in the JSON format:

```text
{
  "meta": {
    "analyzedResponses": 3,
    "formId": "1FAIpQLSd",
    "title": "Lunch poll"
  },
  "summaries": [
    {
      "options": [
        { "count": 2, "label": "Pizza", "rate": 66.67 },
        { "count": 1, "label": "Pasta", "rate": 33.33 }
      ],
      "questionId": "4f2a1c9e",
      "questionTitle": "Pizza or pasta?",
      "text": null,
      "type": "CHOICE"
    }
  ]
}
```

Use `--out summary.json` to write it to a file instead. `--form-detail` prints the
canonical questions of the form without reading any response, which is useful to
check how a form is understood. `--responses` prints one page of the responses
themselves (50 by default); pass the `nextPageToken` it returns to `--page-token` to
get the next page.

If you want to make sure that the results do not change, keep a summary as a
reference and pass it with `--reference`: the differences are printed and the
program fails if the outcome is different.

See the [manual](../manual/index.html) for all the options.
*/
