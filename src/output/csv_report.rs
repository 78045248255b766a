//! CSV page report
//!
//! One row per extracted page with the columns
//! `page_url,h1,first_paragraph,outgoing_link_urls,image_urls`.
//! List columns are joined with `;`. Quoting of fields that contain the
//! delimiter, a quote or a newline is left to the csv writer.

use crate::crawler::PageRecord;
use crate::output::OutputResult;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Column headers of the page report
pub const REPORT_HEADERS: [&str; 5] = [
    "page_url",
    "h1",
    "first_paragraph",
    "outgoing_link_urls",
    "image_urls",
];

/// Writes the page report to `output_path`
///
/// Rows are ordered by normalized URL so repeated runs over the same site
/// produce comparable files.
pub fn write_csv_report(
    pages: &HashMap<String, PageRecord>,
    output_path: &Path,
) -> OutputResult<()> {
    let file = std::fs::File::create(output_path)?;
    write_csv(pages, file)
}

/// Writes the page report to any writer
pub fn write_csv<W: Write>(pages: &HashMap<String, PageRecord>, out: W) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(REPORT_HEADERS)?;

    let mut keys: Vec<&String> = pages.keys().collect();
    keys.sort();

    for key in keys {
        let page = &pages[key];
        writer.write_record([
            page.url.as_str(),
            page.title.as_str(),
            page.first_paragraph.as_str(),
            page.outgoing_links.join(";").as_str(),
            page.image_urls.join(";").as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
