use std::collections::HashSet;
use std::path::Path;

use super::{extension_of, ContentHandle, ContentLayout, ExtensionSet, PreviewContent, Renderer, Table};

const TABLE_EXTENSIONS: ExtensionSet = ExtensionSet::new(&["csv", "tsv"]);

/// Delimited tables; the first record is the header row.
pub struct CsvRenderer {
    max_rows: usize,
}

impl CsvRenderer {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }
}

impl Renderer for CsvRenderer {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn can_handle(&self, path: &Path) -> bool {
        TABLE_EXTENSIONS.matches(path)
    }

    fn render(&self, path: &Path) -> ContentHandle {
        let path = path.to_path_buf();
        let max_rows = self.max_rows;
        ContentHandle::loading("Parsing table", move || {
            match read_table(&path, max_rows) {
                Ok(table) => PreviewContent::Table(table),
                Err(err) => {
                    tracing::debug!(?err, path = %path.display(), "table parse failed");
                    PreviewContent::error("Error parsing CSV")
                }
            }
        })
        .with_layout(ContentLayout::Wide)
    }
}

fn read_table(path: &Path, max_rows: usize) -> csv::Result<Table> {
    let delimiter = if extension_of(path).as_deref() == Some("tsv") {
        b'\t'
    } else {
        b','
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = unique_headers(reader.headers()?.iter());
    let mut rows = Vec::new();
    let mut truncated = false;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        let mut row: Vec<String> = record.iter().take(headers.len()).map(String::from).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(Table {
        headers,
        rows,
        truncated,
    })
}

/// Repeated column names get a numeric suffix so every column is addressable.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.map(|header| {
        let mut candidate = header.to_string();
        let mut suffix = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{header}{suffix}");
            suffix += 1;
        }
        candidate
    })
    .collect()
}
