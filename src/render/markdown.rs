//! Markdown rendering for extracted documents.

use crate::error::Result;
use crate::model::{ChartContent, Document, Element, ElementContent, Page, TableContent};

use super::{RenderOptions, TableFallback};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&frontmatter(doc));
        }

        let mut blocks = Vec::new();
        for page in &doc.pages {
            if self.options.page_selection.includes(page.number) {
                self.render_page(&mut blocks, page);
            }
        }
        output.push_str(&blocks.join("\n\n"));

        Ok(output.trim().to_string())
    }

    fn render_page(&self, blocks: &mut Vec<String>, page: &Page) {
        if self.options.page_markers {
            blocks.push(format!("<!-- page {} -->", page.number));
        }
        blocks.extend(page.elements.iter().filter_map(|e| self.render_element(e)));
    }

    fn render_element(&self, element: &Element) -> Option<String> {
        match &element.content {
            ElementContent::Text(c) | ElementContent::Shape(c) => non_blank(&c.text),
            ElementContent::Header(c) | ElementContent::Footer(c) => {
                if self.options.include_headers_footers {
                    non_blank(&c.text)
                } else {
                    None
                }
            }
            ElementContent::Equation(c) => {
                non_blank(&c.text).map(|latex| format!("$$\n{}\n$$", latex))
            }
            ElementContent::Image(image) => {
                let caption = image.text.trim();
                if image.src.is_empty() {
                    non_blank(caption).map(|c| format!("*{}*", c))
                } else {
                    Some(format!(
                        "![{}]({}{})",
                        caption.replace(['[', ']'], ""),
                        self.options.image_path_prefix,
                        image.src
                    ))
                }
            }
            ElementContent::Table(table) => self.render_table(table),
            ElementContent::Chart(chart) => render_chart(chart),
            ElementContent::Other { .. } => element
                .text()
                .and_then(non_blank)
                .or_else(|| element.csv().and_then(|csv| self.render_csv(csv))),
        }
    }

    fn render_table(&self, table: &TableContent) -> Option<String> {
        match self.options.table_fallback {
            TableFallback::Markdown => self
                .render_csv(&table.csv)
                .or_else(|| non_blank(&table.html)),
            TableFallback::Html => {
                non_blank(&table.html).or_else(|| self.render_csv(&table.csv))
            }
            TableFallback::Csv => non_blank(&table.csv).map(|csv| format!("```csv\n{}\n```", csv)),
        }
    }

    fn render_csv(&self, csv: &str) -> Option<String> {
        if csv.trim().is_empty() {
            return None;
        }
        csv_to_markdown(csv).or_else(|| Some(format!("```csv\n{}\n```", csv.trim())))
    }
}

/// Convert CSV text into a Markdown pipe table.
///
/// The first record becomes the header row. Short records are padded.
/// Returns `None` for empty or unreadable CSV.
pub fn csv_to_markdown(csv_text: &str) -> Option<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_text.trim().as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(escape_cell).collect());
    }
    pipe_table(&rows)
}

fn render_chart(chart: &ChartContent) -> Option<String> {
    let table = csv_to_markdown(&chart.csv).or_else(|| pipe_table(&series_rows(chart)));
    let title = non_blank(&chart.title).map(|t| format!("**{}**", t));

    match (title, table) {
        (Some(title), Some(table)) => Some(format!("{}\n\n{}", title, table)),
        (title, table) => title.or(table),
    }
}

/// Header row of category labels, then one row per series.
fn series_rows(chart: &ChartContent) -> Vec<Vec<String>> {
    if chart.series_values.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::with_capacity(chart.series_values.len() + 1);
    let mut header = vec![String::new()];
    header.extend(chart.axis_labels.iter().map(|l| escape_cell(l)));
    rows.push(header);

    for (i, values) in chart.series_values.iter().enumerate() {
        let mut row = vec![chart
            .series_names
            .get(i)
            .map(|n| escape_cell(n))
            .unwrap_or_default()];
        row.extend(
            values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        rows.push(row);
    }
    rows
}

fn pipe_table(rows: &[Vec<String>]) -> Option<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let mut output = String::new();
    for (i, row) in rows.iter().enumerate() {
        output.push('|');
        for col in 0..width {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            output.push_str(&format!(" {} |", cell));
        }
        output.push('\n');

        if i == 0 {
            output.push('|');
            for _ in 0..width {
                output.push_str(" --- |");
            }
            output.push('\n');
        }
    }
    Some(output.trim_end().to_string())
}

fn escape_cell(text: &str) -> String {
    text.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn frontmatter(doc: &Document) -> String {
    format!(
        "---\nname: \"{}\"\npages: {}\n---\n\n",
        escape_yaml(&doc.name),
        doc.total_pages
    )
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageContent, TextContent};
    use crate::render::PageSelection;

    fn doc() -> Document {
        let mut doc = Document::new("report \"Q3\".pdf");
        let mut page1 = Page::new(1, 595.0, 842.0);
        page1.add_element(Element::new(
            "h",
            ElementContent::Header(TextContent::new("ACME Corp")),
        ));
        page1.add_element(Element::new(
            "t1",
            ElementContent::Text(TextContent::new("Quarterly results")),
        ));
        page1.add_element(Element::new(
            "tb1",
            ElementContent::Table(TableContent {
                html: "<table><tr><td>a</td></tr></table>".to_string(),
                csv: "a,b\n1,\"x|y\"".to_string(),
                cells: Vec::new(),
            }),
        ));
        doc.add_page(page1);

        let mut page2 = Page::new(2, 595.0, 842.0);
        page2.add_element(Element::new(
            "img",
            ElementContent::Image(ImageContent {
                text: "Logo".to_string(),
                src: "img/1.png".to_string(),
            }),
        ));
        page2.add_element(Element::new(
            "eq",
            ElementContent::Equation(TextContent::new("E = mc^2")),
        ));
        doc.add_page(page2);
        doc
    }

    #[test]
    fn test_csv_to_markdown() {
        let md = csv_to_markdown("a,b\n1,2").unwrap();
        assert_eq!(md, "| a | b |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_csv_to_markdown_pads_short_rows() {
        let md = csv_to_markdown("a,b,c\n1").unwrap();
        assert_eq!(md, "| a | b | c |\n| --- | --- | --- |\n| 1 |  |  |");
    }

    #[test]
    fn test_csv_to_markdown_empty() {
        assert!(csv_to_markdown("").is_none());
        assert!(csv_to_markdown("   \n").is_none());
    }

    #[test]
    fn test_to_markdown_default() {
        let md = to_markdown(&doc(), &RenderOptions::default()).unwrap();
        assert!(!md.contains("ACME Corp"));
        assert!(md.starts_with("Quarterly results"));
        assert!(md.contains("| 1 | x\\|y |"));
        assert!(md.contains("![Logo](img/1.png)"));
        assert!(md.contains("$$\nE = mc^2\n$$"));
    }

    #[test]
    fn test_to_markdown_options() {
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_headers_footers(true)
            .with_table_fallback(TableFallback::Html)
            .with_image_prefix("assets/")
            .with_pages(PageSelection::All);
        let md = to_markdown(&doc(), &options).unwrap();

        assert!(md.starts_with("---\nname: \"report \\\"Q3\\\".pdf\"\npages: 2\n---"));
        assert!(md.contains("ACME Corp"));
        assert!(md.contains("<table><tr><td>a</td></tr></table>"));
        assert!(md.contains("![Logo](assets/img/1.png)"));
    }

    #[test]
    fn test_to_markdown_page_selection() {
        let options = RenderOptions::new().with_pages(PageSelection::Pages(vec![2]));
        let md = to_markdown(&doc(), &options).unwrap();
        assert!(!md.contains("Quarterly results"));
        assert!(md.contains("Logo"));
    }

    #[test]
    fn test_csv_fallback_block() {
        let options = RenderOptions::new().with_table_fallback(TableFallback::Csv);
        let md = to_markdown(&doc(), &options).unwrap();
        assert!(md.contains("```csv\na,b\n1,\"x|y\"\n```"));
    }

    #[test]
    fn test_chart_from_series() {
        let chart = ChartContent {
            title: "Sales".to_string(),
            axis_labels: vec!["Q1".to_string(), "Q2".to_string()],
            series_names: vec!["2024".to_string()],
            series_values: vec![vec![Some(1.5), None]],
            ..ChartContent::default()
        };
        let md = render_chart(&chart).unwrap();
        assert_eq!(
            md,
            "**Sales**\n\n|  | Q1 | Q2 |\n| --- | --- | --- |\n| 2024 | 1.5 |  |"
        );
    }
}
