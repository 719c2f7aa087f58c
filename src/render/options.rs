//! Rendering options and configuration.

use std::ops::RangeInclusive;
use std::str::FromStr;

/// Options for rendering document content.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Prefix for image paths in output (e.g., "./images/")
    pub image_path_prefix: String,

    /// How to render tables
    pub table_fallback: TableFallback,

    /// Include YAML frontmatter with the document name and page count
    pub include_frontmatter: bool,

    /// Include running headers and footers
    pub include_headers_footers: bool,

    /// Emit an HTML comment before each page
    pub page_markers: bool,

    /// Page selection
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Set the table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.table_fallback = fallback;
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable running headers and footers.
    pub fn with_headers_footers(mut self, include: bool) -> Self {
        self.include_headers_footers = include;
        self
    }

    /// Enable or disable page markers.
    pub fn with_page_markers(mut self, markers: bool) -> Self {
        self.page_markers = markers;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: Vec<u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }
}

/// How to render tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFallback {
    /// Markdown pipe table built from the CSV rendering
    #[default]
    Markdown,
    /// The HTML rendering as sent by the service
    Html,
    /// The CSV rendering in a fenced code block
    Csv,
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    ///
    /// Page numbers are 1-based. A single range stays a [`PageSelection::Range`];
    /// anything with a comma becomes a sorted, deduplicated page list.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some(range) = parse_part(s)? {
                return Ok(PageSelection::Range(range));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match parse_part(part)? {
                Some(range) => pages.extend(range),
                None => pages.push(parse_page(part)?),
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `a-b`; `None` if the part is a single page.
fn parse_part(part: &str) -> Result<Option<RangeInclusive<u32>>, String> {
    let Some((start, end)) = part.split_once('-') else {
        return Ok(None);
    };
    let (start, end) = (parse_page(start)?, parse_page(end)?);
    if start > end {
        return Err(format!("descending page range '{}'", part.trim()));
    }
    Ok(Some(start..=end))
}

fn parse_page(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err("page numbers start at 1".to_string()),
        Ok(page) => Ok(page),
        Err(_) => Err(format!("invalid page number '{}'", s.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_headers_footers(true)
            .with_page_range(2..=4)
            .with_table_fallback(TableFallback::Html);

        assert!(options.include_frontmatter);
        assert!(options.include_headers_footers);
        assert!(!options.page_markers);
        assert_eq!(options.table_fallback, TableFallback::Html);
        assert!(options.page_selection.includes(3));
        assert!(!options.page_selection.includes(5));
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
        assert!(pages.includes(3));
    }

    #[test]
    fn test_page_selection_parse() {
        let all = PageSelection::parse("all").unwrap();
        assert!(matches!(all, PageSelection::All));

        let range = PageSelection::parse("1-10").unwrap();
        assert!(matches!(range, PageSelection::Range(_)));

        let mixed = PageSelection::parse("1,3,5-7,10").unwrap();
        if let PageSelection::Pages(pages) = mixed {
            assert_eq!(pages, vec![1, 3, 5, 6, 7, 10]);
        } else {
            panic!("Expected Pages variant");
        }

        let dup = PageSelection::parse("3, 1-2, 2").unwrap();
        assert!(matches!(dup, PageSelection::Pages(ref p) if p == &[1, 2, 3]));

        assert!(PageSelection::parse("x-2").is_err());
        assert!(PageSelection::parse("5-2").is_err());
        assert!(PageSelection::parse("0").is_err());
    }

    #[test]
    fn test_page_selection_from_str() {
        let selection: PageSelection = "2-4".parse().unwrap();
        assert!(selection.includes(2));
        assert!(!selection.includes(5));
    }
}
