/// One item as it came out of a parsed feed, before normalization.
///
/// Every field is optional because feeds routinely omit them. `content`
/// holds the full-body blocks in document order (RSS `content:encoded`,
/// Atom `<content>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Vec<String>,
}
