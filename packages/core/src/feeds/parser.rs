//! RSS / Atom body parsing.
//!
//! The body is tried as RSS first, then as Atom. Anything that is neither
//! is a [`FetchError::Parse`] and the whole source is skipped for the cycle,
//! even if some items could have been salvaged.

use super::{FetchError, RawEntry};

/// Parse a feed document into raw entries, in document order.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawEntry>, FetchError> {
    let rss_err = match rss::Channel::read_from(body) {
        Ok(channel) => return Ok(rss_entries(&channel)),
        Err(err) => err,
    };

    match atom_syndication::Feed::read_from(body) {
        Ok(feed) => Ok(atom_entries(&feed)),
        Err(atom_err) => Err(FetchError::parse(format!(
            "not RSS ({}) and not Atom ({})",
            rss_err, atom_err
        ))),
    }
}

fn rss_entries(channel: &rss::Channel) -> Vec<RawEntry> {
    channel
        .items()
        .iter()
        .map(|item| RawEntry {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            published: item.pub_date().map(str::to_string),
            // RSS has no separate summary element; <description> plays that role.
            summary: None,
            description: item.description().map(str::to_string),
            content: item.content().map(|c| vec![c.to_string()]).unwrap_or_default(),
        })
        .collect()
}

fn atom_entries(feed: &atom_syndication::Feed) -> Vec<RawEntry> {
    feed.entries()
        .iter()
        .map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string());

            let published = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .to_rfc3339();

            RawEntry {
                title: Some(entry.title().as_str().to_string()),
                link,
                published: Some(published),
                summary: entry.summary().map(|s| s.as_str().to_string()),
                description: None,
                content: entry
                    .content()
                    .and_then(|c| c.value())
                    .map(|v| vec![v.to_string()])
                    .unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Wire</title>
    <link>https://wire.example.com</link>
    <description>Top stories</description>
    <item>
      <title>Markets rally on rate hopes</title>
      <link>https://wire.example.com/a</link>
      <pubDate>Mon, 02 Jan 2023 10:00:00 GMT</pubDate>
      <description>Stocks climbed sharply.</description>
    </item>
    <item>
      <title>Full text only</title>
      <link>https://wire.example.com/b</link>
      <content:encoded><![CDATA[<p>Body text</p>]]></content:encoded>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Wire</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2023-01-02T10:00:00Z</updated>
  <entry>
    <title>Atom headline</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <link rel="related" href="https://atom.example.com/related"/>
    <link rel="alternate" href="https://atom.example.com/story"/>
    <updated>2023-01-03T08:30:00Z</updated>
    <published>2023-01-02T09:15:00Z</published>
    <summary>Short atom summary</summary>
    <content type="html">Long atom body</content>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("Markets rally on rate hopes"));
        assert_eq!(first.link.as_deref(), Some("https://wire.example.com/a"));
        assert_eq!(first.published.as_deref(), Some("Mon, 02 Jan 2023 10:00:00 GMT"));
        assert_eq!(first.description.as_deref(), Some("Stocks climbed sharply."));
        assert!(first.summary.is_none());
        assert!(first.content.is_empty());

        let second = &entries[1];
        assert!(second.published.is_none());
        assert_eq!(second.content, vec!["<p>Body text</p>".to_string()]);
    }

    #[test]
    fn parses_atom_entries_and_prefers_alternate_link() {
        let entries = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title.as_deref(), Some("Atom headline"));
        assert_eq!(entry.link.as_deref(), Some("https://atom.example.com/story"));
        assert_eq!(entry.published.as_deref(), Some("2023-01-02T09:15:00+00:00"));
        assert_eq!(entry.summary.as_deref(), Some("Short atom summary"));
        assert_eq!(entry.content, vec!["Long atom body".to_string()]);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_feed(b"<html><body>502 Bad Gateway</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[test]
    fn empty_body_is_a_parse_error() {
        assert!(parse_feed(b"").is_err());
    }
}
