use atom_syndication::{Content, Entry, Feed, FixedDateTime, Link, Person};
use chrono::Utc;

use crate::error::AppError;
use crate::models::{ResolvedEntry, SourceEntry};

pub const FEED_TITLE: &str = "Hacker News (hn_feeds)";

/// Parse an RSS or Atom document into source entries.
///
/// An unparseable document or one without entries is a
/// [`AppError::FeedParseError`]. Entries without a link are kept with an
/// empty link; resolution drops them later.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<SourceEntry>, AppError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| AppError::FeedParseError(e.to_string()))?;

    if feed.entries.is_empty() {
        return Err(AppError::FeedParseError("feed has no entries".into()));
    }

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            SourceEntry {
                link,
                title,
                description,
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(entries)
}

/// Wrap resolved entries into an Atom feed identified by `source_url`.
pub fn assemble_feed(source_url: &str, entries: &[ResolvedEntry]) -> Feed {
    let now: FixedDateTime = Utc::now().fixed_offset();

    let mut feed = Feed::default();
    feed.set_id(source_url);
    feed.set_title(FEED_TITLE);
    feed.set_links(vec![link(source_url, "alternate")]);
    feed.set_updated(now);
    feed.set_entries(entries.iter().map(|e| atom_entry(e, now)).collect::<Vec<_>>());
    feed
}

/// Serialize a feed to its XML document.
pub fn to_xml(feed: &Feed) -> Result<String, AppError> {
    let bytes = feed
        .write_to(Vec::new())
        .map_err(|e| AppError::FeedWriteError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::FeedWriteError(e.to_string()))
}

fn atom_entry(resolved: &ResolvedEntry, fallback_updated: FixedDateTime) -> Entry {
    let published = resolved.published_at.map(|p| p.fixed_offset());

    let mut author = Person::default();
    author.set_name(resolved.author_name.clone());

    let mut content = Content::default();
    content.set_content_type(Some("html".to_string()));
    content.set_value(Some(resolved.content.clone()));

    let mut entry = Entry::default();
    entry.set_id(resolved.link.clone());
    entry.set_title(resolved.title.clone());
    entry.set_links(vec![link(&resolved.link, "alternate")]);
    entry.set_updated(published.unwrap_or(fallback_updated));
    entry.set_published(published);
    entry.set_authors(vec![author]);
    entry.set_content(Some(content));
    entry
}

fn link(href: &str, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}
