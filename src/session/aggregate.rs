//! Playlist aggregation.

use std::collections::HashSet;

use crate::models::ChannelLink;

/// An ordered, URL-deduplicated channel list.
///
/// Insertion order is first-seen order across all seeds. When two entries
/// share a URL the first one wins, keeping its name even if a later
/// occurrence used a different one.
#[derive(Debug, Default)]
pub struct AggregatedPlaylist {
    links: Vec<ChannelLink>,
    seen_urls: HashSet<String>,
}

impl AggregatedPlaylist {
    /// An empty playlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one link; duplicates by URL are dropped.
    pub fn push(&mut self, link: ChannelLink) {
        if self.seen_urls.insert(link.url.clone()) {
            self.links.push(link);
        }
    }

    /// Adds links in order.
    pub fn extend<I: IntoIterator<Item = ChannelLink>>(&mut self, links: I) {
        for link in links {
            self.push(link);
        }
    }

    /// Number of unique links collected so far.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no links have been collected.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Consumes the playlist, yielding links in first-seen order.
    pub fn into_links(self) -> Vec<ChannelLink> {
        self.links
    }
}
