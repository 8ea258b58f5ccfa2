//! Icon asset bookkeeping for marker images.
//!
//! Loading itself happens outside this crate. The cache hands out fetch
//! tickets, deduplicates requests per icon key and remembers failures so a
//! broken icon degrades to the fallback visual instead of being retried.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::markers::MarkerRecord;

/// Key the renderer uses when an icon is missing or failed to load.
pub const FALLBACK_ICON_KEY: &str = "marker-fallback";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("icon {url} failed to load: {reason}")]
pub struct IconLoadError {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconState {
    Pending(FetchTicket),
    Ready(IconImage),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFetch {
    pub ticket: FetchTicket,
    pub key: String,
    pub url: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum IconLookup<'a> {
    /// First sight of the key: the caller must load `url`.
    Fetch(IconFetch),
    Pending(FetchTicket),
    Ready(&'a IconImage),
    Fallback,
}

#[derive(Debug, Default)]
pub struct IconCache {
    next_ticket: u64,
    entries: BTreeMap<String, IconState>,
    tickets: BTreeMap<FetchTicket, String>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self, key: &str) -> Option<&IconState> {
        self.entries.get(key)
    }

    /// Looks up `key`, starting a fetch of `url` the first time it is seen.
    /// Without a URL an unknown key resolves to the fallback.
    pub fn request(&mut self, key: &str, url: Option<&str>) -> IconLookup<'_> {
        if !self.entries.contains_key(key) {
            let Some(url) = url else {
                return IconLookup::Fallback;
            };
            self.next_ticket += 1;
            let ticket = FetchTicket(self.next_ticket);
            self.entries
                .insert(key.to_string(), IconState::Pending(ticket));
            self.tickets.insert(ticket, key.to_string());
            debug!(key, url, ticket = ticket.0, "icon fetch started");
            return IconLookup::Fetch(IconFetch {
                ticket,
                key: key.to_string(),
                url: url.to_string(),
            });
        }

        match self.entries.get(key) {
            Some(IconState::Pending(ticket)) => IconLookup::Pending(*ticket),
            Some(IconState::Ready(image)) => IconLookup::Ready(image),
            Some(IconState::Failed) | None => IconLookup::Fallback,
        }
    }

    /// Stores the outcome of a fetch. Returns `false` for tickets that were
    /// cancelled or already completed; their results are dropped.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<IconImage, IconLoadError>,
    ) -> bool {
        let Some(key) = self.tickets.remove(&ticket) else {
            debug!(ticket = ticket.0, "ignoring completion for unknown icon ticket");
            return false;
        };
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        if *entry != IconState::Pending(ticket) {
            return false;
        }
        *entry = match result {
            Ok(image) => IconState::Ready(image),
            Err(err) => {
                warn!(key, error = %err, "icon unavailable, using fallback");
                IconState::Failed
            }
        };
        true
    }

    /// Abandons an in-flight fetch. The key is forgotten so a later request
    /// starts over.
    pub fn cancel(&mut self, ticket: FetchTicket) -> bool {
        let Some(key) = self.tickets.remove(&ticket) else {
            return false;
        };
        if self.entries.get(&key) == Some(&IconState::Pending(ticket)) {
            self.entries.remove(&key);
        }
        true
    }

    /// One fetch per distinct, not yet known icon key among `markers`.
    pub fn plan_fetches(&mut self, markers: &[MarkerRecord]) -> Vec<IconFetch> {
        let mut fetches = Vec::new();
        for marker in markers {
            if let IconLookup::Fetch(fetch) =
                self.request(&marker.icon_key, marker.icon_url.as_deref())
            {
                fetches.push(fetch);
            }
        }
        fetches
    }

    /// Image key to draw for `key`: itself once loaded, the fallback otherwise.
    pub fn display_key<'a>(&self, key: &'a str) -> &'a str {
        match self.entries.get(key) {
            Some(IconState::Ready(_)) => key,
            _ => FALLBACK_ICON_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FALLBACK_ICON_KEY, FetchTicket, IconCache, IconImage, IconLoadError, IconLookup,
        IconState,
    };
    use crate::markers::MarkerRecord;
    use foundation::LatLng;

    fn image() -> IconImage {
        IconImage {
            width: 1,
            height: 1,
            rgba: vec![255, 0, 0, 255],
        }
    }

    fn marker(id: &str, key: &str, url: Option<&str>) -> MarkerRecord {
        MarkerRecord {
            id: id.to_string(),
            position: LatLng::new(48.0, 17.0),
            icon_key: key.to_string(),
            icon_url: url.map(str::to_string),
            label: String::new(),
        }
    }

    #[test]
    fn one_fetch_per_key() {
        let mut cache = IconCache::new();
        let markers = [
            marker("centroid-a", "factory", Some("https://example.org/f.png")),
            marker("centroid-b", "factory", Some("https://example.org/f.png")),
            marker("centroid-c", "tank", Some("https://example.org/t.png")),
            marker("centroid-d", "plain", None),
        ];
        let fetches = cache.plan_fetches(&markers);
        assert_eq!(fetches.len(), 2);
        assert_eq!(fetches[0].key, "factory");
        assert_eq!(fetches[1].url, "https://example.org/t.png");

        assert!(cache.plan_fetches(&markers).is_empty());
        assert_eq!(
            cache.request("factory", Some("https://example.org/f.png")),
            IconLookup::Pending(fetches[0].ticket)
        );
    }

    #[test]
    fn completed_icons_are_ready() {
        let mut cache = IconCache::new();
        let IconLookup::Fetch(fetch) = cache.request("factory", Some("u")) else {
            panic!("expected a fetch");
        };
        assert!(cache.complete(fetch.ticket, Ok(image())));
        assert_eq!(cache.request("factory", None), IconLookup::Ready(&image()));
        assert_eq!(cache.display_key("factory"), "factory");
        assert!(!cache.complete(fetch.ticket, Ok(image())));
    }

    #[test]
    fn failures_degrade_to_the_fallback() {
        let mut cache = IconCache::new();
        let IconLookup::Fetch(fetch) = cache.request("broken", Some("u")) else {
            panic!("expected a fetch");
        };
        let err = IconLoadError {
            url: "u".to_string(),
            reason: "404".to_string(),
        };
        assert!(cache.complete(fetch.ticket, Err(err)));
        assert_eq!(cache.state("broken"), Some(&IconState::Failed));
        assert_eq!(cache.request("broken", Some("u")), IconLookup::Fallback);
        assert_eq!(cache.display_key("broken"), FALLBACK_ICON_KEY);
        assert_eq!(cache.display_key("never-seen"), FALLBACK_ICON_KEY);
    }

    #[test]
    fn late_completions_after_cancel_are_ignored() {
        let mut cache = IconCache::new();
        let IconLookup::Fetch(first) = cache.request("factory", Some("u")) else {
            panic!("expected a fetch");
        };
        assert!(cache.cancel(first.ticket));
        assert!(cache.is_empty());
        assert!(!cache.complete(first.ticket, Ok(image())));
        assert!(!cache.cancel(FetchTicket(999)));

        let IconLookup::Fetch(second) = cache.request("factory", Some("u")) else {
            panic!("expected a new fetch");
        };
        assert_ne!(first.ticket, second.ticket);
        assert!(cache.complete(second.ticket, Ok(image())));
        assert_eq!(cache.len(), 1);
    }
}
