//! Shared plumbing for the tabbed dashboards.
//!
//! A dashboard owns one [`Board`]. Selecting a tab issues a [`Ticket`]
//! stamped with the board's current generation; the ticket runs the fetch
//! without borrowing the board, and [`Board::apply`] drops any result whose
//! generation is no longer current. A slow fetch for a tab the user already
//! left therefore cannot overwrite newer state.

use std::fmt;
use std::sync::Arc;

use log::{debug, error};

use crate::models::{Amenity, Announcement, Complaint, User};
use crate::repo::{Repo, RepoResult};

/// Generic notice shown when a store call fails.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Blocking prompts surfaced to the person using the portal.
pub trait Interaction: Send + Sync {
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
}

/// Which table a tab reads, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    OwnComplaints,
    AllComplaints,
    Amenities,
    Announcements,
}

impl Source {
    async fn fetch(self, repo: &dyn Repo, user_id: &str) -> RepoResult<Payload> {
        Ok(match self {
            Source::OwnComplaints => Payload::Complaints(repo.list_complaints_for(user_id).await?),
            Source::AllComplaints => Payload::Complaints(repo.list_complaints().await?),
            Source::Amenities => Payload::Amenities(repo.list_amenities().await?),
            Source::Announcements => Payload::Announcements(repo.list_announcements().await?),
        })
    }
}

#[derive(Debug)]
pub enum Payload {
    Complaints(Vec<Complaint>),
    Amenities(Vec<Amenity>),
    Announcements(Vec<Announcement>),
}

/// A dashboard tab; each tab names the data it fetches when activated.
pub trait Tab: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    fn source(self) -> Option<Source>;
    fn label(self) -> &'static str;
}

/// Snapshot of one list as last fetched.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    items: Vec<T>,
    loading: bool,
    loaded: bool,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self { items: Vec::new(), loading: false, loaded: false }
    }
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Fetched at least once, not currently loading, and nothing to show.
    pub fn is_empty_state(&self) -> bool {
        self.loaded && !self.loading && self.items.is_empty()
    }

    fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.loading = false;
        self.loaded = true;
    }
}

/// A pending fetch. Holds its own handles so the board stays free while it runs.
pub struct Ticket {
    generation: u64,
    source: Option<Source>,
    repo: Arc<dyn Repo>,
    user_id: String,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> Loaded {
        let result = match self.source {
            Some(source) => Some(source.fetch(self.repo.as_ref(), &self.user_id).await),
            None => None,
        };
        Loaded { generation: self.generation, source: self.source, result }
    }
}

pub struct Loaded {
    generation: u64,
    source: Option<Source>,
    result: Option<RepoResult<Payload>>,
}

pub struct Board<T: Tab> {
    repo: Arc<dyn Repo>,
    user: User,
    active: T,
    generation: u64,
    pub complaints: Listing<Complaint>,
    pub amenities: Listing<Amenity>,
    pub announcements: Listing<Announcement>,
}

impl<T: Tab> Board<T> {
    pub fn new(repo: Arc<dyn Repo>, user: User, initial: T) -> Self {
        Self {
            repo,
            user,
            active: initial,
            generation: 0,
            complaints: Listing::default(),
            amenities: Listing::default(),
            announcements: Listing::default(),
        }
    }

    pub fn repo_handle(&self) -> Arc<dyn Repo> {
        Arc::clone(&self.repo)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn active(&self) -> T {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switches tabs and issues the fetch for the new tab.
    pub fn activate(&mut self, tab: T) -> Ticket {
        self.active = tab;
        self.issue(tab.source())
    }

    /// Re-reads `source` without leaving the current tab.
    pub fn refresh(&mut self, source: Source) -> Ticket {
        self.issue(Some(source))
    }

    fn issue(&mut self, source: Option<Source>) -> Ticket {
        self.generation += 1;
        self.complaints.loading = false;
        self.amenities.loading = false;
        self.announcements.loading = false;
        match source {
            Some(Source::OwnComplaints | Source::AllComplaints) => self.complaints.loading = true,
            Some(Source::Amenities) => self.amenities.loading = true,
            Some(Source::Announcements) => self.announcements.loading = true,
            None => {}
        }
        Ticket {
            generation: self.generation,
            source,
            repo: Arc::clone(&self.repo),
            user_id: self.user.id.clone(),
        }
    }

    /// Stores a finished fetch. Returns false when the result was stale or failed.
    pub fn apply(&mut self, loaded: Loaded) -> bool {
        if loaded.generation != self.generation {
            debug!(
                "discarding stale {:?} fetch (generation {} < {})",
                loaded.source, loaded.generation, self.generation
            );
            return false;
        }
        match loaded.result {
            None => true,
            Some(Ok(Payload::Complaints(items))) => { self.complaints.replace(items); true }
            Some(Ok(Payload::Amenities(items))) => { self.amenities.replace(items); true }
            Some(Ok(Payload::Announcements(items))) => { self.announcements.replace(items); true }
            Some(Err(e)) => {
                error!("fetching {:?} failed: {e}", loaded.source);
                self.complaints.loading = false;
                self.amenities.loading = false;
                self.announcements.loading = false;
                false
            }
        }
    }

    pub async fn select(&mut self, tab: T) -> bool {
        let ticket = self.activate(tab);
        let loaded = ticket.run().await;
        self.apply(loaded)
    }

    pub async fn reload(&mut self, source: Source) -> bool {
        let ticket = self.refresh(source);
        let loaded = ticket.run().await;
        self.apply(loaded)
    }
}
