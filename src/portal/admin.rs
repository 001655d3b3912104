use std::sync::Arc;

use chrono::Utc;
use log::{error, info};

use crate::models::*;
use crate::repo::Repo;

use super::session::Session;
use super::view::{Board, Interaction, Listing, Source, Tab, GENERIC_FAILURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Overview,
    Complaints,
    Amenities,
    Announcements,
}

impl Tab for AdminTab {
    fn source(self) -> Option<Source> {
        match self {
            AdminTab::Overview | AdminTab::Complaints => Some(Source::AllComplaints),
            AdminTab::Amenities => Some(Source::Amenities),
            AdminTab::Announcements => Some(Source::Announcements),
        }
    }

    fn label(self) -> &'static str {
        match self {
            AdminTab::Overview => "Dashboard",
            AdminTab::Complaints => "Complaints",
            AdminTab::Amenities => "Amenities",
            AdminTab::Announcements => "Announcements",
        }
    }
}

pub struct AdminDashboard {
    board: Board<AdminTab>,
    ui: Arc<dyn Interaction>,
    pub amenity_draft: NewAmenity,
    pub announcement_draft: PublishAnnouncement,
}

impl AdminDashboard {
    /// `None` unless the session belongs to an admin. Opens on the overview
    /// with every complaint fetched.
    pub async fn open(session: &Session, repo: Arc<dyn Repo>, ui: Arc<dyn Interaction>) -> Option<Self> {
        let user = session.user().filter(|u| u.is_admin())?.clone();
        let mut dashboard = Self {
            board: Board::new(repo, user, AdminTab::default()),
            ui,
            amenity_draft: NewAmenity::default(),
            announcement_draft: PublishAnnouncement::default(),
        };
        dashboard.select(AdminTab::default()).await;
        Some(dashboard)
    }

    pub fn board(&mut self) -> &mut Board<AdminTab> {
        &mut self.board
    }

    pub fn tab(&self) -> AdminTab {
        self.board.active()
    }

    pub async fn select(&mut self, tab: AdminTab) -> bool {
        self.board.select(tab).await
    }

    pub fn complaints(&self) -> &Listing<Complaint> {
        &self.board.complaints
    }

    pub fn amenities(&self) -> &Listing<Amenity> {
        &self.board.amenities
    }

    pub fn announcements(&self) -> &Listing<Announcement> {
        &self.board.announcements
    }

    /// Counts over the complaints already fetched; no extra store call.
    pub fn stats(&self) -> ComplaintStats {
        ComplaintStats::tally(self.board.complaints.items())
    }

    pub fn recent(&self) -> &[Complaint] {
        let items = self.board.complaints.items();
        &items[..items.len().min(RECENT_COMPLAINTS)]
    }

    /// Writes `{status, updated_at: now}` and re-reads every complaint.
    pub async fn set_status(&mut self, id: Id, status: ComplaintStatus) -> bool {
        let repo = self.board.repo_handle();
        match repo.update_complaint_status(id, status, Utc::now()).await {
            Ok(_) => {
                info!("complaint {id} set to {status}");
                self.board.reload(Source::AllComplaints).await;
                true
            }
            Err(e) => {
                error!("status update for complaint {id} failed: {e}");
                self.ui.alert(GENERIC_FAILURE);
                false
            }
        }
    }

    pub async fn add_amenity(&mut self) -> bool {
        if let Err(missing) = self.amenity_draft.validate() {
            self.ui.alert(&format!("Amenity {missing}"));
            return false;
        }
        let repo = self.board.repo_handle();
        match repo.create_amenity(self.amenity_draft.clone()).await {
            Ok(amenity) => {
                info!("amenity {} created", amenity.id);
                self.amenity_draft = NewAmenity::default();
                self.board.reload(Source::Amenities).await;
                true
            }
            Err(e) => {
                error!("amenity insert failed: {e}");
                self.ui.alert(GENERIC_FAILURE);
                false
            }
        }
    }

    pub async fn delete_amenity(&mut self, id: Id) -> bool {
        let repo = self.board.repo_handle();
        match repo.delete_amenity(id).await {
            Ok(()) => {
                self.board.reload(Source::Amenities).await;
                true
            }
            Err(e) => {
                error!("deleting amenity {id} failed: {e}");
                false
            }
        }
    }

    /// Publishes the draft stamped with the admin's id as author.
    pub async fn publish_announcement(&mut self) -> bool {
        if let Err(missing) = self.announcement_draft.validate() {
            self.ui.alert(&format!("Announcement {missing}"));
            return false;
        }
        let repo = self.board.repo_handle();
        let new = NewAnnouncement {
            title: self.announcement_draft.title.clone(),
            content: self.announcement_draft.content.clone(),
            created_by: self.board.user().id.clone(),
        };
        match repo.create_announcement(new).await {
            Ok(announcement) => {
                info!("announcement {} published", announcement.id);
                self.announcement_draft = PublishAnnouncement::default();
                self.board.reload(Source::Announcements).await;
                true
            }
            Err(e) => {
                error!("announcement insert failed: {e}");
                self.ui.alert(GENERIC_FAILURE);
                false
            }
        }
    }

    pub async fn delete_announcement(&mut self, id: Id) -> bool {
        let repo = self.board.repo_handle();
        match repo.delete_announcement(id).await {
            Ok(()) => {
                self.board.reload(Source::Announcements).await;
                true
            }
            Err(e) => {
                error!("deleting announcement {id} failed: {e}");
                false
            }
        }
    }
}
