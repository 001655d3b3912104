use std::sync::Arc;

use crate::models::{Amenity, Announcement, Complaint, Role};
use crate::repo::Repo;

use super::report::{ReportIssue, SubmitOutcome};
use super::session::Session;
use super::view::{Board, Interaction, Listing, Source, Tab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CitizenTab {
    #[default]
    MyComplaints,
    Submit,
    Amenities,
    Announcements,
}

impl Tab for CitizenTab {
    fn source(self) -> Option<Source> {
        match self {
            CitizenTab::MyComplaints => Some(Source::OwnComplaints),
            CitizenTab::Submit => None,
            CitizenTab::Amenities => Some(Source::Amenities),
            CitizenTab::Announcements => Some(Source::Announcements),
        }
    }

    fn label(self) -> &'static str {
        match self {
            CitizenTab::MyComplaints => "My Complaints",
            CitizenTab::Submit => "Submit Complaint",
            CitizenTab::Amenities => "City Amenities",
            CitizenTab::Announcements => "Announcements",
        }
    }
}

pub struct CitizenDashboard {
    board: Board<CitizenTab>,
    ui: Arc<dyn Interaction>,
    pub report: ReportIssue,
}

impl CitizenDashboard {
    /// `None` unless the session belongs to a citizen. Lands on "My Complaints"
    /// with that list already fetched.
    pub async fn open(session: &Session, repo: Arc<dyn Repo>, ui: Arc<dyn Interaction>) -> Option<Self> {
        let user = session.user().filter(|u| u.role == Role::Citizen)?.clone();
        let mut dashboard = Self {
            board: Board::new(repo, user, CitizenTab::default()),
            ui,
            report: ReportIssue::default(),
        };
        dashboard.select(CitizenTab::default()).await;
        Some(dashboard)
    }

    pub fn board(&mut self) -> &mut Board<CitizenTab> {
        &mut self.board
    }

    pub fn tab(&self) -> CitizenTab {
        self.board.active()
    }

    /// Switches tab and fetches its data. Revisiting a tab fetches again.
    pub async fn select(&mut self, tab: CitizenTab) -> bool {
        self.board.select(tab).await
    }

    pub fn complaints(&self) -> &Listing<Complaint> {
        &self.board.complaints
    }

    pub fn amenities(&self) -> &Listing<Amenity> {
        &self.board.amenities
    }

    /// Amenity cards paired with their icon.
    pub fn amenity_cards(&self) -> Vec<(&'static str, &Amenity)> {
        self.board.amenities.items().iter().map(|a| (a.kind.icon(), a)).collect()
    }

    pub fn announcements(&self) -> &Listing<Announcement> {
        &self.board.announcements
    }

    /// Submits the report form; a successful insert re-reads "My Complaints".
    pub async fn submit_report(&mut self) -> SubmitOutcome {
        let board = &mut self.board;
        let repo = board.repo_handle();
        let user = board.user().clone();
        self.report
            .submit(repo.as_ref(), &user, self.ui.as_ref(), || async move {
                board.reload(Source::OwnComplaints).await;
            })
            .await
    }
}
