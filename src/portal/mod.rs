//! Portal-side logic: session gate, routing, issue reporting and the two
//! role dashboards, all driven straight against a [`crate::repo::Repo`].

pub mod admin;
pub mod citizen;
pub mod report;
pub mod router;
pub mod session;
pub mod view;

pub use admin::{AdminDashboard, AdminTab};
pub use citizen::{CitizenDashboard, CitizenTab};
pub use report::{PendingReport, PhotoSelection, ReportIssue, SubmitOutcome};
pub use router::{guard, settle, Decision, Route, Screen};
pub use session::{IdentityProvider, Session, SessionState, TokenIdentity};
pub use view::{Board, Interaction, Listing, Source, Tab};
