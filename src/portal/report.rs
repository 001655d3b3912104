use std::future::Future;

use log::error;

use crate::models::{Complaint, MissingField, NewComplaint, SubmitComplaint, User};
use crate::repo::{Repo, RepoResult};

use super::view::Interaction;

pub const MISSING_FIELDS: &str = "Please fill problem description and location.";
pub const NO_PHOTO_PROMPT: &str = "You did not select a photo. Submit complaint without image?";
pub const SUBMITTED: &str = "Complaint submitted successfully!";
pub const SUBMIT_FAILED: &str = "Error submitting complaint";

/// A picked photo. Only drives the no-photo prompt; it is never uploaded or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSelection {
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Invalid(MissingField),
    /// The no-photo prompt was declined.
    Declined,
    /// An insert for this form is already running.
    Busy,
    Submitted(Complaint),
    Failed,
}

/// A validated, confirmed report whose insert has not finished yet.
#[derive(Debug)]
pub struct PendingReport(NewComplaint);

impl PendingReport {
    pub fn complaint(&self) -> &NewComplaint {
        &self.0
    }

    pub fn into_complaint(self) -> NewComplaint {
        self.0
    }
}

/// The "report a problem" form.
#[derive(Debug, Clone, Default)]
pub struct ReportIssue {
    pub description: String,
    pub location: String,
    pub photo: Option<PhotoSelection>,
    submitting: bool,
}

/// Clears the submitting flag when the insert ends or is dropped mid-flight.
struct InFlight<'a>(&'a mut bool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl ReportIssue {
    /// True between [`ReportIssue::begin`] and [`ReportIssue::finish`]; the
    /// submit control is disabled meanwhile.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn clear(&mut self) {
        self.description.clear();
        self.location.clear();
        self.photo = None;
    }

    /// Validates, confirms a photo-less report and marks the form as submitting.
    /// Nothing is written to the store here.
    pub fn begin(&mut self, user: &User, ui: &dyn Interaction) -> Result<PendingReport, SubmitOutcome> {
        if self.submitting {
            return Err(SubmitOutcome::Busy);
        }
        let draft = SubmitComplaint {
            issue: self.description.clone(),
            location: self.location.clone(),
        };
        if let Err(missing) = draft.validate() {
            ui.alert(MISSING_FIELDS);
            return Err(SubmitOutcome::Invalid(missing));
        }
        if self.photo.is_none() && !ui.confirm(NO_PHOTO_PROMPT) {
            return Err(SubmitOutcome::Declined);
        }
        self.submitting = true;
        Ok(PendingReport(NewComplaint {
            user_id: user.id.clone(),
            name: user.full_name.clone(),
            issue: draft.issue,
            location: draft.location,
        }))
    }

    /// Settles the insert started by [`ReportIssue::begin`].
    ///
    /// On success the form is cleared, `on_success` runs, then the
    /// acknowledgement is shown. On a store failure the form keeps its
    /// contents so the citizen can retry.
    pub async fn finish<F, Fut>(
        &mut self,
        result: RepoResult<Complaint>,
        ui: &dyn Interaction,
        on_success: F,
    ) -> SubmitOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.submitting = false;
        match result {
            Ok(complaint) => {
                self.clear();
                on_success().await;
                ui.alert(SUBMITTED);
                SubmitOutcome::Submitted(complaint)
            }
            Err(e) => {
                error!("complaint insert failed: {e}");
                ui.alert(SUBMIT_FAILED);
                SubmitOutcome::Failed
            }
        }
    }

    /// [`ReportIssue::begin`], one complaint insert, then [`ReportIssue::finish`].
    pub async fn submit<F, Fut>(
        &mut self,
        repo: &dyn Repo,
        user: &User,
        ui: &dyn Interaction,
        on_success: F,
    ) -> SubmitOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let pending = match self.begin(user, ui) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = {
            let _flight = InFlight(&mut self.submitting);
            repo.create_complaint(pending.into_complaint()).await
        };
        self.finish(result, ui, on_success).await
    }
}
