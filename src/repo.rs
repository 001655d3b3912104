use chrono::{DateTime, Utc};

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("store error: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

#[async_trait]
pub trait ComplaintRepo: Send + Sync {
    /// Every complaint, newest first.
    async fn list_complaints(&self) -> RepoResult<Vec<Complaint>>;
    /// Complaints owned by `user_id`, newest first.
    async fn list_complaints_for(&self, user_id: &str) -> RepoResult<Vec<Complaint>>;
    async fn get_complaint(&self, id: Id) -> RepoResult<Complaint>;
    async fn create_complaint(&self, new: NewComplaint) -> RepoResult<Complaint>;
    /// Sets the status and stamps `updated_at`, even when the status is unchanged.
    async fn update_complaint_status(&self, id: Id, status: ComplaintStatus, at: DateTime<Utc>) -> RepoResult<Complaint>;
}

#[async_trait]
pub trait AmenityRepo: Send + Sync {
    async fn list_amenities(&self) -> RepoResult<Vec<Amenity>>;
    async fn create_amenity(&self, new: NewAmenity) -> RepoResult<Amenity>;
    async fn delete_amenity(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait AnnouncementRepo: Send + Sync {
    async fn list_announcements(&self) -> RepoResult<Vec<Announcement>>;
    async fn create_announcement(&self, new: NewAnnouncement) -> RepoResult<Announcement>;
    async fn delete_announcement(&self, id: Id) -> RepoResult<()>;
}

pub trait Repo: ComplaintRepo + AmenityRepo + AnnouncementRepo {}

impl<T> Repo for T where T: ComplaintRepo + AmenityRepo + AnnouncementRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use log::{info, warn};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

    const SNAPSHOT_FILE: &str = "state.json";

    #[derive(Clone, Default, Serialize, Deserialize)]
    struct State {
        complaints: HashMap<Id, Complaint>,
        amenities: HashMap<Id, Amenity>,
        announcements: HashMap<Id, Announcement>,
        next_id: Id,
    }

    /// Process-local store that mirrors every mutation into a JSON snapshot.
    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        /// Snapshot kept at `<dir>/state.json`.
        pub fn in_dir(dir: impl AsRef<Path>) -> Self {
            Self::at(dir.as_ref().join(SNAPSHOT_FILE))
        }

        pub fn at(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let state = Self::load_state_from(&path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        /// No snapshot at all; state dies with the value.
        pub fn ephemeral() -> Self {
            Self { state: Arc::new(RwLock::new(State::default())), snapshot_path: None }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        warn!("failed to parse snapshot '{}': {e}; starting empty", path.display());
                        State::default()
                    }
                },
                Err(e) => {
                    info!("no snapshot at '{}' ({e}); starting empty", path.display());
                    State::default()
                }
            }
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        /// Applies `change` to a copy of the state, writes that copy to the
        /// snapshot and only then swaps it in. The write guard is held
        /// throughout, so snapshot writes land in mutation order and a failed
        /// write leaves the store untouched.
        fn commit<R>(&self, change: impl FnOnce(&mut State) -> RepoResult<R>) -> RepoResult<R> {
            let mut guard = self.write()?;
            let mut next = guard.clone();
            let out = change(&mut next)?;
            self.persist(&next)?;
            *guard = next;
            Ok(out)
        }

        fn persist(&self, state: &State) -> RepoResult<()> {
            let Some(path) = self.snapshot_path.as_deref() else { return Ok(()) };
            let bytes = serde_json::to_vec_pretty(state)
                .map_err(|e| RepoError::Internal(e.to_string()))?;
            if let Some(dir) = path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            std::fs::write(path, bytes).map_err(|e| {
                warn!("failed to write snapshot '{}': {e}", path.display());
                RepoError::Internal(e.to_string())
            })
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }
    }

    #[async_trait]
    impl ComplaintRepo for InMemRepo {
        async fn list_complaints(&self) -> RepoResult<Vec<Complaint>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.complaints.values().cloned().collect();
            newest_first(&mut v, |c| (c.created_at, c.id));
            Ok(v)
        }
        async fn list_complaints_for(&self, user_id: &str) -> RepoResult<Vec<Complaint>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.complaints.values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            newest_first(&mut v, |c| (c.created_at, c.id));
            Ok(v)
        }
        async fn get_complaint(&self, id: Id) -> RepoResult<Complaint> {
            let s = self.read()?;
            s.complaints.get(&id).cloned().ok_or(RepoError::NotFound)
        }
        async fn create_complaint(&self, new: NewComplaint) -> RepoResult<Complaint> {
            self.commit(|s| {
                let now = Utc::now();
                let id = Self::next_id(s);
                let complaint = Complaint {
                    id,
                    user_id: new.user_id,
                    name: new.name,
                    issue: new.issue,
                    location: new.location,
                    status: ComplaintStatus::Pending,
                    created_at: now,
                    updated_at: now,
                };
                s.complaints.insert(id, complaint.clone());
                Ok(complaint)
            })
        }
        async fn update_complaint_status(&self, id: Id, status: ComplaintStatus, at: DateTime<Utc>) -> RepoResult<Complaint> {
            self.commit(|s| {
                let complaint = s.complaints.get_mut(&id).ok_or(RepoError::NotFound)?;
                complaint.status = status;
                complaint.updated_at = at;
                Ok(complaint.clone())
            })
        }
    }

    #[async_trait]
    impl AmenityRepo for InMemRepo {
        async fn list_amenities(&self) -> RepoResult<Vec<Amenity>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.amenities.values().cloned().collect();
            newest_first(&mut v, |a| (a.created_at, a.id));
            Ok(v)
        }
        async fn create_amenity(&self, new: NewAmenity) -> RepoResult<Amenity> {
            self.commit(|s| {
                let id = Self::next_id(s);
                let amenity = Amenity {
                    id,
                    name: new.name,
                    kind: new.kind,
                    location: new.location,
                    description: new.description,
                    created_at: Utc::now(),
                };
                s.amenities.insert(id, amenity.clone());
                Ok(amenity)
            })
        }
        async fn delete_amenity(&self, id: Id) -> RepoResult<()> {
            self.commit(|s| s.amenities.remove(&id).map(drop).ok_or(RepoError::NotFound))
        }
    }

    #[async_trait]
    impl AnnouncementRepo for InMemRepo {
        async fn list_announcements(&self) -> RepoResult<Vec<Announcement>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.announcements.values().cloned().collect();
            newest_first(&mut v, |a| (a.created_at, a.id));
            Ok(v)
        }
        async fn create_announcement(&self, new: NewAnnouncement) -> RepoResult<Announcement> {
            self.commit(|s| {
                let id = Self::next_id(s);
                let announcement = Announcement {
                    id,
                    title: new.title,
                    content: new.content,
                    created_by: new.created_by,
                    created_at: Utc::now(),
                };
                s.announcements.insert(id, announcement.clone());
                Ok(announcement)
            })
        }
        async fn delete_announcement(&self, id: Id) -> RepoResult<()> {
            self.commit(|s| s.announcements.remove(&id).map(drop).ok_or(RepoError::NotFound))
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    const COMPLAINT_COLUMNS: &str = "id, user_id, name, issue, location, status, created_at, updated_at";
    const AMENITY_COLUMNS: &str = "id, name, type, location, description, created_at";
    const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, created_by, created_at";

    fn map_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            other => {
                log::error!("postgres error: {other}");
                RepoError::Internal(other.to_string())
            }
        }
    }

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        /// Applies `migrations/` against the pool.
        pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
            sqlx::migrate!("./migrations").run(&self.pool).await
        }
    }

    #[async_trait]
    impl ComplaintRepo for PgRepo {
        async fn list_complaints(&self) -> RepoResult<Vec<Complaint>> {
            sqlx::query_as::<_, Complaint>(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints ORDER BY created_at DESC, id DESC"
            ))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn list_complaints_for(&self, user_id: &str) -> RepoResult<Vec<Complaint>> {
            sqlx::query_as::<_, Complaint>(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
            ))
                .bind(user_id)
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn get_complaint(&self, id: Id) -> RepoResult<Complaint> {
            sqlx::query_as::<_, Complaint>(&format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"))
                .bind(id)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn create_complaint(&self, new: NewComplaint) -> RepoResult<Complaint> {
            sqlx::query_as::<_, Complaint>(&format!(
                "INSERT INTO complaints (user_id, name, issue, location, status) VALUES ($1,$2,$3,$4,$5) RETURNING {COMPLAINT_COLUMNS}"
            ))
                .bind(&new.user_id)
                .bind(&new.name)
                .bind(&new.issue)
                .bind(&new.location)
                .bind(ComplaintStatus::Pending.as_str())
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn update_complaint_status(&self, id: Id, status: ComplaintStatus, at: DateTime<Utc>) -> RepoResult<Complaint> {
            sqlx::query_as::<_, Complaint>(&format!(
                "UPDATE complaints SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COMPLAINT_COLUMNS}"
            ))
                .bind(id)
                .bind(status.as_str())
                .bind(at)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl AmenityRepo for PgRepo {
        async fn list_amenities(&self) -> RepoResult<Vec<Amenity>> {
            sqlx::query_as::<_, Amenity>(&format!(
                "SELECT {AMENITY_COLUMNS} FROM amenities ORDER BY created_at DESC, id DESC"
            ))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_amenity(&self, new: NewAmenity) -> RepoResult<Amenity> {
            sqlx::query_as::<_, Amenity>(&format!(
                "INSERT INTO amenities (name, type, location, description) VALUES ($1,$2,$3,$4) RETURNING {AMENITY_COLUMNS}"
            ))
                .bind(&new.name)
                .bind(new.kind.as_str())
                .bind(&new.location)
                .bind(&new.description)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn delete_amenity(&self, id: Id) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM amenities WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await.map_err(map_err)?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }

    #[async_trait]
    impl AnnouncementRepo for PgRepo {
        async fn list_announcements(&self) -> RepoResult<Vec<Announcement>> {
            sqlx::query_as::<_, Announcement>(&format!(
                "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY created_at DESC, id DESC"
            ))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_announcement(&self, new: NewAnnouncement) -> RepoResult<Announcement> {
            sqlx::query_as::<_, Announcement>(&format!(
                "INSERT INTO announcements (title, content, created_by) VALUES ($1,$2,$3) RETURNING {ANNOUNCEMENT_COLUMNS}"
            ))
                .bind(&new.title)
                .bind(&new.content)
                .bind(&new.created_by)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn delete_announcement(&self, id: Id) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM announcements WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await.map_err(map_err)?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }
}
