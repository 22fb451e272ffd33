//! Concurrent in-memory store for students, scholarships and applications.
//!
//! Updates use optimistic versioning: a write is accepted only when the
//! caller's `version` matches the stored one, and the stored version is
//! then incremented.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use scholarflow_core::application::{
    Application, ApplicationRepository, Approval, RepositoryError, ScholarshipRepository,
    StudentRepository,
};
use scholarflow_core::eligibility::StudentProfile;
use scholarflow_core::scholarship::Scholarship;
use scholarflow_shared::{ApplicationId, ScholarshipId, StudentId, UserId};
use tracing::debug;

/// In-memory implementation of every repository the lifecycle needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: DashMap<StudentId, StudentProfile>,
    students_by_user: DashMap<UserId, StudentId>,
    scholarships: DashMap<ScholarshipId, Scholarship>,
    applications: DashMap<ApplicationId, Application>,
    by_student_scholarship: DashMap<(StudentId, ScholarshipId), ApplicationId>,
    approvals: DashMap<ApplicationId, Vec<Approval>>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a student profile.
    pub fn insert_student(&self, student: StudentProfile) {
        self.students_by_user.insert(student.user_id, student.id);
        self.students.insert(student.id, student);
    }

    /// Adds or replaces a scholarship.
    pub fn insert_scholarship(&self, scholarship: Scholarship) {
        self.scholarships.insert(scholarship.id, scholarship);
    }

    /// Simulates an outage: every call fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored applications.
    #[must_use]
    pub fn application_count(&self) -> usize {
        self.applications.len()
    }

    fn ensure_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Swaps in a newer revision of an application under the shard lock.
    fn commit(
        stored: &mut Application,
        mut application: Application,
    ) -> Result<Application, RepositoryError> {
        if stored.version != application.version {
            return Err(RepositoryError::VersionConflict {
                entity: "application",
                id: application.id.to_string(),
                expected: application.version,
                actual: stored.version,
            });
        }
        application.version += 1;
        *stored = application.clone();
        Ok(application)
    }
}

impl StudentRepository for MemoryStore {
    async fn find_student(&self, id: StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        self.ensure_online()?;
        Ok(self.students.get(&id).map(|s| s.clone()))
    }

    async fn find_student_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<StudentProfile>, RepositoryError> {
        self.ensure_online()?;
        let Some(student_id) = self.students_by_user.get(&user_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.students.get(&student_id).map(|s| s.clone()))
    }
}

impl ScholarshipRepository for MemoryStore {
    async fn find_scholarship(
        &self,
        id: ScholarshipId,
    ) -> Result<Option<Scholarship>, RepositoryError> {
        self.ensure_online()?;
        Ok(self.scholarships.get(&id).map(|s| s.clone()))
    }

    async fn reserve_recipient_slot(&self, id: ScholarshipId) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        let mut scholarship =
            self.scholarships
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "scholarship",
                    id: id.to_string(),
                })?;
        if !scholarship.has_open_slot() {
            return Err(RepositoryError::CapacityExhausted(id));
        }
        scholarship.current_recipients += 1;
        debug!(scholarship_id = %id, recipients = scholarship.current_recipients, "recipient slot reserved");
        Ok(())
    }

    async fn release_recipient_slot(&self, id: ScholarshipId) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        let mut scholarship =
            self.scholarships
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "scholarship",
                    id: id.to_string(),
                })?;
        scholarship.current_recipients = scholarship.current_recipients.saturating_sub(1);
        Ok(())
    }
}

impl ApplicationRepository for MemoryStore {
    async fn find_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.ensure_online()?;
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn find_application_for(
        &self,
        student_id: StudentId,
        scholarship_id: ScholarshipId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.ensure_online()?;
        let Some(id) = self
            .by_student_scholarship
            .get(&(student_id, scholarship_id))
            .map(|id| *id)
        else {
            return Ok(None);
        };
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn create_application(
        &self,
        mut application: Application,
    ) -> Result<Application, RepositoryError> {
        self.ensure_online()?;
        // Index lock first, then the application map.
        match self
            .by_student_scholarship
            .entry((application.student_id, application.scholarship_id))
        {
            Entry::Occupied(_) => Err(RepositoryError::DuplicateKey(format!(
                "application for student {} and scholarship {}",
                application.student_id, application.scholarship_id
            ))),
            Entry::Vacant(slot) => {
                application.version = 1;
                self.applications
                    .insert(application.id, application.clone());
                slot.insert(application.id);
                Ok(application)
            }
        }
    }

    async fn update_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.ensure_online()?;
        let mut stored =
            self.applications
                .get_mut(&application.id)
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "application",
                    id: application.id.to_string(),
                })?;
        Self::commit(&mut stored, application)
    }

    async fn record_review(
        &self,
        application: Application,
        approval: Approval,
    ) -> Result<Application, RepositoryError> {
        self.ensure_online()?;
        // Application lock first, then approvals; held together so the
        // record and the state change land as one.
        let mut stored =
            self.applications
                .get_mut(&application.id)
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "application",
                    id: application.id.to_string(),
                })?;
        let committed = Self::commit(&mut stored, application)?;
        self.approvals
            .entry(committed.id)
            .or_default()
            .push(approval);
        Ok(committed)
    }

    async fn delete_application(
        &self,
        id: ApplicationId,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        let removed = self.applications.remove_if(&id, |_, stored| {
            stored.version == expected_version && stored.status().can_be_deleted()
        });
        let Some((_, removed)) = removed else {
            let actual = self.applications.get(&id).map(|stored| stored.version);
            debug!(application_id = %id, expected_version, ?actual, "delete refused");
            return Err(match actual {
                Some(actual) => RepositoryError::VersionConflict {
                    entity: "application",
                    id: id.to_string(),
                    expected: expected_version,
                    actual,
                },
                None => RepositoryError::NotFound {
                    entity: "application",
                    id: id.to_string(),
                },
            });
        };
        self.by_student_scholarship
            .remove(&(removed.student_id, removed.scholarship_id));
        self.approvals.remove(&id);
        Ok(())
    }

    async fn approvals_for(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Approval>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .approvals
            .get(&application_id)
            .map(|records| records.clone())
            .unwrap_or_default())
    }
}
