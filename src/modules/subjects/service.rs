use tracing::{instrument, warn};

use timetabler_models::{
    CreateSubjectDto, Subject, SubjectList, SubjectSource, fallback_subjects,
};
use timetabler_observability::track_subjects_fallback;
use timetabler_store::{StoreResult, SubjectStore};

pub struct SubjectService;

impl SubjectService {
    /// Stored subjects for `year`, or the bundled list when the store has none or
    /// cannot be reached. Never fails.
    #[instrument(skip(store))]
    pub async fn list_for_year(store: &dyn SubjectStore, year: &str) -> SubjectList {
        let reason = match store.list_by_year(year).await {
            Ok(subjects) if !subjects.is_empty() => {
                return SubjectList {
                    source: SubjectSource::Store,
                    subjects,
                };
            }
            Ok(_) => "empty",
            Err(err) => {
                warn!(error = %err, "Subject store unavailable, using bundled subjects");
                "unavailable"
            }
        };

        track_subjects_fallback(reason);
        SubjectList {
            source: SubjectSource::Fallback,
            subjects: fallback_subjects(year),
        }
    }

    #[instrument(skip(store, dto), fields(subject = %dto.name))]
    pub async fn create(store: &dyn SubjectStore, dto: CreateSubjectDto) -> StoreResult<Subject> {
        let subject = dto.into_subject();
        store.add(&subject).await?;
        Ok(subject)
    }

    /// Teacher of the subject named `subject` in `year`, matched case-insensitively.
    pub async fn teacher_for(store: &dyn SubjectStore, year: &str, subject: &str) -> Option<String> {
        let wanted = subject.trim();
        Self::list_for_year(store, year)
            .await
            .subjects
            .into_iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(wanted))
            .map(|candidate| candidate.teacher)
    }
}
