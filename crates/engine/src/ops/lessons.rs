use chrono::NaiveDate;

use crate::{
    ChildId, ClockTime, EngineError, Lesson, LessonId, OperatorId, ResultEngine,
};

use super::Engine;

/// Result of a bulk recurrence insert. Candidates insert independently, so
/// `created` may fall short of `requested` without rolling anything back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecurrenceOutcome {
    pub requested: usize,
    pub created: usize,
}

impl Engine {
    /// Schedules a single lesson. The child must be currently visible; the
    /// end time must be strictly later than the start.
    ///
    /// Identical repeated calls create independent records on purpose: two
    /// physically distinct sessions may share every parameter.
    pub async fn add_lesson(
        &self,
        operator: OperatorId,
        child_id: ChildId,
        date: NaiveDate,
        start_time: ClockTime,
        end_time: ClockTime,
    ) -> ResultEngine<Lesson> {
        self.visible_child(child_id).await?;
        let lesson = Lesson::new(operator, child_id, date, start_time, end_time)?;
        self.store().insert_lesson(lesson.clone()).await?;
        Ok(lesson)
    }

    pub async fn lesson(&self, id: LessonId) -> ResultEngine<Lesson> {
        match self.store().lesson(id).await {
            Some(lesson) if self.allowed_operators().contains(&lesson.operator) => Ok(lesson),
            _ => Err(EngineError::NotFound(format!("lesson {id}"))),
        }
    }

    /// Every lesson in the shared workspace, newest date first.
    pub async fn lessons(&self) -> ResultEngine<Vec<Lesson>> {
        Ok(self.store().lessons(self.allowed_operators(), None).await)
    }

    pub async fn lessons_for_child(&self, child_id: ChildId) -> ResultEngine<Vec<Lesson>> {
        Ok(self
            .store()
            .lessons(self.allowed_operators(), Some(child_id))
            .await)
    }

    /// Lessons on one calendar day, sorted by start time.
    pub async fn lessons_on(&self, date: NaiveDate) -> ResultEngine<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self
            .store()
            .lessons(self.allowed_operators(), None)
            .await
            .into_iter()
            .filter(|l| l.date == date)
            .collect();
        lessons.sort_by_key(|l| l.start_time);
        Ok(lessons)
    }

    /// Moves a lesson to a new date/time slot, re-checking the time
    /// invariant.
    pub async fn reschedule_lesson(
        &self,
        id: LessonId,
        date: NaiveDate,
        start_time: ClockTime,
        end_time: ClockTime,
    ) -> ResultEngine<Lesson> {
        if end_time <= start_time {
            return Err(EngineError::EndNotAfterStart);
        }
        self.lesson(id).await?;
        self.store()
            .update_lesson(id, |lesson| {
                lesson.date = date;
                lesson.start_time = start_time;
                lesson.end_time = end_time;
            })
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("lesson {id}")))
    }

    pub async fn set_lesson_completed(&self, id: LessonId, completed: bool) -> ResultEngine<Lesson> {
        self.lesson(id).await?;
        self.store()
            .update_lesson(id, |lesson| lesson.completed = completed)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("lesson {id}")))
    }

    pub async fn set_lesson_cancelled(&self, id: LessonId, cancelled: bool) -> ResultEngine<Lesson> {
        self.lesson(id).await?;
        self.store()
            .update_lesson(id, |lesson| lesson.cancelled = cancelled)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("lesson {id}")))
    }

    pub async fn set_lesson_paid(&self, id: LessonId, paid: bool) -> ResultEngine<Lesson> {
        self.lesson(id).await?;
        self.store()
            .update_lesson(id, |lesson| lesson.paid = paid)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("lesson {id}")))
    }

    pub async fn delete_lesson(&self, id: LessonId) -> ResultEngine<()> {
        self.lesson(id).await?;
        self.store().delete_lesson(id).await?;
        Ok(())
    }

    /// Inserts one lesson per candidate date, skipping candidates that fail.
    ///
    /// Not atomic: earlier inserts stay even when a later one fails. Errors
    /// are reported through the returned counts; callers log the details.
    pub async fn schedule_recurring(
        &self,
        operator: OperatorId,
        child_id: ChildId,
        candidates: &[NaiveDate],
        start_time: ClockTime,
        end_time: ClockTime,
        mut on_error: impl FnMut(NaiveDate, EngineError),
    ) -> RecurrenceOutcome {
        let mut created = 0;
        for date in candidates {
            match self
                .add_lesson(operator, child_id, *date, start_time, end_time)
                .await
            {
                Ok(_) => created += 1,
                Err(err) => on_error(*date, err),
            }
        }
        RecurrenceOutcome {
            requested: candidates.len(),
            created,
        }
    }
}
