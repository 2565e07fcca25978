//! The lesson scheduling flow and the timetable views.

use chrono::{Days, NaiveDate};

use engine::{EngineError, Lesson, LessonId, OperatorId, recurrence_candidates};

use crate::{
    ConfigParameters,
    flow::{FlowInput, Reply, Step},
    handlers::{child_names, today_kyiv, user_message_for_engine_error},
    parsing,
    state::{ActiveFlow, AddLessonFlow, AddLessonState},
    ui::{self, callback},
};

/// Entry point for `/addlesson`. Returns no flow when there is nothing to
/// schedule against yet.
pub(crate) async fn start(cfg: &ConfigParameters) -> (Option<ActiveFlow>, Reply) {
    let children = match cfg.engine.children().await {
        Ok(children) => children,
        Err(err) => return (None, Reply::text(user_message_for_engine_error(&err))),
    };
    if children.is_empty() {
        return (None, Reply::text(ui::NO_CHILDREN));
    }
    (
        Some(ActiveFlow::AddLesson(AddLessonFlow::new())),
        ui::lesson_child_prompt(&children),
    )
}

pub(crate) async fn step(
    flow: &mut AddLessonFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match flow.state {
        AddLessonState::SelectChild => select_child(flow, input, cfg).await,
        AddLessonState::Date => enter_date(flow, input),
        AddLessonState::StartTime => enter_start_time(flow, input),
        AddLessonState::EndTime => enter_end_time(flow, input, operator, cfg).await,
        AddLessonState::AskRepeat => ask_repeat(flow, input),
        AddLessonState::ConfirmRepeat => confirm_repeat(flow, input, operator, cfg).await,
    }
}

async fn select_child(
    flow: &mut AddLessonFlow,
    input: FlowInput<'_>,
    cfg: &ConfigParameters,
) -> Step {
    let Some(id) = input
        .choice()
        .and_then(|data| data.strip_prefix(callback::FLOW_CHILD))
    else {
        return Step::Stay(ui::choose_with_buttons());
    };
    let Ok(child_id) = id.parse() else {
        return Step::Finish(Reply::text(ui::CHILD_NOT_FOUND));
    };

    match cfg.engine.visible_child(child_id).await {
        Ok(child) => {
            flow.child_id = Some(child.id);
            flow.child_name = Some(child.name.clone());
            flow.state = AddLessonState::Date;
            Step::Advance(ui::lesson_date_prompt(&child.name, today_kyiv()))
        }
        Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
    }
}

fn enter_date(flow: &mut AddLessonFlow, input: FlowInput<'_>) -> Step {
    let raw = match input {
        FlowInput::Text(text) => text,
        FlowInput::Choice(data) => match data.strip_prefix(callback::FLOW_DATE) {
            Some(date) => date,
            None => return Step::Stay(ui::lesson_date_error()),
        },
    };

    match parsing::parse_event_date(raw, today_kyiv()) {
        Ok(date) => {
            flow.date = Some(date);
            flow.state = AddLessonState::StartTime;
            Step::Advance(ui::start_time_prompt(date))
        }
        Err(_) => Step::Stay(ui::lesson_date_error()),
    }
}

fn enter_start_time(flow: &mut AddLessonFlow, input: FlowInput<'_>) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(ui::time_error());
    };
    match parsing::parse_clock(text) {
        Ok(start) => {
            flow.start_time = Some(start);
            flow.state = AddLessonState::EndTime;
            Step::Advance(ui::end_time_prompt(start))
        }
        Err(_) => Step::Stay(ui::time_error()),
    }
}

async fn enter_end_time(
    flow: &mut AddLessonFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    let raw = match input {
        FlowInput::Text(text) => text,
        FlowInput::Choice(data) => match data.strip_prefix(callback::FLOW_END) {
            Some(time) => time,
            None => return Step::Stay(ui::time_error()),
        },
    };
    let Ok(end) = parsing::parse_clock(raw) else {
        return Step::Stay(ui::time_error());
    };

    let (Some(child_id), Some(child_name), Some(date), Some(start)) = (
        flow.child_id,
        flow.child_name.clone(),
        flow.date,
        flow.start_time,
    ) else {
        return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
    };
    if end <= start {
        return Step::Stay(ui::end_not_after_start_error());
    }

    match cfg
        .engine
        .add_lesson(operator, child_id, date, start, end)
        .await
    {
        Ok(lesson) => {
            tracing::info!(
                operator = %operator,
                child = %child_id,
                lesson = %lesson.id,
                %date,
                "lesson scheduled"
            );
            flow.end_time = Some(end);
            flow.state = AddLessonState::AskRepeat;
            Step::Advance(ui::lesson_saved_ask_repeat(&child_name, date, start, end))
        }
        Err(EngineError::EndNotAfterStart) => Step::Stay(ui::end_not_after_start_error()),
        Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
    }
}

fn ask_repeat(flow: &mut AddLessonFlow, input: FlowInput<'_>) -> Step {
    match input.choice() {
        Some(callback::FLOW_REPEAT_NO) => {
            let (Some(name), Some(date), Some(start), Some(end)) = (
                flow.child_name.clone(),
                flow.date,
                flow.start_time,
                flow.end_time,
            ) else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            Step::Finish(ui::lesson_saved_plain(&name, date, start, end))
        }
        Some(callback::FLOW_REPEAT_YES) => {
            let (Some(name), Some(date), Some(start), Some(end)) = (
                flow.child_name.clone(),
                flow.date,
                flow.start_time,
                flow.end_time,
            ) else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            flow.candidates = recurrence_candidates(date);
            flow.state = AddLessonState::ConfirmRepeat;
            Step::Advance(ui::repeat_preview(&name, start, end, &flow.candidates))
        }
        _ => Step::Stay(ui::choose_with_buttons()),
    }
}

async fn confirm_repeat(
    flow: &mut AddLessonFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match input.choice() {
        Some(callback::FLOW_REPEAT_ABORT) => Step::Finish(Reply::text(ui::REPEAT_ABORTED)),
        Some(callback::FLOW_REPEAT_CONFIRM) => {
            let (Some(child_id), Some(start), Some(end)) =
                (flow.child_id, flow.start_time, flow.end_time)
            else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            let outcome = cfg
                .engine
                .schedule_recurring(operator, child_id, &flow.candidates, start, end, |date, err| {
                    tracing::error!(%date, %err, "failed to insert recurring lesson");
                })
                .await;
            tracing::info!(
                operator = %operator,
                child = %child_id,
                created = outcome.created,
                requested = outcome.requested,
                "auto-scheduled lessons"
            );
            Step::Finish(ui::repeat_result(outcome))
        }
        _ => Step::Stay(ui::choose_with_buttons()),
    }
}

// === Timetable ===

async fn day_lessons(
    cfg: &ConfigParameters,
    date: NaiveDate,
) -> Result<Vec<(Lesson, String)>, EngineError> {
    let lessons = cfg.engine.lessons_on(date).await?;
    let names = child_names(cfg).await?;
    Ok(lessons
        .into_iter()
        .map(|lesson| {
            let name = names
                .get(&lesson.child_id)
                .cloned()
                .unwrap_or_else(|| "Невідома дитина".to_string());
            (lesson, name)
        })
        .collect())
}

pub(crate) async fn timetable_today(cfg: &ConfigParameters) -> Reply {
    let today = today_kyiv();
    match day_lessons(cfg, today).await {
        Ok(lessons) => ui::timetable_day("Розклад на сьогодні", today, &lessons, true),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

async fn timetable_tomorrow(cfg: &ConfigParameters) -> Reply {
    let tomorrow = today_kyiv() + Days::new(1);
    match day_lessons(cfg, tomorrow).await {
        Ok(lessons) => ui::timetable_day("Розклад на завтра", tomorrow, &lessons, false),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

async fn timetable_week(cfg: &ConfigParameters) -> Reply {
    let today = today_kyiv();
    let mut days = Vec::new();
    for offset in 0..7 {
        let date = today + Days::new(offset);
        match day_lessons(cfg, date).await {
            Ok(lessons) => days.push((date, lessons)),
            Err(err) => return Reply::text(user_message_for_engine_error(&err)),
        }
    }
    ui::timetable_week(&days)
}

/// Routes `tt:*` callbacks; `None` means the payload belongs elsewhere.
pub(crate) async fn handle_timetable_callback(
    data: &str,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Option<Reply> {
    if data == callback::TT_TOMORROW {
        return Some(timetable_tomorrow(cfg).await);
    }
    if data == callback::TT_WEEK {
        return Some(timetable_week(cfg).await);
    }

    let toggle: Option<(&str, bool, bool)> = data
        .strip_prefix(callback::TT_DONE)
        .map(|id| (id, true, true))
        .or_else(|| data.strip_prefix(callback::TT_UNDONE).map(|id| (id, true, false)))
        .or_else(|| data.strip_prefix(callback::TT_CANCEL).map(|id| (id, false, true)))
        .or_else(|| data.strip_prefix(callback::TT_RESTORE).map(|id| (id, false, false)));
    let (raw_id, is_completed_flag, value) = toggle?;

    let Ok(lesson_id) = raw_id.parse::<LessonId>() else {
        return Some(Reply::text(ui::CHILD_NOT_FOUND));
    };
    let result = if is_completed_flag {
        cfg.engine.set_lesson_completed(lesson_id, value).await
    } else {
        cfg.engine.set_lesson_cancelled(lesson_id, value).await
    };
    match result {
        Ok(lesson) => {
            tracing::info!(
                operator = %operator,
                lesson = %lesson.id,
                completed = lesson.completed,
                cancelled = lesson.cancelled,
                "lesson flags updated"
            );
            Some(timetable_today(cfg).await)
        }
        Err(err) => Some(Reply::text(user_message_for_engine_error(&err))),
    }
}

#[cfg(test)]
mod tests {
    use engine::{Engine, Money, Store};

    use crate::access::AccessPolicy;
    use crate::state::SessionStore;

    use super::*;

    const OPERATOR: OperatorId = OperatorId::new(7);

    fn test_cfg() -> ConfigParameters {
        let policy = AccessPolicy::new(vec![], vec![OPERATOR]);
        let engine = Engine::builder()
            .store(Store::in_memory())
            .allowed_operators(policy.operators())
            .build();
        ConfigParameters {
            policy,
            engine,
            sessions: SessionStore::default(),
        }
    }

    async fn flow_with_child(cfg: &ConfigParameters) -> (AddLessonFlow, engine::Child) {
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();
        let mut flow = AddLessonFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        let step = step(&mut flow, FlowInput::Choice(&choice), OPERATOR, cfg).await;
        assert!(matches!(step, Step::Advance(_)));
        (flow, child)
    }

    #[tokio::test]
    async fn full_flow_creates_lesson() {
        let cfg = test_cfg();
        let (mut flow, child) = flow_with_child(&cfg).await;

        let result = step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        let result = step(&mut flow, FlowInput::Text("10:00"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        let result = step(&mut flow, FlowInput::Text("11:00"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        assert_eq!(flow.state, AddLessonState::AskRepeat);

        let result = step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_REPEAT_NO),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(result.is_finish());

        let lessons = cfg.engine.lessons_for_child(child.id).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].start_time.to_string(), "10:00");
    }

    #[tokio::test]
    async fn malformed_input_re_prompts_without_advancing() {
        let cfg = test_cfg();
        let (mut flow, _) = flow_with_child(&cfg).await;

        let result = step(&mut flow, FlowInput::Text("not a date"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));
        assert_eq!(flow.state, AddLessonState::Date);
        assert!(flow.date.is_none());

        step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        let result = step(&mut flow, FlowInput::Text("99:99"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));
        assert_eq!(flow.state, AddLessonState::StartTime);
    }

    #[tokio::test]
    async fn end_time_must_be_after_start() {
        let cfg = test_cfg();
        let (mut flow, child) = flow_with_child(&cfg).await;
        step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        step(&mut flow, FlowInput::Text("10:00"), OPERATOR, &cfg).await;

        let result = step(&mut flow, FlowInput::Text("10:00"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));
        assert_eq!(flow.state, AddLessonState::EndTime);
        assert!(cfg.engine.lessons_for_child(child.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quick_pick_end_time_matches_manual_entry() {
        let cfg = test_cfg();
        let (mut flow, child) = flow_with_child(&cfg).await;
        step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        step(&mut flow, FlowInput::Text("10:00"), OPERATOR, &cfg).await;

        let choice = format!("{}10:30", callback::FLOW_END);
        let result = step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));

        let lessons = cfg.engine.lessons_for_child(child.id).await.unwrap();
        assert_eq!(lessons[0].end_time.to_string(), "10:30");
    }

    #[tokio::test]
    async fn foreign_child_id_terminates_flow() {
        let cfg = test_cfg();
        cfg.engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();
        let mut flow = AddLessonFlow::new();

        let choice = format!("{}{}", callback::FLOW_CHILD, engine::ChildId::new());
        let result = step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;
        assert!(result.is_finish());
    }

    #[tokio::test]
    async fn recurrence_confirm_inserts_four_more() {
        let cfg = test_cfg();
        let (mut flow, child) = flow_with_child(&cfg).await;
        step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        step(&mut flow, FlowInput::Text("10:00"), OPERATOR, &cfg).await;
        step(&mut flow, FlowInput::Text("11:00"), OPERATOR, &cfg).await;

        let result = step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_REPEAT_YES),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(matches!(result, Step::Advance(_)));
        assert_eq!(flow.candidates.len(), 4);

        let result = step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_REPEAT_CONFIRM),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(result.is_finish());

        let lessons = cfg.engine.lessons_for_child(child.id).await.unwrap();
        assert_eq!(lessons.len(), 5);
    }
}
