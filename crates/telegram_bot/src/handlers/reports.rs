//! Balance and monthly dashboard views.

use chrono::Datelike;

use engine::ChildId;

use crate::{
    ConfigParameters,
    flow::Reply,
    handlers::{today_kyiv, user_message_for_engine_error},
    ui::{self, callback},
};

pub(crate) async fn balance_overview(cfg: &ConfigParameters) -> Reply {
    match cfg.engine.child_balances().await {
        Ok(balances) => ui::balance_overview(&balances),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

async fn child_statement(cfg: &ConfigParameters, child_id: ChildId) -> Reply {
    match cfg.engine.child_statement(child_id).await {
        Ok(statement) => ui::child_statement(&statement),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

pub(crate) async fn dashboard(cfg: &ConfigParameters) -> Reply {
    match cfg.engine.monthly_report(today_kyiv()).await {
        Ok(report) => ui::dashboard(&report),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

/// Routes `bal:*` and `dash:*` callbacks; `None` means the payload belongs
/// elsewhere.
pub(crate) async fn handle_callback(data: &str, cfg: &ConfigParameters) -> Option<Reply> {
    if data == callback::BAL_BACK {
        return Some(balance_overview(cfg).await);
    }
    if let Some(raw) = data.strip_prefix(callback::BAL_CHILD) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        return Some(child_statement(cfg, child_id).await);
    }

    if data == callback::DASH_BACK {
        return Some(dashboard(cfg).await);
    }
    if data == callback::DASH_DAYS {
        let today = today_kyiv();
        return Some(match cfg.engine.income_by_day(today).await {
            Ok(rows) => ui::income_by_day(today.month(), &rows),
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }
    if data == callback::DASH_CHILDREN {
        let today = today_kyiv();
        return Some(match cfg.engine.income_by_child(today).await {
            Ok(rows) => ui::income_by_child(today.month(), &rows),
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use engine::{Engine, Money, OperatorId, Store};

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

    #[tokio::test]
    async fn settled_children_are_hidden_from_overview() {
        let cfg = test_cfg();
        cfg.engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();

        let reply = balance_overview(&cfg).await;
        assert!(reply.text.contains("рівний нулю"));
    }

    #[tokio::test]
    async fn debt_shows_up_in_overview_and_statement() {
        let cfg = test_cfg();
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();
        let lesson = cfg
            .engine
            .add_lesson(
                OPERATOR,
                child.id,
                chrono::NaiveDate::from_ymd_opt(2030, 11, 14).unwrap(),
                "10:00".parse().unwrap(),
                "11:00".parse().unwrap(),
            )
            .await
            .unwrap();
        cfg.engine.set_lesson_completed(lesson.id, true).await.unwrap();

        let reply = balance_overview(&cfg).await;
        assert!(reply.text.contains("Недоплата"));

        let data = format!("{}{}", callback::BAL_CHILD, child.id);
        let reply = handle_callback(&data, &cfg).await.unwrap();
        assert!(reply.text.contains("Недоплата: -1 занять"));
        assert!(reply.text.contains("Немає оплат"));
        assert!(reply.text.contains("Проведено занять: 1"));
    }
}
