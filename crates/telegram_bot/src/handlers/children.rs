//! Settings screens: the child registry, its archive, and the add/edit
//! flows.

use engine::{ChildId, EngineError, OperatorId};

use crate::{
    ConfigParameters,
    flow::{FlowInput, Reply, Step},
    handlers::user_message_for_engine_error,
    parsing,
    state::{ActiveFlow, AddChildFlow, AddChildState, ChildField, EditChildFlow},
    ui::{self, callback},
};

async fn children_list(cfg: &ConfigParameters, status: Option<&str>) -> Reply {
    match cfg.engine.children().await {
        Ok(children) => ui::children_list(&children, status),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

async fn archive_view(cfg: &ConfigParameters, status: Option<&str>) -> Reply {
    match cfg.engine.archived_children().await {
        Ok(children) => ui::archive_view(&children, status),
        Err(err) => Reply::text(user_message_for_engine_error(&err)),
    }
}

/// Routes `settings:*` and `child:*` view callbacks; `None` means the
/// payload belongs elsewhere. Flow entry points (`settings:add`,
/// `child:edit_*`) are handled by the dispatcher, not here.
pub(crate) async fn handle_callback(
    data: &str,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Option<Reply> {
    if data == callback::SETTINGS_MENU {
        return Some(ui::settings_menu());
    }
    if data == callback::SETTINGS_LIST {
        return Some(children_list(cfg, None).await);
    }
    if data == callback::SETTINGS_ARCHIVE {
        return Some(archive_view(cfg, None).await);
    }

    if data == callback::CHILD_PICK_EDIT {
        let children = match cfg.engine.children().await {
            Ok(children) => children,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        return Some(ui::pick_children(
            "✏️ Оберіть дитину для редагування:",
            &children,
            callback::CHILD_EDIT_MENU,
            callback::SETTINGS_LIST,
        ));
    }
    if data == callback::CHILD_PICK_ARCHIVE {
        let children = match cfg.engine.children().await {
            Ok(children) => children,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        return Some(ui::pick_children(
            "📦 Оберіть дитину для архівування:",
            &children,
            callback::CHILD_ARCHIVE,
            callback::SETTINGS_LIST,
        ));
    }
    if data == callback::CHILD_PICK_UNARCHIVE {
        let children = match cfg.engine.archived_children().await {
            Ok(children) => children,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        return Some(ui::pick_children(
            "🔓 Оберіть дитину для розархівування:",
            &children,
            callback::CHILD_UNARCHIVE,
            callback::SETTINGS_ARCHIVE,
        ));
    }
    if data == callback::CHILD_PICK_DELETE {
        let children = match cfg.engine.archived_children().await {
            Ok(children) => children,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        return Some(ui::pick_children(
            "🗑️ Оберіть дитину для видалення:",
            &children,
            callback::CHILD_DELETE_ASK,
            callback::SETTINGS_ARCHIVE,
        ));
    }

    if let Some(raw) = data.strip_prefix(callback::CHILD_EDIT_MENU) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        return Some(match cfg.engine.child(child_id).await {
            Ok(child) => ui::child_edit_menu(&child),
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }

    if let Some(raw) = data.strip_prefix(callback::CHILD_ARCHIVE) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        return Some(match cfg.engine.archive_child(child_id).await {
            Ok(child) => {
                tracing::info!(operator = %operator, child = %child.id, "child archived");
                children_list(cfg, Some("📦 Дитину заархівовано")).await
            }
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }

    if let Some(raw) = data.strip_prefix(callback::CHILD_UNARCHIVE) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        return Some(match cfg.engine.unarchive_child(child_id).await {
            Ok(child) => {
                tracing::info!(operator = %operator, child = %child.id, "child unarchived");
                archive_view(cfg, Some("🔓 Дитину розархівовано")).await
            }
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }

    if let Some(raw) = data.strip_prefix(callback::CHILD_DELETE_ASK) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        let child = match cfg.engine.child(child_id).await {
            Ok(child) => child,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        let usage = match cfg.engine.child_usage(child_id).await {
            Ok(usage) => usage,
            Err(err) => return Some(Reply::text(user_message_for_engine_error(&err))),
        };
        if !usage.is_empty() {
            return Some(archive_view(cfg, Some(&ui::delete_refused(usage))).await);
        }
        return Some(ui::delete_confirm(&child));
    }

    if let Some(raw) = data.strip_prefix(callback::CHILD_DELETE) {
        let Ok(child_id) = raw.parse::<ChildId>() else {
            return Some(Reply::text(ui::CHILD_NOT_FOUND));
        };
        return Some(match cfg.engine.delete_child(child_id).await {
            Ok(()) => {
                tracing::info!(operator = %operator, child = %child_id, "child deleted");
                archive_view(cfg, Some("🗑️ Дитину видалено назавжди")).await
            }
            // The usage check runs again right before deletion; a record
            // added since the confirm screen still blocks it.
            Err(err @ EngineError::ChildInUse { .. }) => {
                archive_view(cfg, Some(&user_message_for_engine_error(&err))).await
            }
            Err(err) => Reply::text(user_message_for_engine_error(&err)),
        });
    }

    None
}

/// Entry point for the `settings:add` button.
pub(crate) fn start_add_child() -> (ActiveFlow, Reply) {
    (
        ActiveFlow::AddChild(AddChildFlow::new()),
        ui::add_child_name_prompt(),
    )
}

/// Entry point for the `child:edit_*` buttons.
pub(crate) async fn start_edit_child(
    cfg: &ConfigParameters,
    raw_id: &str,
    field: ChildField,
) -> (Option<ActiveFlow>, Reply) {
    let Ok(child_id) = raw_id.parse::<ChildId>() else {
        return (None, Reply::text(ui::CHILD_NOT_FOUND));
    };
    match cfg.engine.child(child_id).await {
        Ok(child) => (
            Some(ActiveFlow::EditChild(EditChildFlow { child_id, field })),
            ui::edit_field_prompt(&child, field),
        ),
        Err(err) => (None, Reply::text(user_message_for_engine_error(&err))),
    }
}

pub(crate) async fn add_child_step(
    flow: &mut AddChildFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(Reply::text(ui::CHILD_NAME_EMPTY));
    };

    match flow.state {
        AddChildState::Name => {
            let name = text.trim();
            if name.is_empty() {
                return Step::Stay(Reply::text(ui::CHILD_NAME_EMPTY));
            }
            flow.name = Some(name.to_string());
            flow.state = AddChildState::Age;
            Step::Advance(ui::add_child_age_prompt(name))
        }
        AddChildState::Age => match parsing::parse_age(text) {
            Ok(age) => {
                flow.age = Some(age);
                flow.state = AddChildState::Price;
                Step::Advance(ui::add_child_price_prompt(age))
            }
            Err(_) => Step::Stay(Reply::text(ui::CHILD_AGE_ERROR)),
        },
        AddChildState::Price => {
            let Ok(price) = parsing::parse_price(text) else {
                return Step::Stay(Reply::text(ui::CHILD_PRICE_ERROR));
            };
            let (Some(name), Some(age)) = (flow.name.clone(), flow.age) else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            match cfg.engine.add_child(operator, &name, age, price).await {
                Ok(child) => {
                    tracing::info!(
                        operator = %operator,
                        child = %child.id,
                        name = %child.name,
                        "child added"
                    );
                    Step::Finish(ui::child_added(&child))
                }
                Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
            }
        }
    }
}

pub(crate) async fn edit_child_step(
    flow: &mut EditChildFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(Reply::text(ui::CHILD_NAME_EMPTY));
    };

    let result = match flow.field {
        ChildField::Name => {
            let name = text.trim();
            if name.is_empty() {
                return Step::Stay(Reply::text(ui::CHILD_NAME_EMPTY));
            }
            cfg.engine
                .rename_child(flow.child_id, name)
                .await
                .map(|child| ("Ім'я", child.name.clone()))
        }
        ChildField::Age => {
            let Ok(age) = parsing::parse_age(text) else {
                return Step::Stay(Reply::text(ui::CHILD_AGE_ERROR));
            };
            cfg.engine
                .set_child_age(flow.child_id, age)
                .await
                .map(|child| ("Вік", child.age.to_string()))
        }
        ChildField::Price => {
            let Ok(price) = parsing::parse_price(text) else {
                return Step::Stay(Reply::text(ui::CHILD_PRICE_ERROR));
            };
            cfg.engine
                .set_child_unit_price(flow.child_id, price)
                .await
                .map(|child| ("Базову ціну", child.unit_price.to_string()))
        }
    };

    match result {
        Ok((what, value)) => {
            tracing::info!(
                operator = %operator,
                child = %flow.child_id,
                field = what,
                "child updated"
            );
            Step::Finish(ui::child_updated(what, &value))
        }
        Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
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

    #[tokio::test]
    async fn add_child_flow_validates_each_field() {
        let cfg = test_cfg();
        let mut flow = AddChildFlow::new();

        let result = add_child_step(&mut flow, FlowInput::Text("   "), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));

        add_child_step(&mut flow, FlowInput::Text("Антон"), OPERATOR, &cfg).await;
        let result = add_child_step(&mut flow, FlowInput::Text("25"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));
        assert_eq!(flow.state, AddChildState::Age);

        add_child_step(&mut flow, FlowInput::Text("7"), OPERATOR, &cfg).await;
        let result = add_child_step(&mut flow, FlowInput::Text("-5"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));

        let result = add_child_step(&mut flow, FlowInput::Text("300"), OPERATOR, &cfg).await;
        assert!(result.is_finish());

        let children = cfg.engine.children().await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Антон");
        assert_eq!(children[0].age, 7);
        assert_eq!(children[0].unit_price, Money::from_major(300));
    }

    #[tokio::test]
    async fn edit_child_flow_updates_one_field() {
        let cfg = test_cfg();
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();

        let mut flow = EditChildFlow {
            child_id: child.id,
            field: ChildField::Price,
        };
        let result = edit_child_step(&mut flow, FlowInput::Text("350"), OPERATOR, &cfg).await;
        assert!(result.is_finish());

        let updated = cfg.engine.child(child.id).await.unwrap();
        assert_eq!(updated.unit_price, Money::from_major(350));
        assert_eq!(updated.name, "Антон");
    }

    #[tokio::test]
    async fn delete_ask_refuses_child_in_use() {
        let cfg = test_cfg();
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();
        cfg.engine
            .add_lesson(
                OPERATOR,
                child.id,
                chrono::NaiveDate::from_ymd_opt(2030, 11, 14).unwrap(),
                "10:00".parse().unwrap(),
                "11:00".parse().unwrap(),
            )
            .await
            .unwrap();
        cfg.engine.archive_child(child.id).await.unwrap();

        let data = format!("{}{}", callback::CHILD_DELETE_ASK, child.id);
        let reply = handle_callback(&data, OPERATOR, &cfg).await.unwrap();
        assert!(reply.text.contains("Неможливо видалити"));
        // Child survives.
        assert_eq!(cfg.engine.archived_children().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_confirm_removes_unused_child() {
        let cfg = test_cfg();
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();
        cfg.engine.archive_child(child.id).await.unwrap();

        let ask = format!("{}{}", callback::CHILD_DELETE_ASK, child.id);
        let reply = handle_callback(&ask, OPERATOR, &cfg).await.unwrap();
        assert!(reply.text.contains("НАЗАВЖДИ"));

        let delete = format!("{}{}", callback::CHILD_DELETE, child.id);
        handle_callback(&delete, OPERATOR, &cfg).await.unwrap();
        assert!(cfg.engine.archived_children().await.unwrap().is_empty());
        assert!(cfg.engine.children().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_and_unarchive_round_trip() {
        let cfg = test_cfg();
        let child = cfg
            .engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(300))
            .await
            .unwrap();

        let archive = format!("{}{}", callback::CHILD_ARCHIVE, child.id);
        handle_callback(&archive, OPERATOR, &cfg).await.unwrap();
        assert!(cfg.engine.children().await.unwrap().is_empty());

        let unarchive = format!("{}{}", callback::CHILD_UNARCHIVE, child.id);
        handle_callback(&unarchive, OPERATOR, &cfg).await.unwrap();
        let children = cfg.engine.children().await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Антон");
    }
}
