//! The two payment entry flows.
//!
//! Amount-first derives the lesson count from the child's unit price and
//! refuses amounts that are not exact multiples. Count-first suggests an
//! amount but accepts any positive one, then asks for the payment date.

use engine::OperatorId;

use crate::{
    ConfigParameters,
    flow::{FlowInput, Reply, Step},
    handlers::{today_kyiv, user_message_for_engine_error},
    parsing,
    state::{
        ActiveFlow, PayByAmountFlow, PayByAmountState, PayByCountFlow, PayByCountState,
    },
    ui::{self, callback},
};

// === Amount-first (/payment) ===

pub(crate) async fn start_amount_first(cfg: &ConfigParameters) -> (Option<ActiveFlow>, Reply) {
    let children = match cfg.engine.children().await {
        Ok(children) => children,
        Err(err) => return (None, Reply::text(user_message_for_engine_error(&err))),
    };
    if children.is_empty() {
        return (None, Reply::text(ui::NO_CHILDREN));
    }
    (
        Some(ActiveFlow::PayByAmount(PayByAmountFlow::new())),
        ui::payment_child_prompt(&children),
    )
}

pub(crate) async fn amount_first_step(
    flow: &mut PayByAmountFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match flow.state {
        PayByAmountState::SelectChild => amount_select_child(flow, input, cfg).await,
        PayByAmountState::Amount => enter_amount(flow, input),
        PayByAmountState::Confirm => confirm_amount_payment(flow, input, operator, cfg).await,
    }
}

async fn amount_select_child(
    flow: &mut PayByAmountFlow,
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

    let child = match cfg.engine.visible_child(child_id).await {
        Ok(child) => child,
        Err(err) => return Step::Finish(Reply::text(user_message_for_engine_error(&err))),
    };
    // Amount-first entry cannot work without a price to divide by.
    if !child.has_price() {
        return Step::Finish(ui::price_not_set(&child.name));
    }

    flow.child_id = Some(child.id);
    flow.child_name = Some(child.name.clone());
    flow.unit_price = Some(child.unit_price);
    flow.state = PayByAmountState::Amount;
    Step::Advance(ui::amount_prompt(&child.name, child.unit_price))
}

fn enter_amount(flow: &mut PayByAmountFlow, input: FlowInput<'_>) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(ui::amount_error());
    };
    let Ok(amount) = parsing::parse_amount(text) else {
        return Step::Stay(ui::amount_error());
    };
    let (Some(unit_price), Some(child_name)) = (flow.unit_price, flow.child_name.clone()) else {
        return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
    };

    // Never round: an inexact quotient re-prompts with the granularity.
    let lessons_count = (unit_price.is_positive()
        && amount.kopiikas() % unit_price.kopiikas() == 0)
        .then(|| amount.kopiikas() / unit_price.kopiikas());
    let Some(lessons_count) = lessons_count.and_then(|c| u32::try_from(c).ok()) else {
        let approx = amount.kopiikas() as f64 / unit_price.kopiikas() as f64;
        return Step::Stay(ui::amount_not_multiple(amount, unit_price, approx));
    };

    flow.amount = Some(amount);
    flow.lessons_count = Some(lessons_count);
    flow.state = PayByAmountState::Confirm;
    Step::Advance(ui::payment_confirm(&child_name, amount, lessons_count))
}

async fn confirm_amount_payment(
    flow: &mut PayByAmountFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match input.choice() {
        Some(callback::FLOW_CONFIRM_NO) => {
            Step::Finish(Reply::text("❌ Внесення оплати скасовано."))
        }
        Some(callback::FLOW_CONFIRM_YES) => {
            let (Some(child_id), Some(child_name), Some(amount), Some(lessons_count)) = (
                flow.child_id,
                flow.child_name.clone(),
                flow.amount,
                flow.lessons_count,
            ) else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            let payment_date = today_kyiv();
            match cfg
                .engine
                .add_payment(operator, child_id, amount, lessons_count, payment_date, None)
                .await
            {
                Ok(payment) => {
                    tracing::info!(
                        operator = %operator,
                        child = %child_id,
                        payment = %payment.id,
                        %amount,
                        lessons_count,
                        "payment recorded"
                    );
                    Step::Finish(ui::payment_saved(
                        &child_name,
                        amount,
                        lessons_count,
                        payment_date,
                    ))
                }
                Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
            }
        }
        _ => Step::Stay(ui::choose_with_buttons()),
    }
}

// === Count-first (/addpayment) ===

pub(crate) async fn start_count_first(cfg: &ConfigParameters) -> (Option<ActiveFlow>, Reply) {
    let children = match cfg.engine.children().await {
        Ok(children) => children,
        Err(err) => return (None, Reply::text(user_message_for_engine_error(&err))),
    };
    if children.is_empty() {
        return (None, Reply::text(ui::NO_CHILDREN));
    }
    (
        Some(ActiveFlow::PayByCount(PayByCountFlow::new())),
        ui::count_child_prompt(&children),
    )
}

pub(crate) async fn count_first_step(
    flow: &mut PayByCountFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match flow.state {
        PayByCountState::SelectChild => count_select_child(flow, input, cfg).await,
        PayByCountState::Count => enter_count(flow, input),
        PayByCountState::Amount => enter_free_amount(flow, input),
        PayByCountState::Date => enter_payment_date(flow, input),
        PayByCountState::Confirm => confirm_count_payment(flow, input, operator, cfg).await,
    }
}

async fn count_select_child(
    flow: &mut PayByCountFlow,
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
            flow.unit_price = Some(child.unit_price);
            flow.state = PayByCountState::Count;
            Step::Advance(ui::count_prompt(&child.name, child.unit_price))
        }
        Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
    }
}

fn enter_count(flow: &mut PayByCountFlow, input: FlowInput<'_>) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(ui::count_error());
    };
    let Ok(count) = parsing::parse_lessons_count(text) else {
        return Step::Stay(ui::count_error());
    };
    let Some(unit_price) = flow.unit_price else {
        return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
    };

    flow.lessons_count = Some(count);
    flow.state = PayByCountState::Amount;
    Step::Advance(ui::suggested_amount_prompt(count, unit_price))
}

fn enter_free_amount(flow: &mut PayByCountFlow, input: FlowInput<'_>) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(ui::amount_error());
    };
    // The suggestion is advisory: any positive amount is accepted here.
    let Ok(amount) = parsing::parse_amount(text) else {
        return Step::Stay(ui::amount_error());
    };

    flow.amount = Some(amount);
    flow.state = PayByCountState::Date;
    Step::Advance(ui::payment_date_prompt(amount))
}

fn enter_payment_date(flow: &mut PayByCountFlow, input: FlowInput<'_>) -> Step {
    let Some(text) = input.text() else {
        return Step::Stay(ui::lesson_date_error());
    };
    let Ok(date) = parsing::parse_event_date(text, today_kyiv()) else {
        return Step::Stay(ui::lesson_date_error());
    };
    let (Some(child_name), Some(amount), Some(count)) = (
        flow.child_name.clone(),
        flow.amount,
        flow.lessons_count,
    ) else {
        return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
    };

    flow.payment_date = Some(date);
    flow.state = PayByCountState::Confirm;
    let mut reply = ui::payment_confirm(&child_name, amount, count);
    reply.text = format!("{}\nДата оплати: {}", reply.text, ui::display_date(date));
    Step::Advance(reply)
}

async fn confirm_count_payment(
    flow: &mut PayByCountFlow,
    input: FlowInput<'_>,
    operator: OperatorId,
    cfg: &ConfigParameters,
) -> Step {
    match input.choice() {
        Some(callback::FLOW_CONFIRM_NO) => {
            Step::Finish(Reply::text("❌ Додавання оплати скасовано."))
        }
        Some(callback::FLOW_CONFIRM_YES) => {
            let (Some(child_id), Some(child_name), Some(amount), Some(count), Some(date)) = (
                flow.child_id,
                flow.child_name.clone(),
                flow.amount,
                flow.lessons_count,
                flow.payment_date,
            ) else {
                return Step::Finish(Reply::text(ui::STORAGE_FAILURE));
            };
            match cfg
                .engine
                .add_payment(operator, child_id, amount, count, date, None)
                .await
            {
                Ok(payment) => {
                    tracing::info!(
                        operator = %operator,
                        child = %child_id,
                        payment = %payment.id,
                        %amount,
                        lessons_count = count,
                        "payment recorded"
                    );
                    Step::Finish(ui::payment_saved(&child_name, amount, count, date))
                }
                Err(err) => Step::Finish(Reply::text(user_message_for_engine_error(&err))),
            }
        }
        _ => Step::Stay(ui::choose_with_buttons()),
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

    async fn add_child(cfg: &ConfigParameters, price: i64) -> engine::Child {
        cfg.engine
            .add_child(OPERATOR, "Антон", 7, Money::from_major(price))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn amount_first_accepts_exact_multiple() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 300).await;

        let mut flow = PayByAmountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        amount_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;

        let result =
            amount_first_step(&mut flow, FlowInput::Text("1500"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        assert_eq!(flow.lessons_count, Some(5));

        let result = amount_first_step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_CONFIRM_YES),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(result.is_finish());

        let payments = cfg.engine.payments_for_child(child.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Money::from_major(1500));
        assert_eq!(payments[0].lessons_count, 5);
    }

    #[tokio::test]
    async fn amount_first_rejects_inexact_amount() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 300).await;

        let mut flow = PayByAmountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        amount_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;

        let result =
            amount_first_step(&mut flow, FlowInput::Text("1600"), OPERATOR, &cfg).await;
        let Step::Stay(reply) = result else {
            panic!("expected re-prompt");
        };
        assert!(reply.text.contains("5.33"));
        assert_eq!(flow.state, PayByAmountState::Amount);
        assert!(flow.amount.is_none());
        assert!(cfg.engine.payments_for_child(child.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn amount_first_blocks_child_without_price() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 0).await;

        let mut flow = PayByAmountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        let result =
            amount_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;
        assert!(result.is_finish());
        assert!(result.reply().text.contains("не встановлена базова ціна"));
    }

    #[tokio::test]
    async fn count_first_allows_any_positive_amount() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 300).await;

        let mut flow = PayByCountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        count_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;

        let result = count_first_step(&mut flow, FlowInput::Text("3"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        // Suggestion is 900, but an arbitrary positive amount passes.
        assert!(result.reply().text.contains("900"));
        let result = count_first_step(&mut flow, FlowInput::Text("850"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));
        let result =
            count_first_step(&mut flow, FlowInput::Text("14.11.2030"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Advance(_)));

        let result = count_first_step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_CONFIRM_YES),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(result.is_finish());

        let payments = cfg.engine.payments_for_child(child.id).await.unwrap();
        assert_eq!(payments[0].amount, Money::from_major(850));
        assert_eq!(payments[0].lessons_count, 3);
        assert_eq!(
            payments[0].payment_date,
            chrono::NaiveDate::from_ymd_opt(2030, 11, 14).unwrap()
        );
    }

    #[tokio::test]
    async fn count_first_rejects_bad_count_and_amount() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 300).await;

        let mut flow = PayByCountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        count_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;

        for bad in ["0", "-1", "п'ять", "2.5"] {
            let result = count_first_step(&mut flow, FlowInput::Text(bad), OPERATOR, &cfg).await;
            assert!(matches!(result, Step::Stay(_)), "{bad}");
            assert_eq!(flow.state, PayByCountState::Count);
        }

        count_first_step(&mut flow, FlowInput::Text("2"), OPERATOR, &cfg).await;
        let result = count_first_step(&mut flow, FlowInput::Text("0"), OPERATOR, &cfg).await;
        assert!(matches!(result, Step::Stay(_)));
        assert_eq!(flow.state, PayByCountState::Amount);
    }

    #[tokio::test]
    async fn declining_confirm_saves_nothing() {
        let cfg = test_cfg();
        let child = add_child(&cfg, 300).await;

        let mut flow = PayByAmountFlow::new();
        let choice = format!("{}{}", callback::FLOW_CHILD, child.id);
        amount_first_step(&mut flow, FlowInput::Choice(&choice), OPERATOR, &cfg).await;
        amount_first_step(&mut flow, FlowInput::Text("600"), OPERATOR, &cfg).await;

        let result = amount_first_step(
            &mut flow,
            FlowInput::Choice(callback::FLOW_CONFIRM_NO),
            OPERATOR,
            &cfg,
        )
        .await;
        assert!(result.is_finish());
        assert!(cfg.engine.payments_for_child(child.id).await.unwrap().is_empty());
    }
}
