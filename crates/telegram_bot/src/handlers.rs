//! Update dispatch: access gating, command routing, and the flow driver.

use std::collections::HashMap;

use chrono::NaiveDate;
use chrono_tz::Europe::Kyiv;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, MessageId},
    utils::command::BotCommands,
};

use engine::{ChildId, EngineError, OperatorId, OperatorProfile};

use crate::{
    ConfigParameters,
    commands::Command,
    flow::{FlowInput, Reply, Step},
    state::{ActiveFlow, ChildField},
    ui::{self, callback},
};

mod children;
mod lessons;
mod payments;
mod reports;

pub(crate) fn today_kyiv() -> NaiveDate {
    chrono::Utc::now().with_timezone(&Kyiv).date_naive()
}

/// Maps engine errors to operator-facing Ukrainian messages. Detail stays in
/// the logs.
pub(crate) fn user_message_for_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::Validation(_) => "❌ Некоректні дані. Спробуйте ще раз.".to_string(),
        EngineError::NotFound(_) => ui::CHILD_NOT_FOUND.to_string(),
        EngineError::EndNotAfterStart => {
            "❌ Час закінчення має бути пізніше часу початку.".to_string()
        }
        EngineError::PriceNotSet => {
            "❌ Базова ціна не встановлена.\nВстановіть ціну через /settings".to_string()
        }
        EngineError::NotMultipleOfPrice {
            amount,
            unit_price,
            approx,
        } => ui::amount_not_multiple(*amount, *unit_price, *approx).text,
        EngineError::ChildInUse { lessons, payments } => ui::delete_refused(engine::ChildUsage {
            lessons: *lessons,
            payments: *payments,
        }),
        EngineError::Storage(err) => {
            tracing::error!(%err, "store operation failed");
            ui::STORAGE_FAILURE.to_string()
        }
    }
}

/// Names of every child, archived included, for rendering lessons whose
/// child left the default listing.
pub(crate) async fn child_names(
    cfg: &ConfigParameters,
) -> Result<HashMap<ChildId, String>, EngineError> {
    let mut names = HashMap::new();
    for child in cfg.engine.children().await? {
        names.insert(child.id, child.name);
    }
    for child in cfg.engine.archived_children().await? {
        names.insert(child.id, child.name);
    }
    Ok(names)
}

/// The guard composed at the front of every handling pipeline. Unauthorized
/// attempts get one fixed denial and a warning log, nothing else.
async fn ensure_allowed(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    operator: OperatorId,
) -> ResponseResult<bool> {
    if cfg.policy.is_allowed(operator) {
        return Ok(true);
    }
    tracing::warn!(operator = %operator, "unauthorized access attempt");
    bot.send_message(chat_id, ui::ACCESS_DENIED).await?;
    Ok(false)
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    match reply.keyboard {
        Some(keyboard) => {
            bot.send_message(chat_id, reply.text)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, reply.text).await?;
        }
    }
    Ok(())
}

/// Edits the message a button lives on when possible, otherwise sends a new
/// one (the original may be too old to edit).
async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    reply: Reply,
) -> ResponseResult<()> {
    if let Some(message_id) = message_id {
        let edited = match reply.keyboard.clone() {
            Some(keyboard) => {
                bot.edit_message_text(chat_id, message_id, reply.text.clone())
                    .reply_markup(keyboard)
                    .await
            }
            None => {
                bot.edit_message_text(chat_id, message_id, reply.text.clone())
                    .await
            }
        };
        if edited.is_ok() {
            return Ok(());
        }
    }
    send_reply(bot, chat_id, reply).await
}

pub(crate) async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let operator = OperatorId::new(from.id.0);
    let chat_id = msg.chat.id;
    if !ensure_allowed(&bot, chat_id, &cfg, operator).await? {
        return Ok(());
    }

    match cmd {
        Command::Start => {
            let profile = OperatorProfile::new(
                operator,
                from.username.clone(),
                Some(from.first_name.clone()),
            );
            if let Err(err) = cfg.engine.upsert_operator(profile).await {
                tracing::error!(%err, "failed to store operator profile");
            }
            bot.send_message(chat_id, ui::welcome(&from.first_name))
                .await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
        }
        Command::Cancel => {
            let had_flow = cfg.sessions.get(operator).await.flow.is_some();
            cfg.sessions.clear(operator).await;
            let text = if had_flow {
                ui::FLOW_CANCELLED
            } else {
                ui::NOTHING_TO_CANCEL
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::Settings => {
            send_reply(&bot, chat_id, ui::settings_menu()).await?;
        }
        Command::AddLesson => {
            begin_flow(&bot, chat_id, operator, &cfg, lessons::start(&cfg).await).await?;
        }
        Command::Payment => {
            begin_flow(
                &bot,
                chat_id,
                operator,
                &cfg,
                payments::start_amount_first(&cfg).await,
            )
            .await?;
        }
        Command::AddPayment => {
            begin_flow(
                &bot,
                chat_id,
                operator,
                &cfg,
                payments::start_count_first(&cfg).await,
            )
            .await?;
        }
        Command::Timetable => {
            send_reply(&bot, chat_id, lessons::timetable_today(&cfg).await).await?;
        }
        Command::Balance => {
            send_reply(&bot, chat_id, reports::balance_overview(&cfg).await).await?;
        }
        Command::Dashboard => {
            send_reply(&bot, chat_id, reports::dashboard(&cfg).await).await?;
        }
    }

    Ok(())
}

/// Stores the entry state (replacing any flow in progress) and sends the
/// first prompt. Entry points that refuse to start return no flow.
async fn begin_flow(
    bot: &Bot,
    chat_id: ChatId,
    operator: OperatorId,
    cfg: &ConfigParameters,
    entry: (Option<ActiveFlow>, Reply),
) -> ResponseResult<()> {
    let (flow, reply) = entry;
    match flow {
        Some(flow) => cfg.sessions.begin(operator, flow).await,
        None => cfg.sessions.clear(operator).await,
    }
    send_reply(bot, chat_id, reply).await
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let operator = OperatorId::new(from.id.0);
    let chat_id = msg.chat.id;
    if !ensure_allowed(&bot, chat_id, &cfg, operator).await? {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if drive_flow(&bot, chat_id, None, operator, &cfg, FlowInput::Text(text)).await? {
        return Ok(());
    }

    bot.send_message(chat_id, ui::UNKNOWN_TEXT_HINT).await?;
    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let operator = OperatorId::new(q.from.id.0);
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    if !ensure_allowed(&bot, chat_id, &cfg, operator).await? {
        return Ok(());
    }

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    // The cancel signal wins over every other match, from any state.
    if data == callback::FLOW_CANCEL {
        let had_flow = cfg.sessions.get(operator).await.flow.is_some();
        cfg.sessions.clear(operator).await;
        let text = if had_flow {
            ui::FLOW_CANCELLED
        } else {
            ui::NOTHING_TO_CANCEL
        };
        edit_or_send(&bot, chat_id, Some(message_id), Reply::text(text)).await?;
        return Ok(());
    }

    if data.starts_with("flow:") {
        if drive_flow(
            &bot,
            chat_id,
            Some(message_id),
            operator,
            &cfg,
            FlowInput::Choice(data),
        )
        .await?
        {
            return Ok(());
        }
        // A button from a flow that already ended; nothing to resume.
        edit_or_send(
            &bot,
            chat_id,
            Some(message_id),
            Reply::text(ui::NOTHING_TO_CANCEL),
        )
        .await?;
        return Ok(());
    }

    // Flow entry points living on settings screens.
    if data == callback::SETTINGS_ADD {
        let (flow, reply) = children::start_add_child();
        cfg.sessions.begin(operator, flow).await;
        edit_or_send(&bot, chat_id, Some(message_id), reply).await?;
        return Ok(());
    }
    let edit_entry = [
        (callback::CHILD_EDIT_NAME, ChildField::Name),
        (callback::CHILD_EDIT_AGE, ChildField::Age),
        (callback::CHILD_EDIT_PRICE, ChildField::Price),
    ]
    .into_iter()
    .find_map(|(prefix, field)| data.strip_prefix(prefix).map(|raw| (raw, field)));
    if let Some((raw_id, field)) = edit_entry {
        let (flow, reply) = children::start_edit_child(&cfg, raw_id, field).await;
        match flow {
            Some(flow) => cfg.sessions.begin(operator, flow).await,
            None => cfg.sessions.clear(operator).await,
        }
        edit_or_send(&bot, chat_id, Some(message_id), reply).await?;
        return Ok(());
    }

    if let Some(reply) = children::handle_callback(data, operator, &cfg).await {
        edit_or_send(&bot, chat_id, Some(message_id), reply).await?;
        return Ok(());
    }
    if let Some(reply) = lessons::handle_timetable_callback(data, operator, &cfg).await {
        edit_or_send(&bot, chat_id, Some(message_id), reply).await?;
        return Ok(());
    }
    if let Some(reply) = reports::handle_callback(data, &cfg).await {
        edit_or_send(&bot, chat_id, Some(message_id), reply).await?;
        return Ok(());
    }

    tracing::warn!(data, "unhandled callback payload");
    Ok(())
}

/// Feeds one input into the operator's active flow, if any. Returns whether
/// the input was consumed.
async fn drive_flow(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    operator: OperatorId,
    cfg: &ConfigParameters,
    input: FlowInput<'_>,
) -> ResponseResult<bool> {
    let Some(mut flow) = cfg.sessions.get(operator).await.flow else {
        return Ok(false);
    };

    let step = match &mut flow {
        ActiveFlow::AddLesson(f) => lessons::step(f, input, operator, cfg).await,
        ActiveFlow::PayByAmount(f) => payments::amount_first_step(f, input, operator, cfg).await,
        ActiveFlow::PayByCount(f) => payments::count_first_step(f, input, operator, cfg).await,
        ActiveFlow::AddChild(f) => children::add_child_step(f, input, operator, cfg).await,
        ActiveFlow::EditChild(f) => children::edit_child_step(f, input, operator, cfg).await,
    };

    let (reply, finished) = match step {
        Step::Stay(reply) | Step::Advance(reply) => (reply, false),
        Step::Finish(reply) => (reply, true),
    };

    if finished {
        cfg.sessions.clear(operator).await;
    } else {
        cfg.sessions
            .update(operator, |session| session.flow = Some(flow))
            .await;
    }

    edit_or_send(bot, chat_id, message_id, reply).await?;
    Ok(true)
}
