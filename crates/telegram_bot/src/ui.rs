//! Message texts and inline keyboards.
//!
//! Everything user-visible is built here so the handlers stay orchestration
//! only. Texts are Ukrainian, matching the team that operates the bot.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use engine::{
    Child, ChildUsage, ClockTime, Lesson, Money, RecurrenceOutcome,
    ledger::{ChildBalance, ChildIncome, DayIncome, MonthlyReport},
    ChildStatement,
};

use crate::flow::Reply;

/// Callback payloads understood by the dispatcher.
pub(crate) mod callback {
    pub(crate) const FLOW_CANCEL: &str = "flow:cancel";
    pub(crate) const FLOW_CHILD: &str = "flow:child:";
    pub(crate) const FLOW_DATE: &str = "flow:date:";
    pub(crate) const FLOW_END: &str = "flow:end:";
    pub(crate) const FLOW_REPEAT_YES: &str = "flow:repeat:yes";
    pub(crate) const FLOW_REPEAT_NO: &str = "flow:repeat:no";
    pub(crate) const FLOW_REPEAT_CONFIRM: &str = "flow:repeat:confirm";
    pub(crate) const FLOW_REPEAT_ABORT: &str = "flow:repeat:abort";
    pub(crate) const FLOW_CONFIRM_YES: &str = "flow:confirm:yes";
    pub(crate) const FLOW_CONFIRM_NO: &str = "flow:confirm:no";

    pub(crate) const SETTINGS_MENU: &str = "settings:menu";
    pub(crate) const SETTINGS_ADD: &str = "settings:add";
    pub(crate) const SETTINGS_LIST: &str = "settings:list";
    pub(crate) const SETTINGS_ARCHIVE: &str = "settings:archive";

    pub(crate) const CHILD_PICK_EDIT: &str = "child:pick_edit";
    pub(crate) const CHILD_PICK_ARCHIVE: &str = "child:pick_archive";
    pub(crate) const CHILD_PICK_UNARCHIVE: &str = "child:pick_unarchive";
    pub(crate) const CHILD_PICK_DELETE: &str = "child:pick_delete";
    pub(crate) const CHILD_EDIT_MENU: &str = "child:edit_menu:";
    pub(crate) const CHILD_EDIT_NAME: &str = "child:edit_name:";
    pub(crate) const CHILD_EDIT_AGE: &str = "child:edit_age:";
    pub(crate) const CHILD_EDIT_PRICE: &str = "child:edit_price:";
    pub(crate) const CHILD_ARCHIVE: &str = "child:archive:";
    pub(crate) const CHILD_UNARCHIVE: &str = "child:unarchive:";
    pub(crate) const CHILD_DELETE_ASK: &str = "child:delete_ask:";
    pub(crate) const CHILD_DELETE: &str = "child:delete:";

    pub(crate) const TT_TOMORROW: &str = "tt:tomorrow";
    pub(crate) const TT_WEEK: &str = "tt:week";
    pub(crate) const TT_DONE: &str = "tt:done:";
    pub(crate) const TT_UNDONE: &str = "tt:undone:";
    pub(crate) const TT_CANCEL: &str = "tt:cancel:";
    pub(crate) const TT_RESTORE: &str = "tt:restore:";

    pub(crate) const BAL_CHILD: &str = "bal:child:";
    pub(crate) const BAL_BACK: &str = "bal:back";

    pub(crate) const DASH_DAYS: &str = "dash:days";
    pub(crate) const DASH_CHILDREN: &str = "dash:children";
    pub(crate) const DASH_BACK: &str = "dash:back";
}

pub(crate) const ACCESS_DENIED: &str = "⛔ Вибачте, у вас немає доступу до цього бота.";
pub(crate) const FLOW_CANCELLED: &str = "❌ Дію скасовано.";
pub(crate) const NOTHING_TO_CANCEL: &str = "Немає активної дії.";
pub(crate) const CHILD_NOT_FOUND: &str = "❌ Помилка: дитину не знайдено";
pub(crate) const STORAGE_FAILURE: &str = "⚠️ Не вдалося зберегти дані. Спробуйте пізніше.";
pub(crate) const NO_CHILDREN: &str =
    "❌ У вас ще немає доданих дітей.\nСпочатку додайте дитину через /settings";
pub(crate) const UNKNOWN_TEXT_HINT: &str =
    "Не розумію. Скористайтесь командами — /help покаже список.";

pub(crate) fn welcome(first_name: &str) -> String {
    format!(
        "Привіт, {first_name}!\n\n\
         Доступні команди:\n\
         /start - Початок роботи\n\
         /settings - Налаштування\n\
         /addlesson - Додати заняття\n\
         /payment - Внести оплату\n\
         /addpayment - Оплата від кількості занять\n\
         /balance - Баланс оплат\n\
         /timetable - Розклад на день\n\
         /dashboard - Звіт за місяць\n\
         /cancel - Скасувати поточну дію\n\
         /help - Допомога"
    )
}

// === Shared formatting helpers ===

pub(crate) fn display_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{}", date.day(), date.month(), date.year())
}

pub(crate) fn display_short_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}", date.day(), date.month())
}

pub(crate) fn month_name_uk(month: u32) -> &'static str {
    match month {
        1 => "Січень",
        2 => "Лютий",
        3 => "Березень",
        4 => "Квітень",
        5 => "Травень",
        6 => "Червень",
        7 => "Липень",
        8 => "Серпень",
        9 => "Вересень",
        10 => "Жовтень",
        11 => "Листопад",
        _ => "Грудень",
    }
}

pub(crate) fn weekday_uk(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Понеділок",
        Weekday::Tue => "Вівторок",
        Weekday::Wed => "Середа",
        Weekday::Thu => "Четвер",
        Weekday::Fri => "П'ятниця",
        Weekday::Sat => "Субота",
        Weekday::Sun => "Неділя",
    }
}

pub(crate) fn weekday_short_uk(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Пн",
        Weekday::Tue => "Вт",
        Weekday::Wed => "Ср",
        Weekday::Thu => "Чт",
        Weekday::Fri => "Пт",
        Weekday::Sat => "Сб",
        Weekday::Sun => "Нд",
    }
}

fn cancel_row() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(
        "❌ Скасувати",
        callback::FLOW_CANCEL,
    )]
}

fn child_rows(children: &[Child]) -> Vec<Vec<InlineKeyboardButton>> {
    children
        .iter()
        .map(|child| {
            vec![InlineKeyboardButton::callback(
                child.name.clone(),
                format!("{}{}", callback::FLOW_CHILD, child.id),
            )]
        })
        .collect()
}

// === Lesson scheduling flow ===

pub(crate) fn lesson_child_prompt(children: &[Child]) -> Reply {
    let mut rows = child_rows(children);
    rows.push(cancel_row());
    Reply::with_keyboard(
        "📚 Додавання заняття\n\nОберіть дитину:",
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn choose_with_buttons() -> Reply {
    Reply::text("Оберіть варіант кнопкою нижче.")
}

pub(crate) fn lesson_date_prompt(child_name: &str, today: NaiveDate) -> Reply {
    let mut rows = Vec::new();
    for (label, day) in [
        ("Сьогодні", today),
        ("Завтра", today + Days::new(1)),
        ("Післязавтра", today + Days::new(2)),
    ] {
        rows.push(vec![InlineKeyboardButton::callback(
            format!("{label} ({})", display_short_date(day)),
            format!("{}{}", callback::FLOW_DATE, display_date(day)),
        )]);
    }
    rows.push(cancel_row());

    Reply::with_keyboard(
        format!(
            "Дитина: {child_name}\n\n\
             Оберіть дату заняття або введіть вручну:\n\n\
             Формати:\n\
             • ДД.ММ (наприклад: 22.11)\n\
             • ДД.ММ.РРРР (наприклад: 14.11.2024)"
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn lesson_date_error() -> Reply {
    Reply::text(
        "❌ Неправильний формат дати. Спробуйте ще раз.\n\
         Формати:\n\
         • ДД.ММ (наприклад: 22.11)\n\
         • ДД.ММ.РРРР (наприклад: 14.11.2024)",
    )
}

pub(crate) fn start_time_prompt(date: NaiveDate) -> Reply {
    Reply::text(format!(
        "Дата: {}\n\n\
         Введіть час початку заняття:\n\n\
         Формати:\n\
         • ГГ:ХХ (наприклад: 10:00)\n\
         • ГГХХ (наприклад: 1000)",
        display_date(date)
    ))
}

pub(crate) fn time_error() -> Reply {
    Reply::text(
        "❌ Неправильний формат часу. Спробуйте ще раз.\n\
         Формати:\n\
         • ГГ:ХХ (наприклад: 10:00)\n\
         • ГГХХ (наприклад: 1000)",
    )
}

pub(crate) fn end_time_prompt(start: ClockTime) -> Reply {
    let plus30 = start.plus_minutes(30);
    let plus55 = start.plus_minutes(55);
    let rows = vec![
        vec![InlineKeyboardButton::callback(
            format!("+30хв ({plus30})"),
            format!("{}{plus30}", callback::FLOW_END),
        )],
        vec![InlineKeyboardButton::callback(
            format!("+55хв ({plus55})"),
            format!("{}{plus55}", callback::FLOW_END),
        )],
        cancel_row(),
    ];

    Reply::with_keyboard(
        format!(
            "Час початку: {start}\n\n\
             Оберіть час закінчення заняття або введіть вручну:\n\n\
             Формати:\n\
             • ГГ:ХХ (наприклад: 11:00)\n\
             • ГГХХ (наприклад: 1100)"
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn end_not_after_start_error() -> Reply {
    Reply::text("❌ Час закінчення має бути пізніше часу початку. Спробуйте ще раз:")
}

pub(crate) fn lesson_saved_ask_repeat(
    child_name: &str,
    date: NaiveDate,
    start: ClockTime,
    end: ClockTime,
) -> Reply {
    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "✅ Так, запланувати",
            callback::FLOW_REPEAT_YES,
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Ні, не треба",
            callback::FLOW_REPEAT_NO,
        )],
    ];

    Reply::with_keyboard(
        format!(
            "✅ Заняття успішно додано!\n\n\
             Дитина: {child_name}\n\
             Дата: {}\n\
             Час: {start} - {end}\n\n\
             💡 Запланувати цей урок на наступний місяць?\n\
             (Заплануються 4 заняття на той самий день тижня і час)",
            display_date(date)
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn lesson_saved_plain(child_name: &str, date: NaiveDate, start: ClockTime, end: ClockTime) -> Reply {
    Reply::text(format!(
        "✅ Заняття успішно додано!\n\n\
         Дитина: {child_name}\n\
         Дата: {}\n\
         Час: {start} - {end}",
        display_date(date)
    ))
}

pub(crate) fn repeat_preview(
    child_name: &str,
    start: ClockTime,
    end: ClockTime,
    candidates: &[NaiveDate],
) -> Reply {
    let mut text = format!(
        "📅 Заплануються {} заняття:\n\nДитина: {child_name}\nЧас: {start} - {end}\n\n",
        candidates.len()
    );
    for (i, date) in candidates.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            display_date(*date),
            weekday_uk(date.weekday())
        ));
    }

    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "✅ Підтвердити",
            callback::FLOW_REPEAT_CONFIRM,
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Скасувати",
            callback::FLOW_REPEAT_ABORT,
        )],
    ];

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn repeat_result(outcome: RecurrenceOutcome) -> Reply {
    if outcome.created == outcome.requested {
        Reply::text(format!(
            "✅ Успішно заплановано {} занять на наступний місяць!\n\n\
             Ви можете переглянути їх у /timetable",
            outcome.created
        ))
    } else {
        Reply::text(format!(
            "⚠️ Заплановано {} з {} занять; решту не вдалося зберегти.",
            outcome.created, outcome.requested
        ))
    }
}

pub(crate) const REPEAT_ABORTED: &str = "❌ Автоматичне планування скасовано.";

// === Payment flows ===

pub(crate) fn payment_child_prompt(children: &[Child]) -> Reply {
    let mut text = String::from("💰 Внесення оплати\n\nОберіть дитину:\n\n");
    for child in children {
        text.push_str(&format!(
            "👤 {} - {}/заняття\n",
            child.name, child.unit_price
        ));
    }

    let mut rows = child_rows(children);
    rows.push(cancel_row());
    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn price_not_set(child_name: &str) -> Reply {
    Reply::text(format!(
        "❌ У дитини {child_name} не встановлена базова ціна.\n\
         Встановіть ціну через /settings"
    ))
}

pub(crate) fn amount_prompt(child_name: &str, unit_price: Money) -> Reply {
    Reply::text(format!(
        "💰 Внесення оплати\n\n\
         Дитина: {child_name}\n\
         Ціна за заняття: {unit_price}\n\n\
         Введіть суму оплати в гривнях:"
    ))
}

pub(crate) fn amount_error() -> Reply {
    Reply::text("❌ Введіть коректну суму (число, більше 0). Спробуйте ще раз:")
}

pub(crate) fn amount_not_multiple(amount: Money, unit_price: Money, approx: f64) -> Reply {
    Reply::text(format!(
        "⚠️ Увага!\n\n\
         Сума {amount} не відповідає рівній кількості занять.\n\n\
         При ціні {unit_price} за заняття, ця сума дорівнює {approx:.2} занять.\n\n\
         Внесіть іншу суму, яка ділиться рівно на {unit_price}.\n\
         Наприклад:\n\
         \u{2022} {} = 1 заняття\n\
         \u{2022} {} = 5 занять\n\
         \u{2022} {} = 10 занять",
        unit_price,
        unit_price.times(5),
        unit_price.times(10),
    ))
}

pub(crate) fn payment_confirm(child_name: &str, amount: Money, lessons_count: u32) -> Reply {
    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "✅ Підтвердити",
            callback::FLOW_CONFIRM_YES,
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Скасувати",
            callback::FLOW_CONFIRM_NO,
        )],
    ];
    Reply::with_keyboard(
        format!(
            "💰 Підтвердження оплати\n\n\
             Дитина: {child_name}\n\
             Сума: {amount}\n\
             За {lessons_count} занять(я)\n\n\
             Підтверджуєте внесення оплати?"
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn payment_saved(
    child_name: &str,
    amount: Money,
    lessons_count: u32,
    date: NaiveDate,
) -> Reply {
    Reply::text(format!(
        "✅ Оплату успішно внесено!\n\n\
         Дитина: {child_name}\n\
         Сума: {amount}\n\
         За {lessons_count} занять(я)\n\
         Дата: {}",
        display_date(date)
    ))
}

pub(crate) fn count_child_prompt(children: &[Child]) -> Reply {
    let mut rows = child_rows(children);
    rows.push(cancel_row());
    Reply::with_keyboard(
        "💰 Додавання оплати\n\nОберіть дитину:",
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn count_prompt(child_name: &str, unit_price: Money) -> Reply {
    Reply::text(format!(
        "Дитина: {child_name}\n\
         Базова ціна за заняття: {unit_price}\n\n\
         За скільки занять оплата? (по стандарту 1)\n\
         Введіть кількість занять:"
    ))
}

pub(crate) fn count_error() -> Reply {
    Reply::text("❌ Введіть коректну кількість (ціле число, більше 0). Спробуйте ще раз:")
}

pub(crate) fn suggested_amount_prompt(lessons_count: u32, unit_price: Money) -> Reply {
    let suggested = unit_price.times(i64::from(lessons_count));
    Reply::text(format!(
        "Кількість занять: {lessons_count}\n\n\
         Рекомендована сума: {suggested}\n\
         ({unit_price} × {lessons_count})\n\n\
         Введіть суму оплати в гривнях:"
    ))
}

pub(crate) fn payment_date_prompt(amount: Money) -> Reply {
    Reply::text(format!(
        "Сума: {amount}\n\n\
         Введіть дату оплати:\n\n\
         Формати:\n\
         • ДД.ММ (наприклад: 22.11)\n\
         • ДД.ММ.РРРР (наприклад: 14.11.2024)"
    ))
}

// === Settings & children ===

pub(crate) fn settings_menu() -> Reply {
    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "➕ Додати дитину",
            callback::SETTINGS_ADD,
        )],
        vec![InlineKeyboardButton::callback(
            "👶 Список дітей",
            callback::SETTINGS_LIST,
        )],
        vec![InlineKeyboardButton::callback(
            "📂 Архів дітей",
            callback::SETTINGS_ARCHIVE,
        )],
    ];
    Reply::with_keyboard(
        "⚙️ Налаштування:\n\nОберіть дію:",
        InlineKeyboardMarkup::new(rows),
    )
}

fn back_to_settings_row() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(
        "⬅️ Назад до налаштувань",
        callback::SETTINGS_MENU,
    )]
}

pub(crate) fn children_list(children: &[Child], status: Option<&str>) -> Reply {
    if children.is_empty() {
        return Reply::with_keyboard(
            "👶 У вас поки немає доданих дітей.",
            InlineKeyboardMarkup::new(vec![back_to_settings_row()]),
        );
    }

    let mut text = String::new();
    if let Some(status) = status {
        text.push_str(status);
        text.push_str("\n\n");
    }
    text.push_str("👶 Список дітей:\n\n");
    for (i, child) in children.iter().enumerate() {
        text.push_str(&format!("{}. {} ({} років)\n", i + 1, child.name, child.age));
    }

    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "✏️ Редагувати",
            callback::CHILD_PICK_EDIT,
        )],
        vec![InlineKeyboardButton::callback(
            "📦 Архівувати",
            callback::CHILD_PICK_ARCHIVE,
        )],
        back_to_settings_row(),
    ];

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

/// Numbered child picker used by the management screens.
pub(crate) fn pick_children(
    title: &str,
    children: &[Child],
    prefix: &str,
    back_data: &str,
) -> Reply {
    let mut text = format!("{title}\n\n");
    let mut rows = Vec::new();
    for (i, child) in children.iter().enumerate() {
        text.push_str(&format!("{}. {} ({} років)\n", i + 1, child.name, child.age));
        rows.push(vec![InlineKeyboardButton::callback(
            format!("{}. {}", i + 1, child.name),
            format!("{prefix}{}", child.id),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Назад", back_data)]);

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn archive_view(children: &[Child], status: Option<&str>) -> Reply {
    if children.is_empty() {
        return Reply::with_keyboard(
            "📂 Архів порожній.\n\nВи можете архівувати дітей, які вже закінчили займатись.",
            InlineKeyboardMarkup::new(vec![back_to_settings_row()]),
        );
    }

    let mut text = String::new();
    if let Some(status) = status {
        text.push_str(status);
        text.push_str("\n\n");
    }
    text.push_str("📂 Архів дітей:\n\n");
    for (i, child) in children.iter().enumerate() {
        text.push_str(&format!("{}. {} ({} років)\n", i + 1, child.name, child.age));
    }
    text.push_str("\nОберіть дію:");

    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "🔓 Розархівувати",
            callback::CHILD_PICK_UNARCHIVE,
        )],
        vec![InlineKeyboardButton::callback(
            "🗑️ Видалити",
            callback::CHILD_PICK_DELETE,
        )],
        back_to_settings_row(),
    ];

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn child_edit_menu(child: &Child) -> Reply {
    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "✏️ Редагувати ім'я",
            format!("{}{}", callback::CHILD_EDIT_NAME, child.id),
        )],
        vec![InlineKeyboardButton::callback(
            "✏️ Редагувати вік",
            format!("{}{}", callback::CHILD_EDIT_AGE, child.id),
        )],
        vec![InlineKeyboardButton::callback(
            "✏️ Редагувати базову ціну",
            format!("{}{}", callback::CHILD_EDIT_PRICE, child.id),
        )],
        vec![InlineKeyboardButton::callback(
            "⬅️ Назад до списку",
            callback::SETTINGS_LIST,
        )],
    ];

    Reply::with_keyboard(
        format!(
            "✏️ Редагування дитини\n\n\
             Ім'я: {}\n\
             Вік: {}\n\
             Базова ціна: {}\n\n\
             Оберіть що хочете змінити:",
            child.name, child.age, child.unit_price
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn add_child_name_prompt() -> Reply {
    Reply::text(
        "➕ Додавання дитини\n\n\
         Введіть ім'я дитини (наприклад: Антон Антоненко):",
    )
}

pub(crate) const CHILD_NAME_EMPTY: &str = "❌ Ім'я не може бути порожнім. Спробуйте ще раз:";
pub(crate) const CHILD_AGE_ERROR: &str = "❌ Вік має бути числом від 0 до 18. Спробуйте ще раз:";
pub(crate) const CHILD_PRICE_ERROR: &str =
    "❌ Введіть коректну ціну (число, не від'ємне). Спробуйте ще раз:";

pub(crate) fn add_child_age_prompt(name: &str) -> Reply {
    Reply::text(format!(
        "Добре, ім'я: {name}\n\nТепер введіть вік дитини (наприклад: 5):"
    ))
}

pub(crate) fn add_child_price_prompt(age: u8) -> Reply {
    Reply::text(format!(
        "Добре, вік: {age}\n\nТепер введіть базову ціну за заняття (наприклад: 300):"
    ))
}

pub(crate) fn child_added(child: &Child) -> Reply {
    Reply::with_keyboard(
        format!(
            "✅ Дитину успішно додано!\n\n\
             Ім'я: {}\n\
             Вік: {}\n\
             Базова ціна: {}",
            child.name, child.age, child.unit_price
        ),
        InlineKeyboardMarkup::new(vec![back_to_settings_row()]),
    )
}

pub(crate) fn edit_field_prompt(child: &Child, field: crate::state::ChildField) -> Reply {
    use crate::state::ChildField;
    let text = match field {
        ChildField::Name => format!(
            "✏️ Редагування імені\n\nПоточне ім'я: {}\n\nВведіть нове ім'я:",
            child.name
        ),
        ChildField::Age => format!(
            "✏️ Редагування віку\n\nПоточний вік: {}\n\nВведіть новий вік:",
            child.age
        ),
        ChildField::Price => format!(
            "✏️ Редагування базової ціни\n\nПоточна ціна: {}\n\nВведіть нову базову ціну:",
            child.unit_price
        ),
    };
    Reply::text(text)
}

pub(crate) fn child_updated(what: &str, value: &str) -> Reply {
    Reply::with_keyboard(
        format!("✅ {what} успішно оновлено!\n\nНове значення: {value}"),
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "⬅️ Назад до списку",
            callback::SETTINGS_LIST,
        )]]),
    )
}

pub(crate) fn delete_refused(usage: ChildUsage) -> String {
    format!(
        "⛔ Неможливо видалити дитину!\n\n\
         У дитини є розрахункові документи:\n\
         📚 Уроків: {}\n\
         💰 Оплат: {}\n\n\
         💡 Використайте «Архівувати», щоб приховати дитину зі списку,\n\
         зберігши всю статистику.",
        usage.lessons, usage.payments
    )
}

pub(crate) fn delete_confirm(child: &Child) -> Reply {
    let rows = vec![vec![
        InlineKeyboardButton::callback(
            "✅ Так, видалити назавжди",
            format!("{}{}", callback::CHILD_DELETE, child.id),
        ),
        InlineKeyboardButton::callback("❌ Ні, скасувати", callback::SETTINGS_ARCHIVE),
    ]];

    Reply::with_keyboard(
        format!(
            "❓ Ви точно хочете видалити дитину НАЗАВЖДИ?\n\n\
             Ім'я: {}\n\
             Вік: {}\n\n\
             ✅ Дитина не має розрахункових документів.\n\n\
             ⚠️ Цю дію не можна буде скасувати!\n\
             Дитина буде видалена з бази даних.",
            child.name, child.age
        ),
        InlineKeyboardMarkup::new(rows),
    )
}

// === Timetable ===

pub(crate) fn timetable_day(
    title: &str,
    date: NaiveDate,
    lessons: &[(Lesson, String)],
    editable: bool,
) -> Reply {
    let date_display = display_date(date);
    if lessons.is_empty() {
        let text = format!("📅 {title} ({date_display})\n\n❌ Занять не знайдено.");
        if !editable {
            return Reply::text(text);
        }
        return Reply::with_keyboard(text, timetable_nav(date));
    }

    let mut text = format!("📅 {title} ({date_display})\n\n");
    for (i, (lesson, child_name)) in lessons.iter().enumerate() {
        let status = if lesson.cancelled {
            "🚫 "
        } else if lesson.completed {
            "✅ "
        } else {
            "⏳ "
        };
        text.push_str(&format!(
            "{}. {status}{child_name}\n   ⏰ {} - {}\n\n",
            i + 1,
            lesson.start_time,
            lesson.end_time
        ));
    }

    if !editable {
        return Reply::text(text);
    }

    let mut rows = Vec::new();
    for (i, (lesson, child_name)) in lessons.iter().enumerate() {
        let mut row = Vec::new();
        if lesson.completed {
            row.push(InlineKeyboardButton::callback(
                format!("❌ {}. {child_name}", i + 1),
                format!("{}{}", callback::TT_UNDONE, lesson.id),
            ));
        } else {
            row.push(InlineKeyboardButton::callback(
                format!("✅ {}. {child_name}", i + 1),
                format!("{}{}", callback::TT_DONE, lesson.id),
            ));
        }
        if lesson.cancelled {
            row.push(InlineKeyboardButton::callback(
                "🔄 Відновити",
                format!("{}{}", callback::TT_RESTORE, lesson.id),
            ));
        } else {
            row.push(InlineKeyboardButton::callback(
                "🚫 Скасувати",
                format!("{}{}", callback::TT_CANCEL, lesson.id),
            ));
        }
        rows.push(row);
    }
    let mut nav = InlineKeyboardMarkup::new(rows);
    for row in timetable_nav(date).inline_keyboard {
        nav = nav.append_row(row);
    }

    Reply::with_keyboard(text, nav)
}

fn timetable_nav(today: NaiveDate) -> InlineKeyboardMarkup {
    let tomorrow = today + Days::new(1);
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("📅 Завтра ({})", display_short_date(tomorrow)),
            callback::TT_TOMORROW,
        )],
        vec![InlineKeyboardButton::callback(
            "📆 На тиждень",
            callback::TT_WEEK,
        )],
    ])
}

pub(crate) fn timetable_week(days: &[(NaiveDate, Vec<(Lesson, String)>)]) -> Reply {
    let mut text = String::from("📆 Розклад на тиждень\n\n");
    let mut any = false;

    for (date, lessons) in days {
        if lessons.is_empty() {
            continue;
        }
        any = true;
        text.push_str(&format!(
            "▪️ {}, {}\n",
            weekday_short_uk(date.weekday()),
            display_date(*date)
        ));
        for (lesson, child_name) in lessons {
            let status = if lesson.cancelled {
                "🚫 "
            } else if lesson.completed {
                "✅ "
            } else {
                ""
            };
            text.push_str(&format!(
                "  {}-{} | {status}{child_name}\n",
                lesson.start_time, lesson.end_time
            ));
        }
        text.push('\n');
    }

    if !any {
        text.push_str("❌ Занять на тиждень не знайдено.");
    }

    Reply::text(text)
}

// === Balance ===

pub(crate) fn balance_overview(balances: &[ChildBalance]) -> Reply {
    let unsettled: Vec<&ChildBalance> = balances.iter().filter(|b| b.balance != 0).collect();
    if unsettled.is_empty() {
        return Reply::text("✅ Баланс по всіх дітях рівний нулю!\nВсі заняття оплачені.");
    }

    let mut text = String::from("💰 Баланс оплат\n\n");
    let mut rows = Vec::new();
    for item in &unsettled {
        let status = if item.balance > 0 {
            format!("💵 Переплата: +{} занять", item.balance)
        } else {
            format!("⚠️ Недоплата: {} занять", item.balance)
        };
        text.push_str(&format!("👤 {}\n   {status}\n\n", item.name));
        rows.push(vec![InlineKeyboardButton::callback(
            format!("📋 {} - Звіт", item.name),
            format!("{}{}", callback::BAL_CHILD, item.child_id),
        )]);
    }

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn child_statement(statement: &ChildStatement) -> Reply {
    let balance = &statement.balance;
    let mut text = format!("💰 Деталі оплат: {}\n\n", balance.name);

    if balance.balance > 0 {
        text.push_str(&format!("💵 Переплата: +{} занять\n\n", balance.balance));
    } else if balance.balance < 0 {
        text.push_str(&format!("⚠️ Недоплата: {} занять\n\n", balance.balance));
    } else {
        text.push_str("✅ Баланс: 0 (все оплачено)\n\n");
    }

    text.push_str("📝 Оплати:\n");
    if statement.payments.is_empty() {
        text.push_str("  Немає оплат\n\n");
    } else {
        let mut total = Money::ZERO;
        for payment in &statement.payments {
            total += payment.amount;
            text.push_str(&format!(
                "  • {}: {} за {} занять\n",
                display_date(payment.payment_date),
                payment.amount,
                payment.lessons_count
            ));
        }
        text.push_str(&format!("  Всього: {total}\n\n"));
    }

    text.push_str(&format!("📚 Проведено занять: {}\n", balance.delivered));
    let recent: Vec<_> = statement
        .delivered_lessons
        .iter()
        .rev()
        .take(5)
        .rev()
        .collect();
    if statement.delivered_lessons.len() > 5 {
        text.push_str(&format!(
            "(показано останні 5 з {})\n",
            statement.delivered_lessons.len()
        ));
    }
    for lesson in recent {
        text.push_str(&format!(
            "  • {} {}\n",
            display_date(lesson.date),
            lesson.start_time
        ));
    }

    Reply::with_keyboard(
        text,
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "⬅️ Назад",
            callback::BAL_BACK,
        )]]),
    )
}

// === Dashboard ===

pub(crate) fn dashboard(report: &MonthlyReport) -> Reply {
    let month = report.window.first;
    let text = format!(
        "📊 Звіт за {} {}\n\n\
         📚 Всього проведено занять: {}\n\
         🚫 Всього скасовано занять: {}\n\n\
         💰 Всього отримано оплат на суму: {}\n\
         💵 Всього переплат на суму: {}\n\
         ⚠️ Всього недоплат на суму: {}",
        month_name_uk(month.month()),
        month.year(),
        report.delivered,
        report.cancelled,
        report.payments_total,
        report.overpaid_total,
        report.underpaid_total
    );

    let rows = vec![
        vec![InlineKeyboardButton::callback(
            "📅 Доходи по днях",
            callback::DASH_DAYS,
        )],
        vec![InlineKeyboardButton::callback(
            "👤 Доходи по дітях",
            callback::DASH_CHILDREN,
        )],
    ];

    Reply::with_keyboard(text, InlineKeyboardMarkup::new(rows))
}

fn dash_back() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Назад",
        callback::DASH_BACK,
    )]])
}

pub(crate) fn income_by_day(month: u32, rows: &[DayIncome]) -> Reply {
    let mut text = format!("📅 Доходи по днях за {}\n\n", month_name_uk(month));
    if rows.is_empty() {
        text.push_str("Немає проведених занять за цей місяць");
    } else {
        let mut total = Money::ZERO;
        for row in rows {
            total += row.total;
            text.push_str(&format!("{}: {}\n", display_date(row.date), row.total));
        }
        text.push_str(&format!("\n💰 Всього: {total}"));
    }
    Reply::with_keyboard(text, dash_back())
}

pub(crate) fn income_by_child(month: u32, rows: &[ChildIncome]) -> Reply {
    let mut text = format!("👤 Доходи по дітях за {}\n\n", month_name_uk(month));
    if rows.is_empty() {
        text.push_str("Немає проведених занять за цей місяць");
    } else {
        let mut total = Money::ZERO;
        for row in rows {
            total += row.total;
            text.push_str(&format!("{}: {}\n", row.name, row.total));
        }
        text.push_str(&format!("\n💰 Всього: {total}"));
    }
    Reply::with_keyboard(text, dash_back())
}
