//! Command structs

use teloxide::utils::command::BotCommands;

/// Every slash command the bot understands.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команди помічника репетитора:")]
pub enum Command {
    #[command(description = "почати роботу.")]
    Start,
    #[command(description = "показати це повідомлення.")]
    Help,
    #[command(description = "налаштування: діти та архів.")]
    Settings,
    #[command(description = "додати заняття.")]
    AddLesson,
    #[command(description = "внести оплату (від суми).")]
    Payment,
    #[command(description = "додати оплату (від кількості занять).")]
    AddPayment,
    #[command(description = "баланс оплат.")]
    Balance,
    #[command(description = "розклад занять на день.")]
    Timetable,
    #[command(description = "звіт за місяць.")]
    Dashboard,
    #[command(description = "скасувати поточну дію.")]
    Cancel,
}
