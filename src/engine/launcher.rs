use crate::error::{Result, RorError};
use crate::ror_error;
use crate::services::Launcher;
use tracing::{debug, info};

/// Запустить команду шортката.
///
/// Если команда - известный хосту идентификатор приложения, активируем
/// приложение; иначе разбираем строку как командную строку оболочки и
/// запускаем отсоединённый процесс.
pub fn run_command<L: Launcher + ?Sized>(launcher: &mut L, command: &str) -> Result<()> {
    let command = command.trim();
    if command.is_empty() {
        return Err(ror_error!(launcher, "пустая команда"));
    }

    if let Some(app) = launcher.lookup_app(command) {
        info!("Активация приложения {}", app);
        return launcher.activate_app(&app);
    }

    let argv = split_argv(command)?;
    debug!("Запуск процесса: {:?}", argv);
    launcher.spawn(&argv)
}

/// Разбить командную строку на аргументы по правилам POSIX-оболочки:
/// одинарные кавычки буквальны, в двойных кавычках `\` экранирует
/// `$`, `` ` ``, `"`, `\` и перевод строки, вне кавычек `\` экранирует любой
/// символ. Подстановки переменных не выполняются, только `~` в начале слова.
pub fn split_argv(command: &str) -> Result<Vec<String>> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.peek() {
                    Some(&next) if matches!(next, '$' | '`' | '"' | '\\') => {
                        current.push(next);
                        chars.next();
                    }
                    Some('\n') => {
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                _ => current.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => {
                    in_word = true;
                    match chars.next() {
                        Some('\n') | None => {}
                        Some(next) => current.push(next),
                    }
                }
                '#' if !in_word => break,
                c if c.is_whitespace() => {
                    if in_word {
                        argv.push(expand_word(std::mem::take(&mut current)));
                        in_word = false;
                    }
                }
                _ => {
                    in_word = true;
                    current.push(c);
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(RorError::Launcher(format!(
            "незакрытая кавычка в команде: {}",
            command
        )));
    }
    if in_word {
        argv.push(expand_word(current));
    }
    if argv.is_empty() {
        return Err(ror_error!(launcher, "команда не содержит аргументов: {}", command));
    }
    Ok(argv)
}

fn expand_word(word: String) -> String {
    if word.starts_with('~') {
        shellexpand::tilde(&word).into_owned()
    } else {
        word
    }
}
