//! Разбор shortcuts.conf.
//!
//! Формат строки: `shortcut[:mode[(arg)]]*[ layer]*,[command],[wm_class],[title]`.
//! Запятая внутри двойных кавычек не разделяет поля, кавычки вокруг поля
//! снимаются. Строка из одного-двух полей всегда работает в режиме `run-only`.

use super::action::{Action, ActionId, Layers};
use super::matcher::MatchRule;
use super::mode::{BooleanSettings, Mode, ModeSet, ModeValue};
use crate::debug_if_enabled;
use crate::error::{Result, RorError};
use crate::ror_error;
use std::sync::Arc;

/// Разбить строку на поля по запятым вне кавычек.
///
/// Запятая считается разделителем, если после неё в строке чётное число
/// кавычек. Поле, целиком обёрнутое в `"..."`, освобождается от кавычек.
pub fn split_fields(line: &str) -> Vec<String> {
    let total = line.matches('"').count();
    let mut seen = 0;
    let mut fields = Vec::new();
    let mut current = String::new();

    for c in line.chars() {
        match c {
            '"' => {
                seen += 1;
                current.push(c);
            }
            ',' if (total - seen) % 2 == 0 => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields.iter().map(|field| unquote(field).to_string()).collect()
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    if field.starts_with('"') && field.ends_with('"') {
        if field.len() < 2 {
            return "";
        }
        return field[1..field.len() - 1].trim();
    }
    field
}

/// `raise(2)` → (`raise`, Some(`2`)), `verbose` → (`verbose`, None)
pub fn parse_mode_token(token: &str) -> (&str, Option<&str>) {
    match token.split_once('(') {
        Some((key, rest)) => match rest.find(')') {
            Some(end) => (key.trim(), Some(&rest[..end])),
            None => (key.trim(), None),
        },
        None => (token.trim(), None),
    }
}

/// Строка-комментарий или пустая строка
pub fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Разобрать одну строку конфигурации в шорткат
pub fn parse_line(line: &str, id: ActionId, settings: &Arc<dyn BooleanSettings>) -> Result<Action> {
    let fields = split_fields(line);
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

    let mut specs = field(0).split(':');
    let shortcut_layer = specs.next().unwrap_or("");

    let mut modes = ModeSet::new(Arc::clone(settings));
    for token in specs {
        let (key, arg) = parse_mode_token(token);
        if let Err(e) = modes.add(key, ModeValue::from_arg(arg)) {
            debug_if_enabled!("{}, режим пропущен", e);
        }
    }
    if fields.len() <= 2 {
        // без окна для сравнения шорткат только запускает команду
        modes.set(Mode::RunOnly, ModeValue::On);
    }

    let mut words = shortcut_layer.split_whitespace();
    let shortcut_bare = words.next().unwrap_or("");
    let layers: Layers = words.map(String::from).collect();

    let action = Action::new(
        id,
        shortcut_bare,
        layers,
        modes,
        field(1),
        MatchRule::parse(field(2))?,
        MatchRule::parse(field(3))?,
    );

    if action.shortcut.is_empty() {
        return Err(ror_error!(config_line, "пустой шорткат в строке '{}'", line.trim()));
    }
    Ok(action)
}

/// Результат разбора целого файла
#[derive(Debug, Default)]
pub struct ParsedShortcuts {
    pub actions: Vec<Action>,
    pub errors: Vec<RorError>,
}

/// Разобрать весь текст конфигурации. Ошибка в строке не прерывает разбор:
/// строка пропускается, ошибка сохраняется с номером строки.
pub fn parse_document(
    text: &str,
    settings: &Arc<dyn BooleanSettings>,
    next_id: &mut ActionId,
) -> ParsedShortcuts {
    let mut parsed = ParsedShortcuts::default();

    for (index, line) in text.lines().enumerate() {
        if is_skippable(line) {
            continue;
        }
        match parse_line(line.trim(), *next_id, settings) {
            Ok(action) => {
                *next_id += 1;
                parsed.actions.push(action);
            }
            Err(e) => parsed.errors.push(e.at_line(index + 1)),
        }
    }

    parsed
}
