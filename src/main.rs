use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod engine;
mod error;
mod events;
mod mappings;
mod services;
mod utils;

use config::Config;
use engine::{BooleanSettings, Controller};
use events::HostEvent;
use services::{create_keyboard_listener, DesktopHost, DryRunHost, GrabTable, Host};

#[derive(Parser, Debug)]
#[command(name = "run-or-raise")]
#[command(about = "Глобальные сочетания клавиш: запустить программу или поднять её окно")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "run-or-raise.toml")]
    config: String,

    /// Файл шорткатов (по умолчанию из конфигурации)
    #[arg(short, long)]
    shortcuts: Option<String>,

    /// Режим сухого запуска: нажатия читаются из stdin, действия только логируются
    #[arg(long)]
    dry_run: bool,

    /// Разобрать файл шорткатов, вывести таблицу и выйти
    #[arg(long)]
    check: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(path) = &args.shortcuts {
        config.shortcuts.path = path.clone();
    }
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск run-or-raise v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);
    let config = Arc::new(config);

    let settings: Arc<dyn BooleanSettings> = Arc::new(config.settings.clone());
    let mut controller = Controller::new(settings);
    match config.shortcuts.read() {
        Ok(text) => {
            controller.load_text(&text);
        }
        Err(e) => error!("{:#}", e),
    }

    if args.check {
        print_summary(&controller);
        return Ok(());
    }

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else {
        utils::permissions::check_permissions()?;
        if let Err(e) = DesktopHost::check_tools() {
            warn!("Оконные утилиты недоступны: {}", e);
        }
    }

    let grabs = Arc::new(GrabTable::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let host: Box<dyn Host> = if args.dry_run {
        Box::new(DryRunHost::with_grabs(Arc::clone(&grabs)))
    } else {
        Box::new(DesktopHost::new(Arc::clone(&grabs)))
    };
    let keyboard_listener =
        create_keyboard_listener(config.clone(), Arc::clone(&grabs), events_tx.clone(), args.dry_run)?;

    let controller_handle = tokio::spawn(controller.run(host, events_rx));
    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run().await {
            error!("Ошибка в KeyboardListener: {}", e);
        }
    });

    info!("Все сервисы запущены");

    match signal::ctrl_c().await {
        Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
        Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
    }

    info!("Завершение работы...");
    if events_tx.send(HostEvent::Shutdown).is_err() {
        warn!("Контроллер уже остановлен");
    }

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, controller_handle).await {
        Ok(_) => info!("Все акселераторы освобождены"),
        Err(_) => warn!("Таймаут при завершении контроллера"),
    }

    // поток чтения клавиатуры блокирующий; устройство освобождается при выходе процесса
    keyboard_handle.abort();

    info!("run-or-raise завершил работу");
    Ok(())
}

fn print_summary(controller: &Controller) {
    let summary = controller.summary();
    for accelerator in &summary {
        println!("{} ({})", accelerator.shortcut, accelerator.actions.len());
        for action in &accelerator.actions {
            let mut line = format!("    {}", action.command);
            if !action.wm_class.is_empty() || !action.title.is_empty() {
                line.push_str(&format!("  match: {:?} {:?}", action.wm_class, action.title));
            }
            if !action.lock.is_unconstrained() {
                line.push_str(&format!("  locks: {}", action.lock));
            }
            if !action.layers.is_empty() {
                line.push_str(&format!("  layers: {}", action.layers.join(" ")));
            }
            if !action.modes.is_empty() {
                line.push_str(&format!("  modes: {}", action.modes.join(":")));
            }
            println!("{}", line);
        }
    }
    println!("Акселераторов: {}", summary.len());
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
