//! Application startup and main run loop

use crate::app::cli::{display, Args};
use crate::broker::{InMemoryBroker, Message};
use crate::context::ApplicationContext;
use crate::core::config::Settings;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::listener::{ListenerError, ListenerResult, SimpleContainerFactory};
use clap::Parser;
use std::sync::Arc;

/// Parse arguments, run the listener host and return the process exit code
pub fn startup() -> i32 {
    let args = Args::parse();

    let settings = match Settings::load_or_default(args.config_file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let use_color = !args.no_color
        && settings.logging.color.unwrap_or(true)
        && std::io::IsTerminal::is_terminal(&std::io::stdout());
    let log_level = args.log_level.as_deref().or(settings.logging.level.as_deref());
    let log_format = args.log_format.as_deref().or(settings.logging.format.as_deref());
    let log_file = args.effective_log_file(settings.logging.file.as_ref());
    let log_file = log_file.as_ref().map(|path| path.to_string_lossy());

    if let Err(e) = init_logging(log_level, log_format, log_file.as_deref(), use_color) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: cannot start async runtime: {}", e);
            return 1;
        }
    };

    match runtime.block_on(run(&args, &settings, use_color)) {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "Listener host failed");
            1
        }
    }
}

/// Build the context, start the listeners and wait for a shutdown signal
async fn run(args: &Args, settings: &Settings, use_color: bool) -> ListenerResult<()> {
    let broker = InMemoryBroker::new();
    let mut context = build_context(settings, &broker)?;

    if args.list {
        display::display_endpoints(&context.discover_endpoints()?, use_color);
        return Ok(());
    }

    if let Err(e) = context.refresh() {
        // Containers started before the failure still need stopping
        if let Err(close_err) = context.close() {
            log::warn!("Cleanup after failed start: {}", close_err);
        }
        return Err(e);
    }
    log::info!(
        "{} listener container(s) running; waiting for shutdown signal",
        context.registry().running_count()
    );

    for spec in &args.send {
        let delivered = broker.publish(Message::new(spec.queue.clone(), spec.body.clone()));
        log::debug!("Sent message to '{}' ({} listener(s))", spec.queue, delivered);
    }

    ShutdownCoordinator::guard(|mut shutdown_rx| async move {
        let _ = shutdown_rx.recv().await;
        Ok::<(), ListenerError>(())
    })
    .await?;

    log::info!("Shutdown requested");
    context.close()
}

/// Context from settings with the default container factory on `broker`
/// and every built-in component
pub fn build_context(settings: &Settings, broker: &InMemoryBroker) -> ListenerResult<ApplicationContext> {
    let mut context = ApplicationContext::from_settings(settings)?;
    let factory = SimpleContainerFactory::current(broker.clone()).map_err(|e| {
        ListenerError::configuration(format!("cannot create container factory: {}", e))
    })?;
    context.register_factory(
        settings.listener.default_container_factory.clone(),
        Arc::new(factory),
    )?;

    let discovered = context.add_discovered_components();
    log::debug!("Discovered {} built-in component(s)", discovered);
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_built_in_echo_listener_runs() {
        let settings = Settings::from_toml_str("[properties]\n\"echo.queue\" = \"shout\"").unwrap();
        let broker = InMemoryBroker::new();
        let mut context = build_context(&settings, &broker).unwrap();

        let count = context.refresh().unwrap();
        assert!(count >= 1);
        let echo = context.registry().endpoint("echo").unwrap();
        assert_eq!(echo.queue_names(), ["shout".to_string()]);
        assert!(context.registry().container("echo").unwrap().is_running());

        assert_eq!(broker.publish(Message::new("shout", "hello")), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;

        context.close().unwrap();
    }
}
