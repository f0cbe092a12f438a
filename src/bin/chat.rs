//! Menu Chat - terminal front end for the menu assistant

use crossterm::event::{Event as TermEvent, EventStream};
use futures::StreamExt;
use menu_chat::client::{HttpAssistantClient, LoggingClient};
use menu_chat::config::ChatConfig;
use menu_chat::dispatcher::Dispatcher;
use menu_chat::view::{self, Command, InputLine};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_env()?;
    init_logging(&config)?;

    let client = HttpAssistantClient::new(&config)?;
    tracing::info!(endpoint = %config.chat_endpoint(), "Menu chat starting");
    let dispatcher = Arc::new(Dispatcher::new(LoggingClient::new(Arc::new(client))));

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &dispatcher).await;
    ratatui::restore();

    tracing::info!("Menu chat exiting");
    result
}

/// Logs go to a file when `MENU_CHAT_LOG` is set; the terminal belongs to
/// the widget
fn init_logging(config: &ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run<C>(
    terminal: &mut ratatui::DefaultTerminal,
    dispatcher: &Arc<Dispatcher<C>>,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: menu_chat::client::AssistantClient + 'static,
{
    let mut events = EventStream::new();
    let mut updates = dispatcher.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(300));
    let mut input = InputLine::default();
    let mut tick = 0usize;

    loop {
        let state = updates.borrow_and_update().clone();
        terminal.draw(|frame| view::draw(frame, &state, &input, tick))?;

        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else { break };
                let TermEvent::Key(key) = event? else { continue };
                match input.handle_key(key, state.is_pending()) {
                    Command::Quit => break,
                    Command::Submit(text) => {
                        let dispatcher = Arc::clone(dispatcher);
                        tokio::spawn(async move {
                            dispatcher.send(&text).await;
                        });
                    }
                    Command::QuickAction(index) => {
                        let dispatcher = Arc::clone(dispatcher);
                        tokio::spawn(async move {
                            dispatcher.invoke_quick_action(index).await;
                        });
                    }
                    Command::None => {}
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                tick = tick.wrapping_add(1);
            }
        }
    }

    Ok(())
}
