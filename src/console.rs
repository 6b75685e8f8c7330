//! Terminal operator surface for the desktop process.
//!
//! One task reads stdin. While an instruction prompt is open the next line
//! answers it; otherwise each line is a single-key command.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use snaprelay_orchestrator::{HotkeyAction, Instructions, OperatorSurface};

pub(crate) const HELP: &str = "Commands: s = screenshot, a = start/add multi-page, f = finalize, r = reset, q = quit";

/// Instruction lines matching the console key bindings.
pub(crate) fn instructions() -> Instructions {
    Instructions {
        idle: "s: Screenshot | a: Multi-page mode | q: Quit".to_string(),
        collecting: "Multi-page: a to add a page, f to finalize, r to cancel".to_string(),
    }
}

/// Map one input line to an action.
pub(crate) fn parse_command(line: &str) -> Option<HotkeyAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" => Some(HotkeyAction::SingleCapture),
        "a" => Some(HotkeyAction::Collect),
        "f" => Some(HotkeyAction::Finalize),
        "r" => Some(HotkeyAction::Cancel),
        "q" => Some(HotkeyAction::Quit),
        _ => None,
    }
}

#[derive(Default)]
pub(crate) struct ConsoleSurface {
    /// Open instruction prompt waiting for the next line.
    prompt: Mutex<Option<oneshot::Sender<String>>>,
}

impl ConsoleSurface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hand `line` to an open prompt. Returns the line back when none is open.
    pub(crate) fn answer(&self, line: String) -> Option<String> {
        match self.prompt.lock().take() {
            Some(tx) => tx.send(line).err(),
            None => Some(line),
        }
    }

    /// Close any open prompt without an answer.
    pub(crate) fn dismiss(&self) {
        self.prompt.lock().take();
    }
}

#[async_trait]
impl OperatorSurface for ConsoleSurface {
    fn show_instruction(&self, text: &str) {
        println!("\n[{}]", text);
    }

    fn show_status(&self, text: &str) {
        println!("  {}", text);
    }

    fn show_result(&self, text: &str) {
        println!("\n----- Answer -----\n{}\n------------------", text);
    }

    fn show_error(&self, text: &str) {
        eprintln!("  Error: {}", text);
    }

    fn clear_result(&self) {}

    async fn ask_instruction(&self, question: &str) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        *self.prompt.lock() = Some(tx);
        println!("{} (empty line for the default):", question);
        rx.await.ok()
    }
}

/// Read lines from `input` until EOF or `q`, answering prompts and
/// forwarding commands as actions.
pub(crate) async fn read_commands<R>(
    input: R,
    surface: &ConsoleSurface,
    actions: mpsc::UnboundedSender<HotkeyAction>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(line) = surface.answer(line) else {
            continue;
        };
        match parse_command(&line) {
            Some(action) => {
                debug!("Console command {:?}", action);
                if actions.send(action).is_err() || action == HotkeyAction::Quit {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => println!("{}", HELP),
        }
    }
    surface.dismiss();
    let _ = actions.send(HotkeyAction::Quit);
}
