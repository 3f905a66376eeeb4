//! Ryan in a terminal: a line-oriented host for the chat, logs, memory and creative
//! panels, with the orb rendered as ASCII in the background.

mod ascii;
mod command;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ryan_client::{
    shared, Backend, ChatSession, DecayTicker, HttpBackend, IntervalFrames, LogsSection,
    MemorySection, OrbDriver, SimulatedSpeaker, SpeechOutput,
};
use ryan_core::chat::TYPING_DELAY_MS;
use ryan_core::{
    AnimationController, Bubble, ClientConfig, MemoryView, OrbGeometry, OutputView, RenderLoop,
    Sender,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ascii::AsciiRenderer;
use crate::command::{Command, HELP};

const ORB_COLUMNS: usize = 48;
const ORB_ROWS: usize = 24;

struct Repl {
    session: ChatSession,
    logs: LogsSection,
    memory: MemorySection,
    speech: Arc<SpeechOutput>,
    orb_snapshot: Arc<Mutex<String>>,
}

impl Repl {
    /// Runs one command. Returns false when the user asked to quit.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Say(text) => {
                if let Some(reply) = self.session.send(&text).await {
                    print_bubble(&reply.bubble).await;
                }
            }
            Command::Logs => {
                self.logs.open().await;
                self.print_logs();
            }
            Command::Older => {
                let inserted = self.logs.scrolled(0.0).await;
                if inserted == 0 && self.logs.pager().is_exhausted() {
                    println!("(no older logs)");
                }
                self.print_logs();
            }
            Command::Refresh => {
                self.logs.refresh().await;
                self.print_logs();
            }
            Command::Memory => {
                self.memory.load().await;
                self.print_memory();
            }
            Command::Edit(key) => match self.memory.edit(&key) {
                Some(refusal) => println!("{}", refusal),
                None => println!("Editing \"{}\". /save <value> or /cancel.", key),
            },
            Command::Save(value) => {
                println!("{}", self.memory.save(&value).await);
                self.print_memory();
            }
            Command::Cancel => self.memory.cancel_edit(),
            Command::Forget(key) => {
                println!("{}", self.memory.delete(&key).await);
                self.print_memory();
            }
            Command::Outputs => self.print_outputs(),
            Command::Select(index) => {
                if self.session.creative_mut().select(index).is_none() {
                    println!("No output {}.", index + 1);
                }
                self.print_outputs();
            }
            Command::Show => match self.session.creative().active_view() {
                Some(view) => print_output(&view),
                None => println!("No creative output selected."),
            },
            Command::Drop => match self.session.creative_mut().remove_active() {
                Some(removed) => println!("Removed {}.", removed.title),
                None => println!("No creative output selected."),
            },
            Command::Upload(path) => match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    let name = std::path::Path::new(&path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    let reply = self.session.upload_document(&name, &content).await;
                    print_bubble(&reply.bubble).await;
                }
                Err(e) => println!("Could not read {}: {}", path, e),
            },
            Command::Speech(setting) => {
                let enabled = setting.unwrap_or(!self.speech.is_enabled());
                self.speech.set_enabled(enabled);
                println!("Speech {}.", if enabled { "on" } else { "off" });
            }
            Command::Orb => {
                let frame = self
                    .orb_snapshot
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone();
                if frame.is_empty() {
                    println!("(orb not rendered yet)");
                } else {
                    print!("{}", frame);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Usage(usage) => println!("Usage: {}", usage),
            Command::Unknown(name) => println!("Unknown command /{}; try /help", name),
        }
        true
    }

    fn print_logs(&self) {
        for row in self.logs.rows() {
            let tag = row.classes.last().copied().unwrap_or("");
            println!("[{:>8}] {}", tag, row.text);
        }
    }

    fn print_memory(&self) {
        match self.memory.view() {
            MemoryView::Entries(items) => {
                for item in items {
                    let marker = if self.memory.board().editing() == Some(item.key.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}: {}", marker, item.key, item.display_value());
                }
            }
            other => println!("{}", other.message().unwrap_or_default()),
        }
    }

    fn print_outputs(&self) {
        let dropdown = self.session.creative().dropdown();
        for option in &dropdown.options {
            let active = option.index.is_some() && option.index == dropdown.selected;
            let number = option.index.map(|i| (i + 1).to_string()).unwrap_or_default();
            println!("{} {:>2} {}", if active { ">" } else { " " }, number, option.label);
        }
    }
}

async fn print_bubble(bubble: &Bubble) {
    let prefix = match bubble.sender {
        Sender::User => "You",
        Sender::Ryan => "Ryan",
        Sender::Error => "Error",
    };
    let text = bubble.visible_text();
    if bubble.typing {
        print!("{}: ", prefix);
        for ch in text.chars() {
            print!("{}", ch);
            let _ = std::io::stdout().flush();
            tokio::time::sleep(Duration::from_millis(TYPING_DELAY_MS)).await;
        }
        println!();
    } else {
        println!("{}: {}", prefix, text);
    }
    if bubble.creative_link {
        println!("      (/show to view, /outputs to list)");
    }
}

fn print_output(view: &OutputView) {
    match view {
        OutputView::Code {
            line_numbers,
            language,
            content,
        } => {
            println!("--- {} ---", language);
            for (n, line) in line_numbers.iter().zip(content.split('\n')) {
                println!("{:>4} | {}", n, line);
            }
        }
        OutputView::Text { content } => println!("{}", content),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[ryan-terminal] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Client config not loaded ({}); using defaults", e);
            ClientConfig::default()
        }
    };

    let backend: Arc<dyn Backend> = match HttpBackend::new(&config.backend_url) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Invalid backend URL {}: {}", config.backend_url, e);
            std::process::exit(1);
        }
    };

    let controller = shared(AnimationController::new(config.orb.decay));
    let ticker = Arc::new(DecayTicker::new(Arc::clone(&controller)));
    let speaker = Arc::new(SimulatedSpeaker::default());
    let speech = Arc::new(SpeechOutput::new(speaker.clone(), config.speech_enabled));

    let renderer = AsciiRenderer::new(ORB_COLUMNS, ORB_ROWS);
    let orb_snapshot = renderer.snapshot();
    let mut driver = OrbDriver::new(
        RenderLoop::new(OrbGeometry::orb(), config.orb.render),
        controller,
        speaker.speaking_flag(),
    );
    let frame_period = Duration::from_millis(config.orb.frame_interval_ms);
    let orb_task = tokio::spawn(async move {
        let mut frames = IntervalFrames::new(frame_period);
        let mut renderer = renderer;
        driver.run(&mut frames, &mut renderer, None).await
    });

    let mut repl = Repl {
        session: ChatSession::new(Arc::clone(&backend), ticker.clone(), speech.clone()),
        logs: LogsSection::new(Arc::clone(&backend), config.log_limit),
        memory: MemorySection::new(backend),
        speech,
        orb_snapshot,
    };

    println!("Ryan at {}. /help for commands.", config.backend_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stdin: {}", e);
                break;
            }
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if !repl.handle(command).await {
            break;
        }
    }

    orb_task.abort();
    ticker.stop();
}
