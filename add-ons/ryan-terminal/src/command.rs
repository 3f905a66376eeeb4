//! REPL input parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything not starting with `/` goes to the assistant.
    Say(String),
    Logs,
    Older,
    Refresh,
    Memory,
    Edit(String),
    Save(String),
    Cancel,
    Forget(String),
    Outputs,
    Select(usize),
    Show,
    Drop,
    Upload(String),
    Speech(Option<bool>),
    Orb,
    Help,
    Quit,
    /// Recognised command with bad or missing arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  <text>            talk to Ryan
  /logs             open the logs section (newest page)
  /older            load the next older page of logs
  /refresh          reload logs from the newest page
  /memory           show memory entries
  /edit <key>       start editing a memory entry
  /save <value>     save the entry being edited
  /cancel           cancel the current edit
  /forget <key>     delete a memory entry
  /outputs          list creative outputs
  /select <n>       make output n active (1-based)
  /show             print the active output
  /drop             remove the active output
  /upload <path>    upload a text document
  /speech [on|off]  toggle or set speech output
  /orb              print the current orb frame
  /help             this text
  /quit             exit";

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Say(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "logs" => Self::Logs,
            "older" => Self::Older,
            "refresh" => Self::Refresh,
            "memory" => Self::Memory,
            "edit" => required(arg, "/edit <key>", Self::Edit),
            "save" | "set" => Self::Save(arg.to_string()),
            "cancel" => Self::Cancel,
            "forget" => required(arg, "/forget <key>", Self::Forget),
            "outputs" => Self::Outputs,
            "select" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Self::Select(n - 1),
                _ => Self::Usage("/select <n>"),
            },
            "show" => Self::Show,
            "drop" => Self::Drop,
            "upload" => required(arg, "/upload <path>", Self::Upload),
            "speech" => match arg {
                "" => Self::Speech(None),
                "on" => Self::Speech(Some(true)),
                "off" => Self::Speech(Some(false)),
                _ => Self::Usage("/speech [on|off]"),
            },
            "orb" => Self::Orb,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}

fn required(arg: &str, usage: &'static str, make: fn(String) -> Command) -> Command {
    if arg.is_empty() {
        Command::Usage(usage)
    } else {
        make(arg.to_string())
    }
}
