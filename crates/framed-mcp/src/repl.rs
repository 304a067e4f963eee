//! Interactive REPL for the framed MCP server.
//!
//! Launch with `framed-mcp repl` to enter interactive mode. Every command is
//! encoded as a Content-Length frame and pushed through the same transport
//! the stdio server uses, so what you see is exactly what a client would
//! receive. Type `/help` for available commands, Tab for completion.

use std::io::Cursor;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::{json, Value};

use mcp_frame::{encode_frame, FrameReader};

use crate::config::ServerConfig;
use crate::protocol::ProtocolHandler;
use crate::tools::ToolRegistry;
use crate::transport::{SessionEnd, StdioTransport};
use crate::types::{JsonRpcNotification, JsonRpcRequest, MCP_VERSION};

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/initialize", "Send initialize"),
    ("/ping", "Send ping"),
    ("/tools", "Send tools/list"),
    ("/call", "Call a tool: /call <name> [json arguments]"),
    ("/echo", "Call the echo tool: /echo <text>"),
    ("/send", "Send a request: /send <method> [json params]"),
    ("/notify", "Send a notification: /notify <method> [json params]"),
    ("/raw", "Frame arbitrary text as a payload"),
    ("/shutdown", "Send shutdown"),
    ("/info", "Show server capabilities and tools"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// Methods offered for completion after /send and /notify.
const METHODS: &[&str] = &[
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "shutdown",
    "notifications/initialized",
    "notifications/cancelled",
];

/// REPL helper for tab completion.
#[derive(Default)]
struct FramedHelper {
    tool_names: Vec<String>,
}

impl Completer for FramedHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        if args.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let candidates: Vec<&str> = match cmd {
            "/send" | "/notify" => METHODS.to_vec(),
            "/call" => self.tool_names.iter().map(String::as_str).collect(),
            _ => return Ok((pos, Vec::new())),
        };

        let prefix_start = input.len() - args.len();
        let matches: Vec<Pair> = candidates
            .into_iter()
            .filter(|c| c.starts_with(args))
            .map(|c| Pair {
                display: c.to_string(),
                replacement: format!("{c} "),
            })
            .collect();
        Ok((prefix_start, matches))
    }
}

impl Hinter for FramedHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for FramedHelper {}
impl Validator for FramedHelper {}
impl Helper for FramedHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// An in-process session: the transport plus the next request id.
struct ReplSession {
    transport: StdioTransport,
    next_id: i64,
}

impl ReplSession {
    fn new(config: ServerConfig) -> Self {
        let handler =
            ProtocolHandler::with_server_info(ToolRegistry::with_builtin_tools(), config.server_info);
        Self {
            transport: StdioTransport::new(handler).with_max_frame_len(config.max_frame_len),
            next_id: 1,
        }
    }

    fn request(&mut self, method: &str, params: Option<Value>) {
        let id = self.next_id;
        self.next_id += 1;
        match serde_json::to_vec(&JsonRpcRequest::new(id, method, params)) {
            Ok(payload) => self.exchange(&payload),
            Err(e) => eprintln!("  Cannot encode request: {e}"),
        }
    }

    fn notify(&mut self, method: &str, params: Option<Value>) {
        match serde_json::to_vec(&JsonRpcNotification::new(method, params)) {
            Ok(payload) => self.exchange(&payload),
            Err(e) => eprintln!("  Cannot encode notification: {e}"),
        }
    }

    /// Frame one payload, run it through the transport, print every reply frame.
    fn exchange(&mut self, payload: &[u8]) {
        let input = Cursor::new(encode_frame(payload));
        let mut output = Vec::new();

        match self.transport.serve(input, &mut output) {
            Ok(SessionEnd::EndOfStream) => {}
            Ok(SessionEnd::EmptyFrame) => eprintln!("  \x1b[90m(empty frame ends the session)\x1b[0m"),
            Ok(SessionEnd::MalformedFrame(e)) => eprintln!("  Malformed frame: {e}"),
            Err(e) => {
                eprintln!("  Transport error: {e}");
                return;
            }
        }

        let mut replies = 0;
        for frame in FrameReader::new(output.as_slice()) {
            replies += 1;
            match frame {
                Ok(frame) => print_payload(frame.payload()),
                Err(e) => eprintln!("  Unreadable reply frame: {e}"),
            }
        }
        if replies == 0 {
            eprintln!("  \x1b[90m(no reply)\x1b[0m");
        }
    }
}

fn print_payload(payload: &[u8]) {
    let pretty = serde_json::from_slice::<Value>(payload)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned());
    eprintln!();
    for line in pretty.lines() {
        eprintln!("  {line}");
    }
    eprintln!();
}

/// Split `<word> [json]` into the word and the parsed JSON, if any.
fn parse_target(args: &str) -> Result<(&str, Option<Value>), String> {
    let (target, rest) = args.split_once(' ').unwrap_or((args, ""));
    if target.is_empty() {
        return Err("missing name".to_string());
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok((target, None));
    }
    serde_json::from_str(rest)
        .map(|v| (target, Some(v)))
        .map_err(|e| format!("invalid JSON: {e}"))
}

/// Run the interactive REPL.
pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mframed-mcp v{}\x1b[0m \x1b[90m\u{2014} Content-Length framed MCP\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut session = ReplSession::new(config);
    let tool_names = session
        .transport
        .handler()
        .tools()
        .list_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();

    let mut rl: Editor<FramedHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(rl_config)?;
    rl.set_helper(Some(FramedHelper { tool_names }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".framed_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mmcp>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(&session),
                    "initialize" | "init" => session.request(
                        "initialize",
                        Some(json!({
                            "protocolVersion": MCP_VERSION,
                            "capabilities": {},
                            "clientInfo": {"name": "framed-mcp-repl", "version": env!("CARGO_PKG_VERSION")},
                        })),
                    ),
                    "ping" => session.request("ping", None),
                    "tools" => session.request("tools/list", None),
                    "shutdown" => session.request("shutdown", None),
                    "echo" => session.request(
                        "tools/call",
                        Some(json!({"name": "echo", "arguments": {"text": args}})),
                    ),
                    "call" => match parse_target(args) {
                        Ok((name, arguments)) => {
                            let mut params = json!({ "name": name });
                            if let Some(arguments) = arguments {
                                params["arguments"] = arguments;
                            }
                            session.request("tools/call", Some(params));
                        }
                        Err(e) => eprintln!("  Usage: /call <name> [json arguments] ({e})"),
                    },
                    "send" => match parse_target(args) {
                        Ok((method, params)) => session.request(method, params),
                        Err(e) => eprintln!("  Usage: /send <method> [json params] ({e})"),
                    },
                    "notify" => match parse_target(args) {
                        Ok((method, params)) => session.notify(method, params),
                        Err(e) => eprintln!("  Usage: /notify <method> [json params] ({e})"),
                    },
                    "raw" => session.exchange(args.as_bytes()),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, method names, and tool names.");
    eprintln!();
}

fn cmd_info(session: &ReplSession) {
    let handler = session.transport.handler();
    let capabilities = crate::types::InitializeResult::default_result();
    let tools = handler.tools().list_tools();
    eprintln!();
    eprintln!(
        "  Server:      {} v{}",
        capabilities.server_info.name, capabilities.server_info.version
    );
    eprintln!("  Protocol:    {}", capabilities.protocol_version);
    eprintln!("  Initialized: {}", handler.is_initialized());
    eprintln!("  Tools:       {}", tools.len());
    for tool in &tools {
        eprintln!("    {:<28} {}", tool.name, tool.description);
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_name_only() {
        let (name, params) = parse_target("echo").unwrap();
        assert_eq!(name, "echo");
        assert!(params.is_none());
    }

    #[test]
    fn test_parse_target_with_json() {
        let (name, params) = parse_target(r#"echo {"text": "hi"}"#).unwrap();
        assert_eq!(name, "echo");
        assert_eq!(params.unwrap()["text"], "hi");
    }

    #[test]
    fn test_parse_target_rejects_bad_json() {
        assert!(parse_target("echo {oops").is_err());
        assert!(parse_target("").is_err());
    }

    #[test]
    fn test_session_ids_increase() {
        let mut session = ReplSession::new(ServerConfig::default());
        session.request("initialize", None);
        session.request("ping", None);
        assert_eq!(session.next_id, 3);
        assert!(session.transport.handler().is_initialized());
    }
}
