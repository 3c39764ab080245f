//! Newline-delimited JSON command session.
//!
//! Each input line is one request object with an `op` field; each request
//! gets exactly one response line. Times are integer pairs `[begin, end]` in
//! the request's `unit` (or the configured default unit).

use std::io;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value as Json, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::allocation::{Policy, Priority, ResourceAllocation};
use crate::clock::Clock;
use crate::config::Config;
use crate::config_payload::{FromStrParser, PayloadParser};
use crate::descriptor;
use crate::duration;
use crate::engine::{self, Remaining};
use crate::error::{Error, Result};
use crate::ledger::TransitionLedger;
use crate::lifecycle::{State, TaskState};
use crate::model::{Span, TimeUnit};
use crate::observability::SESSION_REQUESTS_TOTAL;
use crate::payload::{Payload, SchemaRegistry};
use crate::repr::ShortAllocation;
use crate::value::{self, Parsed};

/// `[begin, end]` in the request unit.
type Window = [i64; 2];

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    unit: Option<TimeUnit>,
    #[serde(flatten)]
    request: Request,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    First {
        goal: Window,
        range: Window,
        #[serde(default)]
        blocking: Vec<Window>,
    },
    Max {
        goal: Window,
        range: Window,
        #[serde(default)]
        blocking: Vec<Window>,
    },
    Complete {
        goal: Window,
        range: Window,
        #[serde(default)]
        blocking: Vec<Window>,
    },
    Remaining {
        goal: Window,
        #[serde(default)]
        blocking: Vec<Window>,
    },
    IncludeNow {
        span: Window,
    },
    Parse {
        text: String,
    },
    Format {
        duration: i64,
        priority: Priority,
        policy: Policy,
        resources: Vec<String>,
    },
    Transition {
        state: State,
        #[serde(default)]
        task: Option<Ulid>,
        #[serde(default)]
        payload: Option<String>,
    },
    Duration {
        text: String,
    },
    Payload {
        text: String,
        #[serde(default)]
        ignore: Vec<String>,
    },
}

impl Request {
    fn label(&self) -> &'static str {
        match self {
            Request::First { .. } => "first",
            Request::Max { .. } => "max",
            Request::Complete { .. } => "complete",
            Request::Remaining { .. } => "remaining",
            Request::IncludeNow { .. } => "include_now",
            Request::Parse { .. } => "parse",
            Request::Format { .. } => "format",
            Request::Transition { .. } => "transition",
            Request::Duration { .. } => "duration",
            Request::Payload { .. } => "payload",
        }
    }
}

fn to_span(window: Window, unit: TimeUnit) -> Result<Span> {
    let [begin, end] = window;
    Span::checked(unit.to_micros(begin), unit.to_micros(end))
}

fn to_spans(windows: &[Window], unit: TimeUnit) -> Result<Vec<Span>> {
    windows.iter().map(|w| to_span(*w, unit)).collect()
}

fn window_json(span: Option<Span>, unit: TimeUnit) -> Json {
    match span {
        Some(s) => {
            let (b, e) = s.to_units(unit);
            json!([b, e])
        }
        None => Json::Null,
    }
}

fn error_json(e: &dyn std::fmt::Display) -> Json {
    json!({ "ok": false, "error": e.to_string() })
}

/// Per-stream state: configuration, time source, known payload types and the
/// transitions seen so far.
pub struct Session<C: Clock> {
    config: Config,
    clock: C,
    registry: SchemaRegistry,
    ledger: TransitionLedger,
}

impl<C: Clock> Session<C> {
    pub fn new(config: Config, clock: C) -> Self {
        Self {
            config,
            clock,
            registry: SchemaRegistry::new(),
            ledger: TransitionLedger::new(),
        }
    }

    /// Payload types that `transition` requests may name as `.<type>:{...}`.
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn ledger(&self) -> &TransitionLedger {
        &self.ledger
    }

    /// Answer one request line. Never fails; problems become error responses.
    pub fn handle_line(&self, line: &str) -> Json {
        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("malformed request {line:?}: {e}");
                metrics::counter!(SESSION_REQUESTS_TOTAL, "op" => "unknown", "status" => "error")
                    .increment(1);
                return error_json(&format!("malformed request: {e}"));
            }
        };
        let unit = envelope.unit.unwrap_or(self.config.default_unit);
        let op = envelope.request.label();
        match self.dispatch(envelope.request, unit) {
            Ok(response) => {
                metrics::counter!(SESSION_REQUESTS_TOTAL, "op" => op, "status" => "ok").increment(1);
                response
            }
            Err(e) => {
                debug!("{op} failed: {e}");
                metrics::counter!(SESSION_REQUESTS_TOTAL, "op" => op, "status" => "error")
                    .increment(1);
                error_json(&e)
            }
        }
    }

    fn dispatch(&self, request: Request, unit: TimeUnit) -> Result<Json> {
        match request {
            Request::First { goal, range, blocking } => {
                let blocking = to_spans(&blocking, unit)?;
                let found = engine::find_first(&to_span(goal, unit)?, &to_span(range, unit)?, &blocking);
                Ok(json!({ "ok": true, "slot": window_json(found, unit) }))
            }
            Request::Max { goal, range, blocking } => {
                let blocking = to_spans(&blocking, unit)?;
                let found = engine::find_max(&to_span(goal, unit)?, &to_span(range, unit)?, &blocking);
                Ok(json!({ "ok": true, "slot": window_json(found, unit) }))
            }
            Request::Complete { goal, range, blocking } => {
                let blocking = to_spans(&blocking, unit)?;
                let found =
                    engine::find_complete(&to_span(goal, unit)?, &to_span(range, unit)?, &blocking);
                Ok(json!({ "ok": true, "slot": window_json(found, unit) }))
            }
            Request::Remaining { goal, blocking } => {
                let blocking = to_spans(&blocking, unit)?;
                let response = match engine::remaining(&to_span(goal, unit)?, &blocking, &self.clock) {
                    Remaining::Free(slot) => json!({
                        "ok": true,
                        "slot": window_json(Some(slot), unit),
                        "reason": "free",
                    }),
                    Remaining::Blocked(by) => json!({
                        "ok": true,
                        "slot": null,
                        "reason": "blocked",
                        "blocked_by": window_json(Some(by), unit),
                    }),
                    Remaining::Exhausted => json!({
                        "ok": true,
                        "slot": null,
                        "reason": "exhausted",
                    }),
                };
                Ok(response)
            }
            Request::IncludeNow { span } => {
                let stretched = engine::include_now(&to_span(span, unit)?, &self.clock);
                Ok(json!({ "ok": true, "slot": window_json(Some(stretched), unit) }))
            }
            Request::Parse { text } => {
                let alloc = descriptor::parse_allocation(&text, &self.clock)?;
                Ok(json!({
                    "ok": true,
                    "slot": window_json(Some(alloc.slot), unit),
                    "priority": alloc.priority.as_str(),
                    "policy": alloc.policy.as_str(),
                    "state": alloc.state.as_str(),
                    "resources": alloc.resource_ids(),
                    "repr": ShortAllocation::new(Some(&alloc), &self.clock).to_string(),
                }))
            }
            Request::Format { duration, priority, policy, resources } => {
                if duration < 0 {
                    return Err(Error::InvalidDescriptor(format!("negative duration {duration}")));
                }
                let slot = Span::relative(0, duration, unit, &self.clock);
                let alloc = ResourceAllocation::new(slot, policy, priority, resources)?;
                Ok(json!({ "ok": true, "text": descriptor::format_allocation(&alloc) }))
            }
            Request::Transition { state, task, payload } => {
                let built = match payload {
                    None => TaskState::build(state),
                    Some(text) => TaskState::build_with_payload(state, self.payload_from_text(text)?),
                };
                let mut response = json!({
                    "ok": true,
                    "state": built.state.as_str(),
                    "origin": built.origin.as_str(),
                    "serial": built.serial,
                    "schema": built.wire_schema,
                    "payload_bytes": built.payload.len(),
                });
                if let Some(task) = task {
                    let delivery = self.ledger.observe(task, built);
                    response["delivery"] = json!(format!("{delivery:?}").to_lowercase());
                }
                Ok(response)
            }
            Request::Duration { text } => {
                let value = duration::parse(&text, unit)?;
                Ok(json!({ "ok": true, "value": value, "unit": unit.short_name() }))
            }
            Request::Payload { text, ignore } => {
                let parser: PayloadParser<FromStrParser<String>, _> =
                    PayloadParser::new(FromStrParser::new(), FromStrParser::<String>::new());
                let parser = parser.with_ignored(ignore);
                Ok(json!({ "ok": true, "entries": parser.parse_payload(&text) }))
            }
        }
    }

    /// A registered `.<type>:{...}` literal becomes that type, anything else
    /// travels as UTF-8 text.
    fn payload_from_text(&self, text: String) -> Result<Payload> {
        match value::parse_value(&text, &self.registry) {
            Parsed::Typed(payload) => Ok(payload),
            _ => crate::payload::serialize(&text),
        }
    }

    /// Serve requests from `reader` until it is exhausted.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let codec = LinesCodec::new_with_max_length(self.config.max_line_bytes);
        let mut lines = FramedRead::new(reader, codec);
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(item) = lines.next().await {
            let response = match item {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(&line),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("request line longer than {} bytes dropped", self.config.max_line_bytes);
                    error_json(&"request line too long")
                }
                Err(LinesCodecError::Io(e)) => return Err(e),
            };
            sink.send(response.to_string()).await.map_err(into_io)?;
        }
        Ok(())
    }
}

fn into_io(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::Io(e) => e,
        LinesCodecError::MaxLineLengthExceeded => io::Error::new(io::ErrorKind::InvalidData, e),
    }
}

/// Run a session with no registered payload types over one reader/writer pair.
pub async fn process_stream<R, W, C>(reader: R, writer: W, config: Config, clock: C) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    Session::new(config, clock).run(reader, writer).await
}
