//! Line-oriented command session over an [`ActionManager`].
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `open NAME` | open a demo scan and select it |
//! | `select NAME` | select an open scan |
//! | `close [NAME]` | close a scan (default: the selected one) |
//! | `models` | list open scans |
//! | `invoke ACTION [X Y Z]` | run an action, optionally at a point |
//! | `undo` / `redo` | step through the history |
//! | `actions` | list actions with their state |
//! | `state ACTION` | show one action's state |
//! | `wait` | block until every asynchronous job is done |
//! | `help` | list commands |
//! | `quit` | end the session |
//!
//! A bare action name is shorthand for `invoke ACTION`.

use crate::demo::{self, Scan};
use anyhow::{anyhow, bail, Context, Result};
use facet_action::{AppContext, Invocation, StatusSink};
use facet_model::{ModelResource, UndoStack};
use facet_runtime::config::FacetConfig;
use facet_runtime::{ActionManager, InvokeOutcome, WaveReport};
use facet_types::ModelId;
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Upper bound for `wait` and for draining at the end of a session.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Status sink that queues messages for the session to print.
#[derive(Debug, Default)]
pub struct StatusQueue(Mutex<Vec<String>>);

impl StatusQueue {
    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl StatusSink for StatusQueue {
    fn message(&self, text: &str) {
        self.0.lock().push(text.to_string());
    }
}

/// One interactive or scripted session.
pub struct Session<W: Write> {
    manager: ActionManager,
    status: Arc<StatusQueue>,
    out: W,
}

impl<W: Write> Session<W> {
    /// Builds a manager from `config` and registers the demo and built-in actions.
    ///
    /// # Errors
    ///
    /// Fails if the worker pool cannot start or registration collides.
    pub fn new(config: &FacetConfig, work: Duration, out: W) -> Result<Self> {
        let status = Arc::new(StatusQueue::default());
        let app = AppContext::with_undo(UndoStack::with_max_entries(config.undo.max_entries))
            .with_status(status.clone());

        let mut manager = ActionManager::new(Arc::new(app), config)?;
        for action in demo::actions(work) {
            manager.register(action)?;
        }
        manager.register_builtins()?;
        debug!(actions = manager.actions().count(), "session ready");

        Ok(Self {
            manager,
            status,
            out,
        })
    }

    #[cfg(test)]
    pub fn manager(&self) -> &ActionManager {
        &self.manager
    }

    /// Runs one command line.
    ///
    /// Completed asynchronous jobs are processed afterwards without waiting.
    ///
    /// # Errors
    ///
    /// Unknown commands, bad arguments, and manager errors.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        let result = self.dispatch(command, args);
        let pumped = self.manager.pump();
        self.flush()?;
        let flow = result?;
        pumped?;
        Ok(flow)
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<Flow> {
        match command {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => self.help()?,
            "open" => self.open(args)?,
            "select" => {
                let id = self.model_named(one_arg(args, "select NAME")?)?;
                self.manager.select_model(id)?;
                writeln!(self.out, "selected {}", args[0])?;
            }
            "close" => {
                let id = match args.first() {
                    Some(name) => self.model_named(name)?,
                    None => self
                        .manager
                        .app()
                        .models()
                        .selected_id()
                        .ok_or_else(|| anyhow!("no model selected"))?,
                };
                self.manager.close_model(id)?;
                writeln!(self.out, "closed {id}")?;
            }
            "models" => self.models()?,
            "invoke" => {
                let (name, rest) = args
                    .split_first()
                    .ok_or_else(|| anyhow!("usage: invoke ACTION [X Y Z]"))?;
                self.invoke(name, rest)?;
            }
            "undo" => {
                let outcome = self.manager.undo()?;
                writeln!(self.out, "undid {}", outcome.name)?;
            }
            "redo" => {
                let outcome = self.manager.redo()?;
                writeln!(self.out, "redid {}", outcome.name)?;
            }
            "actions" => self.actions()?,
            "state" => self.state(one_arg(args, "state ACTION")?)?,
            "wait" => {
                self.manager.wait_idle(DRAIN_TIMEOUT)?;
                writeln!(self.out, "idle")?;
            }
            name if self.manager.spec(name).is_some() => self.invoke(name, args)?,
            other => bail!("unknown command: {other}"),
        }
        Ok(Flow::Continue)
    }

    fn open(&mut self, args: &[&str]) -> Result<()> {
        let name = one_arg(args, "open NAME")?;
        if self.find_model(name).is_some() {
            bail!("model already open: {name}");
        }
        let model = self
            .manager
            .open_model(ModelResource::new(name, Scan::sample()))?;
        writeln!(self.out, "opened {name} ({})", model.id())?;
        Ok(())
    }

    fn invoke(&mut self, name: &str, coords: &[&str]) -> Result<()> {
        let mut inv = Invocation::user();
        if !coords.is_empty() {
            inv = inv.with_point(parse_point(coords)?);
        }
        let outcome = self.manager.invoke(name, inv)?;
        let text = match outcome {
            InvokeOutcome::NotAllowed => "not allowed".to_string(),
            InvokeOutcome::Cancelled => "cancelled".to_string(),
            InvokeOutcome::Busy => "busy".to_string(),
            InvokeOutcome::Queued => "queued".to_string(),
            InvokeOutcome::Dispatched => "dispatched".to_string(),
            InvokeOutcome::Completed(events) => format!("completed [{events}]"),
        };
        writeln!(self.out, "{name}: {text}")?;
        Ok(())
    }

    fn models(&mut self) -> Result<()> {
        let registry = self.manager.app().models();
        let selected = registry.selected_id();
        for model in registry.all() {
            let marker = if Some(model.id()) == selected { "*" } else { " " };
            writeln!(self.out, "{marker} {} {}", model.name(), model.id())?;
        }
        Ok(())
    }

    fn actions(&mut self) -> Result<()> {
        let mut lines = Vec::new();
        for (spec, state) in self.manager.actions() {
            let label = self
                .manager
                .label(spec.id().as_str())
                .unwrap_or_else(|| spec.name().to_string());
            lines.push(format!(
                "{:<16} {:<8} {}{}{}",
                spec.id().as_str(),
                if state.enabled { "enabled" } else { "disabled" },
                label,
                if state.checked { " [x]" } else { "" },
                if state.busy { " (busy)" } else { "" },
            ));
        }
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn state(&mut self, name: &str) -> Result<()> {
        let state = self
            .manager
            .state(name)
            .ok_or_else(|| anyhow!("unknown action: {name}"))?;
        writeln!(
            self.out,
            "{name}: enabled={} checked={} busy={} phase={:?}",
            state.enabled, state.checked, state.busy, state.phase
        )?;
        Ok(())
    }

    fn help(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "commands: open NAME, select NAME, close [NAME], models, invoke ACTION [X Y Z], \
             undo, redo, actions, state ACTION, wait, help, quit"
        )?;
        Ok(())
    }

    fn find_model(&self, name: &str) -> Option<ModelId> {
        self.manager
            .app()
            .models()
            .all()
            .into_iter()
            .find(|m| m.name() == name)
            .map(|m| m.id())
    }

    fn model_named(&self, name: &str) -> Result<ModelId> {
        self.find_model(name)
            .ok_or_else(|| anyhow!("no open model named {name}"))
    }

    /// Prints queued status messages and finished waves.
    fn flush(&mut self) -> Result<()> {
        for message in self.status.drain() {
            writeln!(self.out, "status: {message}")?;
        }
        for report in self.manager.take_reports() {
            print_report(&mut self.out, &report)?;
        }
        Ok(())
    }

    /// Waits for outstanding jobs and prints what they caused.
    ///
    /// # Errors
    ///
    /// Propagation errors or a timeout.
    pub fn drain(&mut self) -> Result<()> {
        let waited = self.manager.wait_idle(DRAIN_TIMEOUT);
        self.flush()?;
        waited.context("waiting for background actions")
    }

    /// Reads commands from `input` until EOF or `quit`.
    ///
    /// Errors from single commands are reported and do not end the session.
    /// Returns the number of failed commands.
    ///
    /// # Errors
    ///
    /// I/O errors on `input` or the output.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<usize> {
        let mut failures = 0;
        for line in input.lines() {
            let line = line.context("reading command")?;
            match self.execute(&line) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    failures += 1;
                    writeln!(self.out, "error: {e:#}")?;
                }
            }
        }
        self.drain()?;
        Ok(failures)
    }

    /// Consumes the session, returning the output sink.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }
}

fn one_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str> {
    match args {
        [one] => Ok(*one),
        _ => bail!("usage: {usage}"),
    }
}

fn parse_point(coords: &[&str]) -> Result<[f64; 3]> {
    let [x, y, z] = coords else {
        bail!("expected three coordinates, got {}", coords.len());
    };
    let parse = |s: &str| {
        s.parse::<f64>()
            .with_context(|| format!("invalid coordinate: {s}"))
    };
    Ok([parse(*x)?, parse(*y)?, parse(*z)?])
}

fn print_report<W: Write>(out: &mut W, report: &WaveReport) -> Result<()> {
    if report.broadcasts == 0 && report.origin.is_none() {
        return Ok(());
    }
    let chain = report
        .invoked
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    writeln!(
        out,
        "{}: {} [{}]{}",
        report.wave,
        if chain.is_empty() { "broadcast" } else { chain.as_str() },
        report.events,
        if report.aborted { " aborted" } else { "" }
    )?;
    Ok(())
}
