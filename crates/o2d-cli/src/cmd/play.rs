use crate::output::write_json_line;
use crate::view;
use anyhow::Context;
use o2d_core::sequencer::{Advance, Sequencer};
use o2d_core::SimError;
use std::io::{BufRead, Write};
use std::path::Path;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Advance,
    /// Raw argument of `fix`, interpreted against the scenario by [`resolve_target`].
    Fix(String),
    Status,
    Summary,
    Reset,
    Help,
    Quit,
    Empty,
}

impl std::str::FromStr for Input {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str() {
            "" => Ok(Input::Empty),
            "advance" | "next" | "proceed" => Ok(Input::Advance),
            "fix" | "resolve" if rest.is_empty() => {
                Err("fix needs a reason or a pending number".to_string())
            }
            "fix" | "resolve" => Ok(Input::Fix(rest.to_string())),
            "status" => Ok(Input::Status),
            "summary" | "log" => Ok(Input::Summary),
            "reset" => Ok(Input::Reset),
            "help" | "?" => Ok(Input::Help),
            "quit" | "exit" => Ok(Input::Quit),
            other => Err(format!("unknown command '{other}' (type 'help')")),
        }
    }
}

/// Turn the text after `fix` into the exact `(stage, reason)` pair the
/// sequencer expects. Tried in order:
///
/// 1. a reason of the active stage, matched case-insensitively
/// 2. `#n` or `n`, the n-th pending delay
/// 3. `stage:reason` where `stage` names a scenario stage
///
/// Anything else is passed through against the active stage so the
/// sequencer reports it.
fn resolve_target(seq: &Sequencer, text: &str) -> Result<(String, String), String> {
    let active = seq
        .current_stage()
        .ok_or_else(|| SimError::AlreadyDelivered.to_string())?;

    if let Some(reason) = find_reason(seq, &active.name, text) {
        return Ok((active.name.clone(), reason));
    }

    if let Ok(n) = text.strip_prefix('#').unwrap_or(text).trim().parse::<usize>() {
        let pending = seq.pending();
        return n
            .checked_sub(1)
            .and_then(|i| pending.get(i))
            .map(|d| (active.name.clone(), d.reason.clone()))
            .ok_or_else(|| format!("no pending delay #{n} ({} pending)", pending.len()));
    }

    if let Some((stage, reason)) = text.split_once(':') {
        if let Some(stage) = find_stage(seq, stage.trim()) {
            let reason = reason.trim();
            let canonical =
                find_reason(seq, &stage, reason).unwrap_or_else(|| reason.to_string());
            return Ok((stage, canonical));
        }
    }

    Ok((active.name.clone(), text.to_string()))
}

fn find_reason(seq: &Sequencer, stage: &str, reason: &str) -> Option<String> {
    seq.scenario()
        .stage(stage)?
        .delays
        .iter()
        .find(|d| d.reason.eq_ignore_ascii_case(reason))
        .map(|d| d.reason.clone())
}

fn find_stage(seq: &Sequencer, name: &str) -> Option<String> {
    seq.scenario()
        .stages
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .map(|s| s.name.clone())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    scenario: Option<&Path>,
    permissive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut seq = super::open_session(root, scenario, permissive)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    session_loop(&mut seq, stdin.lock(), &mut out, json).context("simulator session failed")
}

/// Drive one session from line-oriented input until `quit` or EOF.
pub fn session_loop<R: BufRead, W: Write>(
    seq: &mut Sequencer,
    input: R,
    out: &mut W,
    json: bool,
) -> anyhow::Result<()> {
    if !json {
        write!(out, "{}", view::welcome(seq.scenario()))?;
        write!(out, "{}", view::status(seq))?;
    }

    for line in input.lines() {
        let line = line?;
        let cmd = match line.parse::<Input>() {
            Ok(cmd) => cmd,
            Err(msg) => {
                report_error(out, json, &msg)?;
                continue;
            }
        };
        tracing::debug!(?cmd, "input");
        match cmd {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => {
                if json {
                    write_json_line(out, &serde_json::json!({ "help": view::help() }))?;
                } else {
                    write!(out, "{}", view::help())?;
                }
            }
            Input::Status | Input::Summary if json => write_json_line(out, &seq.summary())?,
            Input::Status => write!(out, "{}", view::status(seq))?,
            Input::Summary => write!(out, "{}", view::summary(&seq.summary()))?,
            Input::Reset => {
                seq.reset();
                if json {
                    write_json_line(out, &serde_json::json!({ "reset": true }))?;
                } else {
                    writeln!(out, "Order reset.")?;
                    write!(out, "{}", view::status(seq))?;
                }
            }
            Input::Advance => match seq.advance() {
                Ok(outcome) if json => write_json_line(out, &outcome)?,
                Ok(outcome) => {
                    let step = seq.state().stage_index + 1;
                    write!(out, "{}", view::advance(&outcome, seq.scenario().unit, step))?;
                    if matches!(outcome, Advance::Delivered { .. }) {
                        write!(out, "{}", view::summary(&seq.summary()))?;
                    }
                }
                Err(e) => report_error(out, json, &e.to_string())?,
            },
            Input::Fix(target) => {
                let result = resolve_target(seq, &target).and_then(|(stage, reason)| {
                    seq.resolve(&stage, &reason).map_err(|e| e.to_string())
                });
                match result {
                    Ok(r) if json => write_json_line(out, &r)?,
                    Ok(r) => write!(out, "{}", view::resolution(&r, seq.scenario().unit))?,
                    Err(msg) => report_error(out, json, &msg)?,
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn report_error<W: Write>(out: &mut W, json: bool, msg: &str) -> anyhow::Result<()> {
    if json {
        write_json_line(out, &serde_json::json!({ "error": msg }))
    } else {
        writeln!(out, "error: {msg}")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use o2d_core::scenario::{DelayDefinition, Scenario, StageDef};

    fn two_stage() -> Sequencer {
        Sequencer::new(Scenario::new(
            "two-stage",
            vec![
                StageDef::new("A", "A done")
                    .with_delay(DelayDefinition::new("low-stock", "restock", 1, 1, ""))
                    .with_delay(DelayDefinition::new("no-dock", "find dock", 2, 1, "")),
                StageDef::new("B", "B done"),
            ],
        ))
        .unwrap()
    }

    fn drive(seq: &mut Sequencer, script: &str, json: bool) -> String {
        let mut out = Vec::new();
        session_loop(seq, script.as_bytes(), &mut out, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!("next".parse::<Input>().unwrap(), Input::Advance);
        assert_eq!("  ADVANCE ".parse::<Input>().unwrap(), Input::Advance);
        assert_eq!("".parse::<Input>().unwrap(), Input::Empty);
        assert_eq!("exit".parse::<Input>().unwrap(), Input::Quit);
        assert!("teleport".parse::<Input>().is_err());
        assert!("fix".parse::<Input>().is_err());
    }

    #[test]
    fn parse_fix_keeps_raw_text() {
        assert_eq!(
            "fix 2".parse::<Input>().unwrap(),
            Input::Fix("2".to_string())
        );
        assert_eq!(
            "fix In Transit: CD weekly off".parse::<Input>().unwrap(),
            Input::Fix("In Transit: CD weekly off".to_string())
        );
    }

    fn single_stage(reasons: &[&str]) -> Sequencer {
        let mut stage = StageDef::new("A", "A done");
        for r in reasons {
            stage = stage.with_delay(DelayDefinition::new(*r, "act", 1, 1, ""));
        }
        Sequencer::new(Scenario::new("single", vec![stage, StageDef::new("B", "")])).unwrap()
    }

    #[test]
    fn fix_reason_containing_colon() {
        let mut seq = single_stage(&["Traffic: road blocks"]);
        let out = drive(&mut seq, "advance\nfix Traffic: road blocks\n", false);
        assert!(out.contains("Fixed: Traffic: road blocks in A"), "{out}");
        assert!(seq.pending().is_empty());
    }

    #[test]
    fn fix_numeric_reason_by_name() {
        let mut seq = single_stage(&["7", "2"]);
        let out = drive(&mut seq, "advance\nfix 7\nadvance\nfix 2\n", false);
        assert!(!out.contains("error:"), "{out}");
        assert!(seq.pending().is_empty());
        assert_eq!(seq.state().elapsed[0], 2);
    }

    #[test]
    fn fix_by_position_and_stage_prefix() {
        let mut seq = two_stage();
        drive(&mut seq, "advance\nfix #1\nadvance\nfix a: NO-DOCK\n", false);
        assert!(seq.pending().is_empty());
        assert_eq!(seq.state().elapsed[0], 3);

        let mut seq = two_stage();
        let out = drive(&mut seq, "advance\nfix B: low-stock\n", false);
        assert!(out.contains("error: unknown stage or reason: 'B' / 'low-stock'"), "{out}");
    }

    #[test]
    fn loop_walks_to_delivery() {
        let mut seq = two_stage();
        let out = drive(
            &mut seq,
            "advance\nfix low-stock\nnext\nfix 1\nadvance\nadvance\n",
            false,
        );
        assert!(out.contains("Delay in A: low-stock"));
        assert!(out.contains("Fixed: no-dock in A -> +2 hrs"));
        assert!(out.contains("A completed at 12:00 PM: A done"));
        assert!(out.contains("Delivery completed at 01-Aug-2025 12:00 PM"));
        assert!(out.contains("Total: 3 hours, 2 touchpoint(s)"));
        assert!(seq.state().delivered);
    }

    #[test]
    fn loop_reports_errors_and_continues() {
        let mut seq = two_stage();
        let out = drive(&mut seq, "advance\nadvance\nfix flood\nfix 5\nwarp\n", false);
        assert!(out.contains("error: delay 'low-stock' in stage 'A' must be fixed before advancing"));
        assert!(out.contains("error: unknown stage or reason: 'A' / 'flood'"));
        assert!(out.contains("error: no pending delay #5 (1 pending)"));
        assert!(out.contains("error: unknown command 'warp'"));
        assert_eq!(seq.state().encountered.len(), 1);
    }

    #[test]
    fn fix_matches_case_insensitively() {
        let mut seq = two_stage();
        drive(&mut seq, "advance\nfix LOW-STOCK\n", false);
        assert!(seq.pending().is_empty());
        assert_eq!(seq.state().elapsed[0], 1);
    }

    #[test]
    fn quit_stops_reading() {
        let mut seq = two_stage();
        drive(&mut seq, "quit\nadvance\n", false);
        assert!(seq.state().encountered.is_empty());
    }

    #[test]
    fn reset_restarts_the_order() {
        let mut seq = two_stage();
        let out = drive(&mut seq, "advance\nfix low-stock\nreset\n", false);
        assert!(out.contains("Order reset."));
        assert_eq!(seq.state(), &o2d_core::sequencer::SequencerState::new(2));
    }

    #[test]
    fn json_mode_emits_one_object_per_reply() {
        let mut seq = two_stage();
        let out = drive(&mut seq, "advance\nfix low-stock\nadvance\nsummary\n", true);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["outcome"], "delay_surfaced");
        assert_eq!(lines[0]["delay"]["reason"], "low-stock");
        assert_eq!(lines[1]["stage_elapsed"], 1);
        assert_eq!(lines[2]["delay"]["reason"], "no-dock");
        assert_eq!(lines[3]["status"], "awaiting_resolve");
        assert_eq!(lines[3]["total_elapsed"], 1);
    }

    #[test]
    fn after_delivery_fix_reports_delivered() {
        let mut seq = Sequencer::new(Scenario::new("one", vec![StageDef::new("Only", "")]))
            .unwrap();
        let out = drive(&mut seq, "advance\nfix anything\nadvance\n", false);
        assert!(out.contains("Only completed"));
        assert!(out.contains("error: order already delivered"));
    }
}
