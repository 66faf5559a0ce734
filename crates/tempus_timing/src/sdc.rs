//! SDC constraint file reader.
//!
//! Reads the subset of Synopsys Design Constraints that the constraint
//! verifier needs:
//!
//! - `create_clock`, `create_generated_clock`
//! - `set_input_delay`, `set_output_delay`
//! - `set_max_delay`
//!
//! The reader is line based (one command per line, backslash continuation
//! supported) and does not interpret Tcl. Object queries such as
//! `[get_ports clk]` are reduced to the names they contain; `[all_inputs]`
//! and `[all_outputs]` become the `*` wildcard. Commands that affect delay
//! calculation but not constraint coverage (`set_load`, `set_clock_latency`,
//! ...) are skipped quietly, as are the path exceptions other than
//! `set_max_delay`, which do not change whether an endpoint is constrained.
//! Anything else is reported and skipped.

use crate::constraints::{
    ClockConstraint, GeneratedClock, IoDelay, MaxDelayPath, TimingConstraints,
};
use tempus_common::{Ident, Interner};
use tempus_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};

/// SDC commands with no bearing on constraint coverage.
const IGNORED_COMMANDS: &[&str] = &[
    "current_design",
    "set_units",
    "set_load",
    "set_driving_cell",
    "set_input_transition",
    "set_clock_latency",
    "set_clock_uncertainty",
    "set_clock_transition",
    "set_propagated_clock",
    "set_clock_groups",
    "set_timing_derate",
    "set_max_fanout",
    "set_max_transition",
    "set_false_path",
    "set_multicycle_path",
    "set_min_delay",
];

/// Reads an SDC script into [`TimingConstraints`].
///
/// `file` names the script in diagnostics. Lines starting with `#` are
/// comments. Problems are reported to `sink` as warnings and the offending
/// command is skipped; reading always continues to the end.
pub fn parse_sdc(
    source: &str,
    file: &str,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> TimingConstraints {
    let mut constraints = TimingConstraints::new();

    for (line_no, line) in logical_lines(source) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens = tokenize_sdc_line(trimmed);
        let Some((&command, args)) = tokens.split_first() else {
            continue;
        };

        let mut cx = CommandContext {
            command,
            location: Location::new(file, line_no),
            interner,
            sink,
        };

        match command {
            "create_clock" => parse_create_clock(args, &mut cx, &mut constraints),
            "create_generated_clock" => {
                parse_create_generated_clock(args, &mut cx, &mut constraints)
            }
            "set_input_delay" => parse_set_io_delay(args, &mut cx, &mut constraints, true),
            "set_output_delay" => parse_set_io_delay(args, &mut cx, &mut constraints, false),
            "set_max_delay" => parse_set_max_delay(args, &mut cx, &mut constraints),
            cmd if IGNORED_COMMANDS.contains(&cmd) => {
                tracing::trace!(command = cmd, line = line_no, "skipping SDC command");
            }
            cmd => {
                cx.warn(1, format!("unrecognized SDC command: `{cmd}`"));
            }
        }
    }

    constraints
}

/// Per-command state shared by the command parsers.
struct CommandContext<'a> {
    command: &'a str,
    location: Location,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
}

impl CommandContext<'_> {
    fn warn(&self, number: u16, message: String) {
        self.sink.emit(
            Diagnostic::warning(DiagnosticCode::new(Category::Sdc, number), message)
                .at(self.location.clone()),
        );
    }

    /// Parses a numeric option value, reporting malformed numbers.
    fn number(&self, flag: &str, value: Option<&&str>) -> Option<f64> {
        let Some(value) = value else {
            self.warn(6, format!("{}: {flag} needs a value", self.command));
            return None;
        };
        match value.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.warn(
                    6,
                    format!("{}: {flag} expects a number, found `{value}`", self.command),
                );
                None
            }
        }
    }

    /// Interns every name in an object token (`a`, `{a b}` or a reduced query).
    fn push_objects(&self, token: &str, out: &mut Vec<Ident>) {
        out.extend(
            token
                .split_whitespace()
                .map(|name| self.interner.get_or_intern(name)),
        );
    }

    fn origin(&self) -> Option<Location> {
        Some(self.location.clone())
    }
}

/// Joins backslash-continued lines, tagging each logical line with the
/// 1-based number of its first physical line.
fn logical_lines(source: &str) -> Vec<(u32, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 0u32;
    let mut continuing = false;

    for (index, line) in source.lines().enumerate() {
        let line_no = index as u32 + 1;
        if !continuing {
            start = line_no;
        } else {
            current.push(' ');
        }
        let trimmed = line.trim_end();
        if let Some(stripped) = trimmed.strip_suffix('\\') {
            current.push_str(stripped);
            continuing = true;
        } else {
            current.push_str(trimmed);
            lines.push((start, std::mem::take(&mut current)));
            continuing = false;
        }
    }
    if continuing {
        lines.push((start, current));
    }

    lines
}

/// Splits an SDC line into tokens.
///
/// Braces and double quotes group words into one token. A bracketed command
/// is reduced to the object names it queries.
fn tokenize_sdc_line(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            ' ' | '\t' => {
                chars.next();
            }
            '{' | '"' => {
                let close = if ch == '{' { '}' } else { '"' };
                chars.next();
                let inner_start = chars.peek().map_or(line.len(), |&(i, _)| i);
                let mut end = inner_start;
                for (i, c) in chars.by_ref() {
                    if c == close {
                        break;
                    }
                    end = i + c.len_utf8();
                }
                tokens.push(&line[inner_start..end]);
            }
            '[' => {
                chars.next();
                let mut depth = 1;
                let mut end = line.len();
                for (i, c) in chars.by_ref() {
                    if c == '[' {
                        depth += 1;
                    } else if c == ']' {
                        depth -= 1;
                        if depth == 0 {
                            end = i;
                            break;
                        }
                    }
                }
                let query = reduce_object_query(&line[start + 1..end]);
                if !query.is_empty() {
                    tokens.push(query);
                }
            }
            _ => {
                let mut end = start + ch.len_utf8();
                for (i, c) in chars.by_ref() {
                    if c == ' ' || c == '\t' {
                        break;
                    }
                    end = i + c.len_utf8();
                }
                tokens.push(&line[start..end]);
            }
        }
    }

    tokens
}

/// Reduces the body of an object query to its names.
fn reduce_object_query(inner: &str) -> &str {
    let inner = inner.trim();
    if matches!(inner, "all_inputs" | "all_outputs") {
        return "*";
    }
    for query in ["get_ports", "get_pins", "get_clocks", "get_cells", "get_nets"] {
        if let Some(rest) = inner.strip_prefix(query) {
            return rest
                .trim()
                .trim_matches(|c| c == '{' || c == '}' || c == '"')
                .trim();
        }
    }
    inner
}

/// Parses `create_clock -period <p> [-name <n>] [-waveform {r f}] [-add] [sources]`.
fn parse_create_clock(
    args: &[&str],
    cx: &mut CommandContext<'_>,
    constraints: &mut TimingConstraints,
) {
    let mut period: Option<f64> = None;
    let mut name: Option<&str> = None;
    let mut waveform: Option<(f64, f64)> = None;
    let mut sources = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "-period" => {
                i += 1;
                period = cx.number("-period", args.get(i));
                if period.is_none() {
                    return;
                }
            }
            "-name" => {
                i += 1;
                name = args.get(i).copied();
            }
            "-waveform" => {
                i += 1;
                let edges: Vec<f64> = args
                    .get(i)
                    .map(|w| w.split_whitespace().filter_map(|e| e.parse().ok()).collect())
                    .unwrap_or_default();
                if let [rise, fall, ..] = edges[..] {
                    waveform = Some((rise, fall));
                } else {
                    cx.warn(6, "create_clock: -waveform needs two edge times".to_string());
                }
            }
            "-add" => {}
            s if !s.starts_with('-') => cx.push_objects(s, &mut sources),
            _ => {}
        }
        i += 1;
    }

    let Some(period_ns) = period else {
        cx.warn(2, "create_clock: missing -period".to_string());
        return;
    };

    let clock_name = match (name, sources.first()) {
        (Some(n), _) => cx.interner.get_or_intern(n),
        (None, Some(&first)) => first,
        (None, None) => {
            cx.warn(7, "create_clock: a virtual clock needs -name".to_string());
            return;
        }
    };

    constraints.clocks.push(ClockConstraint {
        name: clock_name,
        period_ns,
        sources,
        waveform,
        generated: None,
        origin: cx.origin(),
    });
}

/// Parses `create_generated_clock -source <pin> [-name <n>] [-master_clock <c>]
/// [-divide_by <n> | -multiply_by <n>] [-invert] <targets>`.
fn parse_create_generated_clock(
    args: &[&str],
    cx: &mut CommandContext<'_>,
    constraints: &mut TimingConstraints,
) {
    let mut name: Option<&str> = None;
    let mut source: Option<&str> = None;
    let mut master: Option<&str> = None;
    let mut divide_by: Option<u32> = None;
    let mut multiply_by: Option<u32> = None;
    let mut invert = false;
    let mut targets = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "-name" => {
                i += 1;
                name = args.get(i).copied();
            }
            "-source" => {
                i += 1;
                source = args.get(i).copied();
            }
            "-master_clock" => {
                i += 1;
                master = args.get(i).copied();
            }
            "-divide_by" => {
                i += 1;
                divide_by = cx.number("-divide_by", args.get(i)).map(|v| v as u32);
            }
            "-multiply_by" => {
                i += 1;
                multiply_by = cx.number("-multiply_by", args.get(i)).map(|v| v as u32);
            }
            "-edges" | "-edge_shift" | "-duty_cycle" => {
                i += 1;
            }
            "-invert" => invert = true,
            s if !s.starts_with('-') => cx.push_objects(s, &mut targets),
            _ => {}
        }
        i += 1;
    }

    let Some(source) = source else {
        cx.warn(4, "create_generated_clock: missing -source".to_string());
        return;
    };
    let Some(&first_target) = targets.first() else {
        cx.warn(5, "create_generated_clock: no target pins".to_string());
        return;
    };

    let clock_name = name.map_or(first_target, |n| cx.interner.get_or_intern(n));
    constraints.clocks.push(ClockConstraint {
        name: clock_name,
        period_ns: 0.0,
        sources: targets,
        waveform: None,
        generated: Some(GeneratedClock {
            master: master.map(|m| cx.interner.get_or_intern(m)),
            source: cx.interner.get_or_intern(source),
            divide_by,
            multiply_by,
            invert,
        }),
        origin: cx.origin(),
    });
}

/// Parses `set_input_delay`/`set_output_delay [-clock <clk>] <delay> [ports]`.
fn parse_set_io_delay(
    args: &[&str],
    cx: &mut CommandContext<'_>,
    constraints: &mut TimingConstraints,
    is_input: bool,
) {
    let mut clock: Option<&str> = None;
    let mut delay: Option<f64> = None;
    let mut ports = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "-clock" => {
                i += 1;
                clock = args.get(i).copied();
            }
            "-reference_pin" => {
                i += 1;
            }
            s if !s.starts_with('-') => {
                if delay.is_none() {
                    if let Ok(v) = s.parse::<f64>() {
                        delay = Some(v);
                        i += 1;
                        continue;
                    }
                }
                cx.push_objects(s, &mut ports);
            }
            // -max, -min, -rise, -fall, -add_delay, -clock_fall
            _ => {}
        }
        i += 1;
    }

    let Some(delay_ns) = delay else {
        cx.warn(3, format!("{}: missing delay value", cx.command));
        return;
    };
    if ports.is_empty() {
        ports.push(cx.interner.get_or_intern("*"));
    }

    let clock = clock.map(|c| cx.interner.get_or_intern(c));
    let target = if is_input {
        &mut constraints.input_delays
    } else {
        &mut constraints.output_delays
    };
    for port in ports {
        target.push(IoDelay {
            port,
            clock,
            delay_ns,
            origin: cx.origin(),
        });
    }
}

/// Collects `-from`/`-to` objects of a path exception. Returns the
/// positional arguments that were not consumed.
fn exception_endpoints<'t>(
    args: &[&'t str],
    cx: &CommandContext<'_>,
    from: &mut Vec<Ident>,
    to: &mut Vec<Ident>,
) -> Vec<&'t str> {
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "-from" => {
                i += 1;
                if let Some(token) = args.get(i) {
                    cx.push_objects(token, from);
                }
            }
            "-to" => {
                i += 1;
                if let Some(token) = args.get(i) {
                    cx.push_objects(token, to);
                }
            }
            "-through" | "-rise_from" | "-fall_from" | "-rise_to" | "-fall_to" => {
                i += 1;
            }
            s if !s.starts_with('-') => positional.push(s),
            _ => {}
        }
        i += 1;
    }
    positional
}

/// Parses `set_max_delay <delay> [-from <a>] [-to <b>]`.
fn parse_set_max_delay(
    args: &[&str],
    cx: &mut CommandContext<'_>,
    constraints: &mut TimingConstraints,
) {
    let mut from = Vec::new();
    let mut to = Vec::new();
    let positional = exception_endpoints(args, cx, &mut from, &mut to);
    let Some(delay_ns) = positional.iter().find_map(|s| s.parse::<f64>().ok()) else {
        cx.warn(3, "set_max_delay: missing delay value".to_string());
        return;
    };
    constraints.max_delay_paths.push(MaxDelayPath {
        from,
        to,
        delay_ns,
        origin: cx.origin(),
    });
}
