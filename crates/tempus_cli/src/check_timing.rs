//! `tempus check-timing`: the constraint verification pipeline.
//!
//! 1. Find project root (walk up looking for `tempus.toml`)
//! 2. Load config and merge CLI flags over it
//! 3. Load the timing graph and SDC files
//! 4. Bind constraints to pins and propagate clocks
//! 5. Run the selected checks
//! 6. Render the report

use std::path::{Path, PathBuf};

use serde::Serialize;
use tempus_common::Interner;
use tempus_config::{CheckTimingConfig, ConfigError};
use tempus_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use tempus_timing::{
    propagate_clock_tags, CheckCategory, CheckErrors, CheckOptions, CheckSet, CheckTiming,
    ConstraintStore, LoopOptions,
};

use crate::pipeline::{
    load_constraints, load_graph, render_diagnostics, resolve_project_root, LoadError,
};
use crate::{CheckTimingArgs, GlobalArgs, ReportFormat};

/// Runs the `tempus check-timing` command.
///
/// Returns exit code 0 when the design is fully constrained, 1 when any
/// check found something or an input had errors.
pub fn run(args: &CheckTimingArgs, global: &GlobalArgs) -> Result<i32, LoadError> {
    let cwd = std::env::current_dir().map_err(LoadError::CurrentDir)?;
    run_in(args, global, &cwd)
}

fn run_in(args: &CheckTimingArgs, global: &GlobalArgs, cwd: &Path) -> Result<i32, LoadError> {
    // Step 1-2: Resolve the project and merge settings
    let settings = Settings::resolve(args, global, cwd)?;

    if !global.quiet {
        eprintln!(
            "   Checking {} ({} constraint file(s))",
            settings.design,
            settings.sdc.len()
        );
    }

    // Step 3: Load inputs
    let graph = load_graph(&settings.netlist)?;
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let constraints = load_constraints(&settings.sdc, &interner, &sink)?;

    // Step 4: Bind and propagate
    let store = ConstraintStore::bind(&constraints, &graph, &interner, &sink);
    let tags = propagate_clock_tags(&graph, &store);

    // Step 5: Check
    let errors =
        CheckTiming::new(&graph, &store, &tags, settings.options).check(settings.checks);

    // Step 6: Report
    let diagnostics = sink.take_all();
    let input_errors = count_severity(&diagnostics, Severity::Error);
    match settings.format {
        ReportFormat::Text => {
            render_diagnostics(&diagnostics, global.color);
            let groups: Vec<Diagnostic> = errors.iter().map(Diagnostic::from).collect();
            render_diagnostics(&groups, global.color);
            if !global.quiet {
                eprintln!(
                    "   Result: {} check group(s), {} input warning(s)",
                    errors.len(),
                    count_severity(&diagnostics, Severity::Warning)
                );
            }
        }
        ReportFormat::Json => {
            println!("{}", json_report(&settings.design, &diagnostics, &errors));
        }
    }

    if errors.is_empty() && input_errors == 0 {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

/// Everything the pipeline needs, after CLI flags are merged over the config.
#[derive(Debug)]
struct Settings {
    design: String,
    netlist: PathBuf,
    sdc: Vec<PathBuf>,
    checks: CheckSet,
    options: CheckOptions,
    format: ReportFormat,
}

impl Settings {
    fn resolve(args: &CheckTimingArgs, global: &GlobalArgs, cwd: &Path) -> Result<Self, LoadError> {
        let project = match resolve_project_root(global, cwd) {
            Ok(root) => {
                let config = match global.config.as_deref().map(|p| cwd.join(p)) {
                    Some(path) if path.is_file() => tempus_config::load_config_file(&path)?,
                    _ => tempus_config::load_config(&root)?,
                };
                Some((root, config))
            }
            Err(LoadError::NoProject(_)) if args.netlist.is_some() => None,
            Err(e) => return Err(e),
        };

        let netlist = match (&args.netlist, &project) {
            (Some(netlist), _) => cwd.join(netlist),
            (None, Some((root, config))) => root.join(&config.design.netlist),
            (None, None) => return Err(LoadError::NoProject(cwd.to_path_buf())),
        };

        let sdc = if !args.sdc.is_empty() {
            args.sdc.iter().map(|p| cwd.join(p)).collect()
        } else if let Some((root, config)) = &project {
            config.design.sdc.iter().map(|p| root.join(p)).collect()
        } else {
            Vec::new()
        };

        let design = match &project {
            Some((_, config)) => config.design.name.clone(),
            None => netlist
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "design".to_string()),
        };

        let defaults = CheckTimingConfig::default();
        let check_config = merge_check_config(
            project.as_ref().map_or(&defaults, |(_, c)| &c.check_timing),
            args,
        );
        if check_config.loop_vertex_budget == Some(0) {
            return Err(ConfigError::ValidationError(
                "loop budget must be at least 1".to_string(),
            )
            .into());
        }

        let format = args.format.unwrap_or_else(|| {
            project
                .as_ref()
                .map_or(ReportFormat::Text, |(_, c)| c.report.format.into())
        });

        Ok(Self {
            design,
            netlist,
            sdc,
            checks: select_checks(&check_config.checks, &check_config.skip)?,
            options: CheckOptions {
                loops: LoopOptions {
                    latch_breaks_loops: check_config.latch_breaks_loops,
                    vertex_budget: check_config.loop_vertex_budget,
                },
            },
            format,
        })
    }
}

/// Merges CLI `--check`/`--skip`/`--loop-budget` over the config file's
/// `[check_timing]` section.
///
/// A non-empty `--check` replaces the configured selection; skips from both
/// sources accumulate.
fn merge_check_config(config: &CheckTimingConfig, args: &CheckTimingArgs) -> CheckTimingConfig {
    let checks = if args.check.is_empty() {
        config.checks.clone()
    } else {
        args.check.clone()
    };
    let mut skip = config.skip.clone();
    for name in &args.skip {
        if !skip.contains(name) {
            skip.push(name.clone());
        }
    }
    CheckTimingConfig {
        checks,
        skip,
        latch_breaks_loops: config.latch_breaks_loops,
        loop_vertex_budget: args.loop_budget.or(config.loop_vertex_budget),
    }
}

/// Turns check names into a [`CheckSet`]. No names selects every check.
fn select_checks(checks: &[String], skip: &[String]) -> Result<CheckSet, LoadError> {
    let mut set = if checks.is_empty() {
        CheckSet::all()
    } else {
        parse_check_names(checks)?.into_iter().collect()
    };
    for category in parse_check_names(skip)? {
        set.remove(category);
    }
    Ok(set)
}

fn parse_check_names(names: &[String]) -> Result<Vec<CheckCategory>, LoadError> {
    names
        .iter()
        .map(|name| {
            CheckCategory::from_name(name).ok_or_else(|| LoadError::UnknownCheck(name.clone()))
        })
        .collect()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    design: &'a str,
    diagnostics: &'a [Diagnostic],
    checks: &'a CheckErrors,
}

fn json_report(design: &str, diagnostics: &[Diagnostic], checks: &CheckErrors) -> String {
    let report = JsonReport {
        design,
        diagnostics,
        checks,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLEAN_GRAPH: &str = r#"{
        "pins": [
            { "name": "din", "role": "PrimaryInput" },
            { "name": "dout", "role": "PrimaryOutput" }
        ],
        "arcs": [ { "from": 0, "to": 1, "kind": "Net" } ]
    }"#;

    const LOOP_GRAPH: &str = r#"{
        "pins": [
            { "name": "u1/A", "role": "CellPin", "instance": "u1" },
            { "name": "u1/Y", "role": "CellPin", "instance": "u1" }
        ],
        "arcs": [
            { "from": 0, "to": 1, "kind": "Combinational" },
            { "from": 1, "to": 0, "kind": "Combinational" }
        ]
    }"#;

    const CLEAN_SDC: &str = "\
create_clock -name vclk -period 10
set_input_delay -clock vclk 1.0 din
set_output_delay -clock vclk 1.0 dout
";

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
        }
    }

    fn args() -> CheckTimingArgs {
        CheckTimingArgs {
            netlist: None,
            sdc: Vec::new(),
            check: Vec::new(),
            skip: Vec::new(),
            format: Some(ReportFormat::Json),
            loop_budget: None,
        }
    }

    fn project(graph: &str, sdc: &str, extra: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let toml = format!(
            "[design]\nname = \"top\"\nnetlist = \"top.json\"\nsdc = \"top.sdc\"\n{extra}"
        );
        std::fs::write(tmp.path().join("tempus.toml"), toml).unwrap();
        std::fs::write(tmp.path().join("top.json"), graph).unwrap();
        std::fs::write(tmp.path().join("top.sdc"), sdc).unwrap();
        tmp
    }

    #[test]
    fn clean_design_exits_zero() {
        let tmp = project(CLEAN_GRAPH, CLEAN_SDC, "");
        assert_eq!(run_in(&args(), &global(), tmp.path()).unwrap(), 0);
    }

    #[test]
    fn unconstrained_design_exits_one() {
        let tmp = project(CLEAN_GRAPH, "", "");
        assert_eq!(run_in(&args(), &global(), tmp.path()).unwrap(), 1);
    }

    #[test]
    fn loop_found_from_subdirectory() {
        let tmp = project(LOOP_GRAPH, "", "");
        let sub = tmp.path().join("work");
        std::fs::create_dir(&sub).unwrap();
        assert_eq!(run_in(&args(), &global(), &sub).unwrap(), 1);
    }

    #[test]
    fn skipped_checks_exit_zero() {
        let tmp = project(LOOP_GRAPH, "", "[check_timing]\nskip = [\"loops\"]\n");
        assert_eq!(run_in(&args(), &global(), tmp.path()).unwrap(), 0);
    }

    #[test]
    fn netlist_flag_without_project() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("top.json"), CLEAN_GRAPH).unwrap();
        std::fs::write(tmp.path().join("top.sdc"), CLEAN_SDC).unwrap();
        let mut a = args();
        a.netlist = Some("top.json".to_string());
        a.sdc = vec!["top.sdc".to_string()];
        let settings = Settings::resolve(&a, &global(), tmp.path()).unwrap();
        assert_eq!(settings.design, "top");
        assert_eq!(settings.checks, CheckSet::all());
        assert_eq!(run_in(&a, &global(), tmp.path()).unwrap(), 0);
    }

    #[test]
    fn no_project_and_no_netlist() {
        let tmp = TempDir::new().unwrap();
        let err = run_in(&args(), &global(), tmp.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoProject(_)));
    }

    #[test]
    fn missing_sdc_file_is_load_error() {
        let tmp = project(CLEAN_GRAPH, "", "");
        std::fs::remove_file(tmp.path().join("top.sdc")).unwrap();
        let err = run_in(&args(), &global(), tmp.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn unknown_check_name_rejected() {
        let tmp = project(CLEAN_GRAPH, CLEAN_SDC, "[check_timing]\nchecks = [\"timing-loops\"]\n");
        let err = run_in(&args(), &global(), tmp.path()).unwrap_err();
        assert_eq!(err.to_string(), "unknown check `timing-loops`");
    }

    #[test]
    fn zero_loop_budget_rejected() {
        let tmp = project(CLEAN_GRAPH, CLEAN_SDC, "");
        let mut a = args();
        a.loop_budget = Some(0);
        let err = Settings::resolve(&a, &global(), tmp.path()).unwrap_err();
        assert!(matches!(err, LoadError::Config(ConfigError::ValidationError(_))));
    }

    #[test]
    fn explicit_config_file() {
        let tmp = project(CLEAN_GRAPH, CLEAN_SDC, "[report]\nformat = \"json\"\n");
        let renamed = tmp.path().join("signoff.toml");
        std::fs::rename(tmp.path().join("tempus.toml"), &renamed).unwrap();
        let global = GlobalArgs {
            config: Some(renamed.display().to_string()),
            ..global()
        };
        let mut a = args();
        a.format = None;
        let settings = Settings::resolve(&a, &global, Path::new("/")).unwrap();
        assert_eq!(settings.format, ReportFormat::Json);
        assert_eq!(settings.netlist, tmp.path().join("top.json"));
        assert_eq!(settings.sdc, vec![tmp.path().join("top.sdc")]);
    }

    #[test]
    fn cli_checks_replace_config_and_skips_accumulate() {
        let config = CheckTimingConfig {
            checks: vec!["loops".to_string()],
            skip: vec!["reg-no-clocks".to_string()],
            latch_breaks_loops: false,
            loop_vertex_budget: Some(50),
        };
        let mut a = args();
        a.check = vec!["no-input-delay".to_string(), "reg-no-clocks".to_string()];
        a.skip = vec!["reg-no-clocks".to_string(), "loops".to_string()];
        let merged = merge_check_config(&config, &a);
        assert_eq!(merged.checks, vec!["no-input-delay", "reg-no-clocks"]);
        assert_eq!(merged.skip, vec!["reg-no-clocks", "loops"]);
        assert!(!merged.latch_breaks_loops);
        assert_eq!(merged.loop_vertex_budget, Some(50));

        let set = select_checks(&merged.checks, &merged.skip).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![CheckCategory::NoInputDelay]);
    }

    #[test]
    fn cli_loop_budget_wins() {
        let mut a = args();
        a.loop_budget = Some(7);
        let config = CheckTimingConfig {
            loop_vertex_budget: Some(50),
            ..CheckTimingConfig::default()
        };
        assert_eq!(merge_check_config(&config, &a).loop_vertex_budget, Some(7));
    }

    #[test]
    fn notes_are_not_counted_as_warnings() {
        use tempus_diagnostics::{Category, DiagnosticCode};
        let code = DiagnosticCode::new(Category::Sdc, 10);
        let diagnostics = vec![
            Diagnostic::warning(code, "w"),
            Diagnostic::note(code, "n"),
            Diagnostic::note(code, "n"),
            Diagnostic::error(code, "e"),
        ];
        assert_eq!(count_severity(&diagnostics, Severity::Warning), 1);
        assert_eq!(count_severity(&diagnostics, Severity::Error), 1);
    }

    #[test]
    fn skip_everything() {
        let all: Vec<String> = CheckCategory::SELECTABLE
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert!(select_checks(&[], &all).unwrap().is_empty());
    }

    #[test]
    fn json_report_shape() {
        let tmp = project(LOOP_GRAPH, "", "");
        let settings = Settings::resolve(&args(), &global(), tmp.path()).unwrap();
        let graph = load_graph(&settings.netlist).unwrap();
        let store = ConstraintStore::for_graph(&graph);
        let tags = propagate_clock_tags(&graph, &store);
        let errors = CheckTiming::new(&graph, &store, &tags, settings.options).check(settings.checks);

        let json: serde_json::Value =
            serde_json::from_str(&json_report(&settings.design, &[], &errors)).unwrap();
        assert_eq!(json["design"], "top");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 0);
        let checks = json["checks"].as_array().unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0]["category"], "loops");
        assert_eq!(checks[0]["objects"][0], "u1/A -> u1/Y -> u1/A");
    }
}
