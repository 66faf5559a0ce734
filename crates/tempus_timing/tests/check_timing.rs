//! End-to-end constraint checks: graph + SDC in, check groups out.

use tempus_common::Interner;
use tempus_diagnostics::DiagnosticSink;
use tempus_timing::*;

struct Design {
    graph: TimingGraph,
    store: ConstraintStore,
    tags: TagTable,
}

impl Design {
    fn new(graph: TimingGraph, sdc: &str) -> Self {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let constraints = parse_sdc(sdc, "design.sdc", &interner, &sink);
        let store = ConstraintStore::bind(&constraints, &graph, &interner, &sink);
        assert!(sink.is_empty(), "unexpected diagnostics: {:?}", sink.take_all());
        let tags = propagate_clock_tags(&graph, &store);
        Self { graph, store, tags }
    }

    fn check(&self, checks: CheckSet) -> CheckErrors {
        CheckTiming::new(&self.graph, &self.store, &self.tags, CheckOptions::default())
            .check(checks)
    }
}

fn only(category: CheckCategory) -> CheckSet {
    std::iter::once(category).collect()
}

/// Two inputs with one constrained, one register clocked by two clocks, and
/// a four-pin combinational loop fed by the unconstrained input.
fn mixed_design() -> Design {
    let mut g = TimingGraph::new();
    let ck_a = g.add_pin("ck_a", PinRole::PrimaryInput);
    let ck_b = g.add_pin("ck_b", PinRole::PrimaryInput);
    let in1 = g.add_pin("in1", PinRole::PrimaryInput);
    let in2 = g.add_pin("in2", PinRole::PrimaryInput);

    let mux_a = g.add_instance_pin("cmux", "A", PinRole::CellPin);
    let mux_b = g.add_instance_pin("cmux", "B", PinRole::CellPin);
    let mux_y = g.add_instance_pin("cmux", "Y", PinRole::CellPin);
    g.add_arc(ck_a, mux_a, TimingArcKind::Net);
    g.add_arc(ck_b, mux_b, TimingArcKind::Net);
    g.add_arc(mux_a, mux_y, TimingArcKind::Combinational);
    g.add_arc(mux_b, mux_y, TimingArcKind::Combinational);

    let ck = g.add_instance_pin("ff", "CK", PinRole::RegisterClock);
    let d = g.add_instance_pin("ff", "D", PinRole::RegisterData);
    let q = g.add_instance_pin("ff", "Q", PinRole::RegisterOutput);
    g.add_arc(mux_y, ck, TimingArcKind::Net);
    g.add_arc(in1, d, TimingArcKind::Net);
    g.add_arc(ck, d, TimingArcKind::SetupCheck);
    g.add_arc(ck, d, TimingArcKind::HoldCheck);
    g.add_arc(ck, q, TimingArcKind::ClockToOutput);

    let ring: Vec<PinId> = (0..4)
        .map(|i| g.add_instance_pin(format!("u{i}"), "Y", PinRole::CellPin))
        .collect();
    g.add_arc(in2, ring[0], TimingArcKind::Net);
    for i in 0..4 {
        g.add_arc(ring[i], ring[(i + 1) % 4], TimingArcKind::Combinational);
    }

    let sdc = "\
create_clock -name clk_a -period 10 [get_ports ck_a]
create_clock -name clk_b -period 8 [get_ports ck_b]
set_input_delay -clock clk_a 2.0 [get_ports in1]
";
    Design::new(g, sdc)
}

#[test]
fn all_checks_on_mixed_design() {
    let design = mixed_design();
    let errors = design.check(CheckSet::all());

    assert_eq!(
        errors.categories(),
        vec![
            CheckCategory::NoInputDelay,
            CheckCategory::RegMultipleClocks,
            CheckCategory::Loops,
        ]
    );
    let lines: Vec<Vec<&str>> = errors.iter().map(|e| e.lines().collect()).collect();
    assert_eq!(
        lines,
        vec![
            vec!["There is 1 input port missing set_input_delay.", "in2"],
            vec!["There is 1 register/latch pin with multiple clocks.", "ff/CK"],
            vec![
                "There is 1 combinational loop in the design.",
                "u0/Y -> u1/Y -> u2/Y -> u3/Y -> u0/Y",
            ],
        ]
    );
}

#[test]
fn loops_only_on_mixed_design() {
    let design = mixed_design();
    let errors = design.check(only(CheckCategory::Loops));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.categories(), vec![CheckCategory::Loops]);
}

#[test]
fn repeated_calls_are_independent() {
    let design = mixed_design();
    let first = design.check(CheckSet::all());
    let narrow = design.check(only(CheckCategory::NoInputDelay));
    let again = design.check(CheckSet::all());
    assert_eq!(first, again);
    assert_eq!(narrow.len(), 1);
    assert_eq!(first.len(), 3);
}

#[test]
fn unselected_checks_report_nothing() {
    let design = mixed_design();
    let errors = design.check(CheckSet::from_flags(false, true, false, true, true, false, true));
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn three_pin_loop_and_register_break() {
    let mut g = TimingGraph::new();
    let a = g.add_pin("A", PinRole::CellPin);
    let b = g.add_pin("B", PinRole::CellPin);
    let c = g.add_pin("C", PinRole::CellPin);
    g.add_arc(a, b, TimingArcKind::Combinational);
    g.add_arc(b, c, TimingArcKind::Combinational);
    g.add_arc(c, a, TimingArcKind::Combinational);
    let design = Design::new(g, "");
    let errors = design.check(only(CheckCategory::Loops));
    let group = errors.get(CheckCategory::Loops).unwrap();
    assert_eq!(group.objects, vec!["A -> B -> C -> A"]);

    let mut g = TimingGraph::new();
    let a = g.add_pin("A", PinRole::CellPin);
    let b = g.add_pin("B", PinRole::RegisterClock);
    let c = g.add_pin("C", PinRole::RegisterOutput);
    g.add_arc(a, b, TimingArcKind::Combinational);
    g.add_arc(b, c, TimingArcKind::ClockToOutput);
    g.add_arc(c, a, TimingArcKind::Combinational);
    let design = Design::new(g, "");
    assert!(design.check(only(CheckCategory::Loops)).is_empty());
}

#[test]
fn unconstrained_endpoints_union_both_sides() {
    let mut g = TimingGraph::new();
    let din = g.add_pin("din", PinRole::PrimaryInput);
    let ck = g.add_instance_pin("r", "CK", PinRole::RegisterClock);
    let d = g.add_instance_pin("r", "D", PinRole::RegisterData);
    g.add_arc(din, d, TimingArcKind::Net);
    g.add_arc(ck, d, TimingArcKind::SetupCheck);
    for name in ["out_a", "out_b", "out_c", "out_ok"] {
        let out = g.add_pin(name, PinRole::PrimaryOutput);
        g.add_arc(din, out, TimingArcKind::Net);
    }
    let clk = g.add_pin("clk", PinRole::PrimaryInput);
    g.add_arc(clk, ck, TimingArcKind::Net);

    // r/CK has no clock: r/D is unconstrained on the setup side only.
    // out_a has an unclocked output delay: setup side only.
    // out_b lacks an output delay but ends a max-delay path: output side only.
    // out_c lacks an output delay: both sides.
    let sdc = "\
create_clock -name vclk -period 10
set_output_delay 1.0 out_a
set_output_delay -clock vclk 1.0 out_ok
set_max_delay 4.0 -to [get_ports out_b]
";
    let design = Design::new(g, sdc);

    let errors = design.check(only(CheckCategory::UnconstrainedEndpoints));
    let group = errors.get(CheckCategory::UnconstrainedEndpoints).unwrap();
    assert_eq!(group.objects, vec!["r/D", "out_a", "out_b", "out_c"]);
    assert_eq!(group.message, "There are 4 unconstrained endpoints.");

    let mut both = only(CheckCategory::UnconstrainedEndpoints);
    both.insert(CheckCategory::NoOutputDelay);
    let errors = design.check(both);
    assert_eq!(
        errors.get(CheckCategory::NoOutputDelay).unwrap().objects,
        vec!["out_b", "out_c"]
    );
    assert_eq!(
        errors.get(CheckCategory::UnconstrainedEndpoints).unwrap().objects.len(),
        4
    );
}

#[test]
fn floating_output_in_constrained_design() {
    let mut g = TimingGraph::new();
    let din = g.add_pin("din", PinRole::PrimaryInput);
    let out = g.add_pin("out", PinRole::PrimaryOutput);
    g.add_pin("floating", PinRole::PrimaryOutput);
    g.add_arc(din, out, TimingArcKind::Net);
    let sdc = "\
create_clock -name vclk -period 10
set_input_delay -clock vclk 1.0 din
set_output_delay -clock vclk 1.0 out
";
    let design = Design::new(g, sdc);
    let errors = design.check(CheckSet::all());
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn singular_and_plural_headers() {
    let build = |inputs: usize| {
        let mut g = TimingGraph::new();
        let sink = g.add_instance_pin("u", "A", PinRole::CellPin);
        for i in 0..inputs {
            let pin = g.add_pin(format!("in{i}"), PinRole::PrimaryInput);
            g.add_arc(pin, sink, TimingArcKind::Net);
        }
        Design::new(g, "")
    };

    let one = build(1).check(only(CheckCategory::NoInputDelay));
    assert_eq!(
        one.iter().next().unwrap().message,
        "There is 1 input port missing set_input_delay."
    );
    let two = build(2).check(only(CheckCategory::NoInputDelay));
    assert_eq!(
        two.iter().next().unwrap().message,
        "There are 2 input ports missing set_input_delay."
    );
    let none = build(0).check(only(CheckCategory::NoInputDelay));
    assert!(none.is_empty());
}

#[test]
fn generated_clock_from_divider() {
    let mut g = TimingGraph::new();
    let clk = g.add_pin("clk", PinRole::PrimaryInput);
    let ck = g.add_instance_pin("div", "CK", PinRole::RegisterClock);
    let q = g.add_instance_pin("div", "Q", PinRole::RegisterOutput);
    let ck2 = g.add_instance_pin("ff", "CK", PinRole::RegisterClock);
    g.add_arc(clk, ck, TimingArcKind::Net);
    g.add_arc(ck, q, TimingArcKind::ClockToOutput);
    g.add_arc(q, ck2, TimingArcKind::Net);

    let sdc = "\
create_clock -name core -period 10 clk
create_generated_clock -name half -source div/CK -master_clock core -divide_by 2 div/Q
create_generated_clock -name stray -source ff/CK -master_clock core -divide_by 4 div/Q
";
    let design = Design::new(g, sdc);
    let errors = design.check(CheckSet::all());
    assert_eq!(
        errors.categories(),
        vec![CheckCategory::RegMultipleClocks, CheckCategory::GeneratedClocks]
    );
    // ff/CK sees both generated clocks defined on div/Q.
    assert_eq!(
        errors.get(CheckCategory::RegMultipleClocks).unwrap().objects,
        vec!["ff/CK"]
    );
    // core stops at the divider's clock-to-output arc, so it never reaches
    // ff/CK.
    let generated = errors.get(CheckCategory::GeneratedClocks).unwrap();
    assert_eq!(generated.objects, vec!["stray"]);
    assert_eq!(
        generated.message,
        "There is 1 generated clock that is not connected to a clock source."
    );
}

#[test]
fn graph_loaded_from_json() {
    let json = r#"{
        "pins": [
            { "name": "in", "role": "PrimaryInput" },
            { "name": "u1/A", "role": "CellPin", "instance": "u1" },
            { "name": "u1/Y", "role": "CellPin", "instance": "u1" },
            { "name": "out", "role": "PrimaryOutput" }
        ],
        "arcs": [
            { "from": 0, "to": 1, "kind": "Net" },
            { "from": 1, "to": 2, "kind": "Combinational" },
            { "from": 2, "to": 1, "kind": "Combinational" },
            { "from": 2, "to": 3, "kind": "Net" }
        ]
    }"#;
    let graph = TimingGraph::from_json(json).unwrap();
    let design = Design::new(graph, "set_input_delay 0.5 in\nset_output_delay 0.5 out");
    let errors = design.check(CheckSet::all());
    assert_eq!(
        errors.categories(),
        vec![CheckCategory::UnconstrainedEndpoints, CheckCategory::Loops]
    );
    assert_eq!(
        errors.get(CheckCategory::Loops).unwrap().objects,
        vec!["u1/A -> u1/Y -> u1/A"]
    );
}
