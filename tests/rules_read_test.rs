// Reading semantics of the rules scope: header validation, layer scoping,
// replace/accumulate behavior and forward-compatible scope skipping.
use dsn_rules::rules_file;
use dsn_rules::{AngleRestriction, BoardModel, CoordinateTransform, LayerStructure};

/// Three-layer board with 10 board units per file unit, so a file width of
/// 10 becomes a trace half-width of 50.
fn test_model() -> BoardModel {
    BoardModel::new(
        LayerStructure::new(["F.Cu", "In1.Cu", "B.Cu"]),
        CoordinateTransform::new(10.0),
    )
}

fn read_str(input: &str, model: &mut BoardModel) -> bool {
    rules_file::read(input.as_bytes(), "myboard", model)
}

#[test]
fn missing_open_bracket_fails_with_nothing_applied() {
    let mut model = test_model();
    assert!(!read_str("rules PCB myboard (rule (width 10)))", &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 0);
}

#[test]
fn wrong_rules_keyword_fails_with_nothing_applied() {
    let mut model = test_model();
    assert!(!read_str("(structure PCB myboard (rule (width 10)))", &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 0);
}

#[test]
fn wrong_pcb_keyword_fails_with_nothing_applied() {
    let mut model = test_model();
    assert!(!read_str("(rules board myboard (rule (width 10)))", &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 0);
}

#[test]
fn design_name_mismatch_is_soft() {
    let mut model = test_model();
    assert!(read_str("(rules PCB other_board (rule (width 10)))", &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 50);
}

#[test]
fn global_and_layer_widths_and_via_rule_scenario() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (rule (width 10)) \
                 (layer F.Cu (rule (width 6))) \
                 (via_rule (via_list v1 v2)))";
    assert!(read_str(input, &mut model));
    // Global default: round(to_board_units(10) / 2).
    assert_eq!(model.rules.default_trace_half_width(), 50);
    // Layer 0 override, layers 1 and 2 fall back to the default.
    assert_eq!(model.rules.trace_half_width(0), 30);
    assert_eq!(model.rules.trace_half_width(1), 50);
    assert_eq!(model.rules.trace_half_width(2), 50);
    assert_eq!(model.rules.via_rules.len(), 1);
    assert_eq!(model.rules.via_rules[0].vias, vec!["v1", "v2"]);
}

#[test]
fn layer_width_after_global_width_leaves_default_alone() {
    let mut model = test_model();
    let input = "(rules PCB myboard (rule (width 10)) (layer In1.Cu (rule (width 6))))";
    assert!(read_str(input, &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 50);
    assert_eq!(model.rules.trace_half_width(1), 30);
    assert_eq!(model.rules.trace_half_width(0), 50);
}

#[test]
fn redeclared_via_is_replaced_not_merged() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (via v1 ps_a default) \
                 (via v1 ps_b default spare))";
    assert!(read_str(input, &mut model));
    assert_eq!(model.rules.via_infos.len(), 1);
    let via = model.rules.via_infos.get("v1").expect("via v1 missing");
    assert_eq!(via.padstack, "ps_b");
    assert!(via.spare);
}

#[test]
fn unresolved_layer_does_not_abort_the_read() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (layer Nowhere.Cu (rule (width 6))) \
                 (rule (width 10)) \
                 (via v1 ps_a default))";
    assert!(read_str(input, &mut model));
    // The orphaned layer rule is dropped, everything after it still lands.
    assert_eq!(model.rules.default_trace_half_width(), 50);
    assert_eq!(model.rules.trace_half_width(0), 50);
    assert!(model.rules.via_infos.get("v1").is_some());
}

#[test]
fn unknown_scopes_are_skipped() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (wiring (fancy (deep 1) \"text ) with bracket\")) \
                 (rule (width 10)))";
    assert!(read_str(input, &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 50);
}

#[test]
fn snap_angle_replaces_the_restriction() {
    let mut model = test_model();
    assert!(read_str(
        "(rules PCB myboard (snap_angle fortyfive_degree))",
        &mut model
    ));
    assert_eq!(
        model.rules.trace_angle_restriction,
        AngleRestriction::FortyfiveDegree
    );
}

#[test]
fn clearances_land_in_the_matrix() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (rule (clearance 5) (clearance 3 (type smd_smd))) \
                 (layer In1.Cu (rule (clearance 2))))";
    assert!(read_str(input, &mut model));
    let matrix = &model.rules.clearance_matrix;
    // Global values, with the per-layer entry overriding on layer 1 only.
    assert_eq!(matrix.value("default", "default", 0), Some(50));
    assert_eq!(matrix.value("default", "default", 1), Some(20));
    // The smd class was introduced symbolically by the clearance rule.
    assert_eq!(matrix.value("smd", "smd", 0), Some(30));
}

#[test]
fn net_class_is_resolved_and_inserted() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (class power GND VCC \
                   (rule (width 20)) \
                   (layer_rule B.Cu (rule (width 30))) \
                   (via_rule vr_power) \
                   (clearance_class power)))";
    assert!(read_str(input, &mut model));
    let class = model.rules.net_classes.get("power").expect("class missing");
    assert_eq!(class.nets, vec!["GND", "VCC"]);
    assert_eq!(class.trace_half_width, Some(100));
    assert_eq!(class.layer_half_widths.get(&2), Some(&150));
    assert_eq!(class.via_rule.as_deref(), Some("vr_power"));
    assert_eq!(class.clearance_class.as_deref(), Some("power"));
}

#[test]
fn redeclared_net_class_replaces_the_old_one() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (class power GND (rule (width 20))) \
                 (class power VCC))";
    assert!(read_str(input, &mut model));
    assert_eq!(model.rules.net_classes.len(), 1);
    let class = model.rules.net_classes.get("power").expect("class missing");
    assert_eq!(class.nets, vec!["VCC"]);
    assert_eq!(class.trace_half_width, None);
}

#[test]
fn autoroute_settings_are_replaced_wholesale() {
    let mut model = test_model();
    // Pre-existing session value; a read must not merge into it.
    model.router_settings.plane_via_costs = 99;
    let input = "(rules PCB myboard \
                 (autoroute_settings \
                   (fanout on) \
                   (vias off) \
                   (via_costs 80) \
                   (layer_rule In1.Cu \
                     (active off) \
                     (preferred_direction vertical) \
                     (preferred_direction_trace_costs 1.5))))";
    assert!(read_str(input, &mut model));
    let settings = &model.router_settings;
    assert!(settings.fanout_pass);
    assert!(!settings.vias_allowed);
    assert_eq!(settings.via_costs, 80);
    // Unmentioned fields come from a fresh default, not the old value.
    assert_eq!(settings.plane_via_costs, 5);
    let layer = &settings.layer_settings[1];
    assert!(!layer.active);
    assert!(!layer.preferred_direction_horizontal);
    assert_eq!(layer.preferred_direction_trace_costs, 1.5);
    assert_eq!(layer.against_preferred_direction_trace_costs, 2.5);
}

#[test]
fn padstack_lands_in_the_library() {
    let mut model = test_model();
    let input = "(rules PCB myboard \
                 (padstack ps_via \
                   (shape (circle F.Cu 0.5)) \
                   (shape (circle B.Cu 0.5 0.1 -0.1)) \
                   (attach on)))";
    assert!(read_str(input, &mut model));
    let padstack = model.library.padstacks.get("ps_via").expect("padstack missing");
    assert_eq!(padstack.shapes.len(), 2);
    assert!(padstack.attach_allowed);
    // Padstacks alone are not via-usable until a via references them.
    assert!(model.library.get_via_padstack("ps_via").is_none());
}

#[test]
fn malformed_width_rule_is_dropped_without_derailing_the_scope() {
    let mut model = test_model();
    // The empty width rule is dropped; the clearance in the same scope and
    // the via after it must still land.
    let input = "(rules PCB myboard \
                 (rule (width) (clearance 5)) \
                 (via v1 ps_a default))";
    assert!(read_str(input, &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 0);
    assert_eq!(
        model.rules.clearance_matrix.value("default", "default", 0),
        Some(50)
    );
    assert!(model.rules.via_infos.get("v1").is_some());
}

#[test]
fn truncated_input_fails_but_keeps_earlier_mutations() {
    let mut model = test_model();
    // No closing bracket for the rules scope: fatal, but the width rule
    // was already applied - reads are incremental, not transactional.
    assert!(!read_str("(rules PCB myboard (rule (width 10))", &mut model));
    assert_eq!(model.rules.default_trace_half_width(), 50);
}
