//! Autorouter settings carried alongside the rule model.
//!
//! Reading an `autoroute_settings` scope replaces the whole value; there is
//! no field-level merge. Defaults match a freshly created board.

use serde::Serialize;

/// Per-layer autoroute configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutorouteLayerSettings {
    pub active: bool,
    pub preferred_direction_horizontal: bool,
    pub preferred_direction_trace_costs: f64,
    pub against_preferred_direction_trace_costs: f64,
}

/// Active autoroute settings of the interactive session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterSettings {
    pub fanout_pass: bool,
    pub autoroute_pass: bool,
    pub postroute_pass: bool,
    pub vias_allowed: bool,
    pub via_costs: i32,
    pub plane_via_costs: i32,
    pub start_ripup_costs: i32,
    pub start_pass_no: i32,
    pub layer_settings: Vec<AutorouteLayerSettings>,
}

impl RouterSettings {
    /// Default settings for a board with `layer_count` layers. Preferred
    /// routing directions alternate per layer, starting horizontal.
    pub fn new(layer_count: usize) -> Self {
        let layer_settings = (0..layer_count)
            .map(|layer_no| AutorouteLayerSettings {
                active: true,
                preferred_direction_horizontal: layer_no % 2 == 0,
                preferred_direction_trace_costs: 1.0,
                against_preferred_direction_trace_costs: 2.5,
            })
            .collect();
        Self {
            fanout_pass: false,
            autoroute_pass: true,
            postroute_pass: true,
            vias_allowed: true,
            via_costs: 50,
            plane_via_costs: 5,
            start_ripup_costs: 100,
            start_pass_no: 1,
            layer_settings,
        }
    }
}
