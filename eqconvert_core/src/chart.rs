//! Pure translation of backend frequency responses into chart specs.
//!
//! Nothing here touches a renderer: the specs serialize to the
//! data/layout/config triple the external charting library consumes.

use crate::protocol::{GraphSpl, GraphSplDetails};
use serde::Serialize;

pub const MIN_WIDTH: u32 = 300;
pub const MAX_WIDTH: u32 = 800;

const FREQ_MIN_HZ: f64 = 20.0;
const FREQ_MAX_HZ: f64 = 20_000.0;

// The backend never produces more stages than this.
const MAX_STAGES: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisTitle {
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct XAxis {
    pub title: AxisTitle,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub range: [f64; 2],
    pub showline: bool,
    pub dtick: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct YAxis {
    pub title: AxisTitle,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub xaxis: XAxis,
    pub yaxis: YAxis,
    pub margin: Margin,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderConfig {
    pub responsive: bool,
    #[serde(rename = "displayModeBar")]
    pub display_mode_bar: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Series>,
    pub layout: Layout,
    pub config: RenderConfig,
}

/// Chart pixel size for a viewport: width clamped to a sane range, height a
/// fixed ratio of width.
pub fn chart_size(viewport: Viewport) -> (u32, u32) {
    let width = viewport.width.clamp(MIN_WIDTH, MAX_WIDTH);
    (width, width / 2)
}

fn layout(viewport: Viewport) -> Layout {
    let (width, height) = chart_size(viewport);
    Layout {
        width,
        height,
        xaxis: XAxis {
            title: AxisTitle { text: "Freq (Hz)" },
            kind: "log",
            range: [FREQ_MIN_HZ.log10(), FREQ_MAX_HZ.log10()],
            showline: true,
            dtick: "D1",
        },
        yaxis: YAxis {
            title: AxisTitle { text: "SPL (dB)" },
        },
        margin: Margin {
            l: 30,
            r: 120,
            t: 10,
            b: 60,
        },
    }
}

/// One-series spec for the combined response curve.
pub fn response_chart(graph: &GraphSpl, viewport: Viewport) -> ChartSpec {
    ChartSpec {
        data: vec![Series {
            x: graph.freq.clone(),
            y: graph.spl.clone(),
            kind: "scatter",
            showlegend: None,
        }],
        layout: layout(viewport),
        config: RenderConfig {
            responsive: true,
            display_mode_bar: false,
        },
    }
}

/// Multi-series spec for the per-stage breakdown. Stages are walked in index
/// order and the series list stops at the first gap (or at the stage cap).
pub fn stage_chart(details: &GraphSplDetails, viewport: Viewport) -> ChartSpec {
    let mut data = Vec::new();
    for index in 0..MAX_STAGES {
        let Some(stage) = details.stage(index) else {
            break;
        };
        data.push(Series {
            x: details.freq.clone(),
            y: stage.to_vec(),
            kind: "scatter",
            showlegend: Some(false),
        });
    }
    ChartSpec {
        data,
        layout: layout(viewport),
        config: RenderConfig {
            responsive: false,
            display_mode_bar: false,
        },
    }
}
