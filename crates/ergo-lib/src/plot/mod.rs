use crate::analysis::StageMeanRow;
use crate::signal::SessionSeries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

const PALETTE: [u32; 8] = [
    0xFF0077, 0x0077FF, 0x00AA44, 0xFF8800, 0x8833CC, 0x00AAAA, 0xAA3333, 0x555555,
];

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// One decimated trace per (participant, session) pair, heart rate over
/// elapsed seconds.
pub fn figure_from_dataset(dataset: &[SessionSeries], max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("Heart rate by session".into()));
    fig.x.label = Some("elapsed (s)".into());
    fig.y.label = Some("heart rate (bpm)".into());
    for (idx, series) in dataset.iter().enumerate() {
        let points: Vec<[f64; 2]> = series
            .samples
            .iter()
            .enumerate()
            .map(|(i, value)| [i as f64, *value])
            .collect();
        fig.add_series(Series::Line(LineSeries {
            name: format!("P{}_S{}", series.participant, series.session),
            points: decimate_points(&points, max_points),
            style: Style {
                width: 1.4,
                dash: None,
                color: Color(PALETTE[idx % PALETTE.len()]),
            },
        }));
    }
    fig
}

/// First-to-last stage comparison: one two-point line per (participant,
/// session) group. Rows for intermediate stages are ignored.
pub fn figure_from_stage_comparison(rows: &[StageMeanRow], n_stages: u32) -> Figure {
    let mut fig = Figure::new(Some("First vs last exercise stage".into()));
    fig.x.label = Some("stage".into());
    fig.y.label = Some("mean heart rate (bpm)".into());
    let mut pairs: Vec<(u32, u32)> = rows.iter().map(|r| (r.participant, r.session)).collect();
    pairs.sort_unstable();
    pairs.dedup();
    for (idx, (participant, session)) in pairs.iter().enumerate() {
        let find = |stage: u32| {
            rows.iter()
                .find(|r| {
                    r.participant == *participant && r.session == *session && r.stage == stage
                })
                .map(|r| [r.stage as f64, r.mean_hr])
        };
        let points: Vec<[f64; 2]> = [find(1), find(n_stages)].into_iter().flatten().collect();
        fig.add_series(Series::Line(LineSeries {
            name: format!("P{participant}_S{session}"),
            points,
            style: Style {
                width: 2.0,
                dash: None,
                color: Color(PALETTE[idx % PALETTE.len()]),
            },
        }));
    }
    fig
}
