use std::sync::Arc;

use rivers_shared::annotations::{SERIES_STROKE, subtitle_color};
use rivers_shared::text::display_unit;
use rivers_shared::{AdvisedRange, Annotations, RiverLevel};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::card_state::{CardState, LoadPhase};

/// Everything a chart needs to draw one card.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub levels: Arc<[RiverLevel]>,
    pub range: AdvisedRange,
    pub compact: bool,
}

impl ChartData {
    pub fn from_state(state: &CardState, compact: bool) -> Self {
        Self {
            levels: Arc::clone(state.levels()),
            range: state.detail().advised_range(),
            compact,
        }
    }

    pub fn unit_label(&self) -> String {
        display_unit(self.levels.last().map(|l| l.unit_code.as_str()), self.compact)
    }

    pub fn subtitle(&self) -> Option<(String, &'static str)> {
        let latest = self.levels.last()?;
        Some((
            format!(
                "Current Flow: {} {}",
                rivers_shared::annotations::format_flow(latest.value),
                self.unit_label()
            ),
            subtitle_color(self.range.status(latest.value)),
        ))
    }
}

/// A drawable chart instance. `destroy` must release everything `render`
/// created.
pub trait ChartSurface {
    fn render(&mut self, data: &ChartData) -> Result<(), String>;
    fn destroy(&mut self);
}

/// Owns a surface and guarantees destroy-before-render.
pub struct ChartSlot<S: ChartSurface> {
    surface: S,
    live: bool,
}

impl<S: ChartSurface> ChartSlot<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            live: false,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Redraw from the card's current state. Only Ready cards get a chart.
    pub fn rebuild(&mut self, state: &CardState, compact: bool) -> Result<(), String> {
        self.teardown();
        if *state.phase() != LoadPhase::Ready {
            return Ok(());
        }
        self.surface.render(&ChartData::from_state(state, compact))?;
        self.live = true;
        Ok(())
    }

    pub fn teardown(&mut self) {
        if self.live {
            self.surface.destroy();
            self.live = false;
        }
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: ChartSurface> Drop for ChartSlot<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Plot-area mapping from data space to canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub t_min: f64,
    pub t_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

const GRACE: f64 = 0.05;

impl PlotArea {
    /// Fit the series and any advisory thresholds, padded by 5% of the span.
    pub fn fit(data: &ChartData, left: f64, top: f64, width: f64, height: f64) -> Option<Self> {
        let points: Vec<(f64, f64)> = data
            .levels
            .iter()
            .filter_map(|level| {
                level
                    .parsed_timestamp()
                    .map(|ts| (ts.timestamp_millis() as f64, level.value))
            })
            .collect();
        if points.is_empty() {
            return None;
        }

        let (mut t_min, mut t_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (t, v) in &points {
            t_min = t_min.min(*t);
            t_max = t_max.max(*t);
            v_min = v_min.min(*v);
            v_max = v_max.max(*v);
        }
        for bound in [data.range.low, data.range.high].into_iter().flatten() {
            v_min = v_min.min(bound);
            v_max = v_max.max(bound);
        }

        let span = (v_max - v_min).max(1.0);
        v_min -= span * GRACE;
        v_max += span * GRACE;
        if t_max <= t_min {
            t_min -= 1.0;
            t_max += 1.0;
        }

        Some(Self {
            left,
            top,
            width,
            height,
            t_min,
            t_max,
            v_min,
            v_max,
        })
    }

    pub fn x(&self, t: f64) -> f64 {
        self.left + (t - self.t_min) / (self.t_max - self.t_min) * self.width
    }

    pub fn y(&self, v: f64) -> f64 {
        self.top + (self.v_max - v) / (self.v_max - self.v_min) * self.height
    }

    /// Clamp a band edge to the plot; open edges extend to the border.
    pub fn band_y(&self, from: Option<f64>, to: Option<f64>) -> (f64, f64) {
        let bottom = from.map_or(self.top + self.height, |v| self.y(v).min(self.top + self.height));
        let top = to.map_or(self.top, |v| self.y(v).max(self.top));
        (top, bottom)
    }
}

const MARGIN_LEFT: f64 = 52.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 34.0;
const MARGIN_BOTTOM: f64 = 28.0;

/// Chart drawn with the 2D canvas API.
pub struct CanvasChart {
    canvas: HtmlCanvasElement,
}

impl CanvasChart {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    fn context(&self) -> Result<CanvasRenderingContext2d, String> {
        use wasm_bindgen::JsCast;
        self.canvas
            .get_context("2d")
            .map_err(|_| "canvas context unavailable".to_string())?
            .ok_or_else(|| "canvas context unavailable".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "canvas context has wrong type".to_string())
    }

    fn sync_size(&self) -> (f64, f64) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let css_w = f64::from(self.canvas.client_width().max(1));
        let css_h = (css_w / 1.5).round();
        self.canvas.set_width((css_w * dpr) as u32);
        self.canvas.set_height((css_h * dpr) as u32);
        (css_w, css_h)
    }
}

impl ChartSurface for CanvasChart {
    fn render(&mut self, data: &ChartData) -> Result<(), String> {
        let ctx = self.context()?;
        let (w, h) = self.sync_size();
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        ctx.clear_rect(0.0, 0.0, w, h);

        let Some(plot) = PlotArea::fit(
            data,
            MARGIN_LEFT,
            MARGIN_TOP,
            w - MARGIN_LEFT - MARGIN_RIGHT,
            h - MARGIN_TOP - MARGIN_BOTTOM,
        ) else {
            return Ok(());
        };

        let annotations = Annotations::for_range(data.range);
        for band in &annotations.bands {
            let (top, bottom) = plot.band_y(band.from, band.to);
            if bottom > top {
                ctx.set_fill_style_str(band.color);
                ctx.fill_rect(plot.left, top, plot.width, bottom - top);
            }
        }

        ctx.set_stroke_style_str(SERIES_STROKE);
        ctx.set_line_width(2.0);
        ctx.begin_path();
        let mut started = false;
        for level in data.levels.iter() {
            let Some(ts) = level.parsed_timestamp() else {
                continue;
            };
            let (x, y) = (plot.x(ts.timestamp_millis() as f64), plot.y(level.value));
            if started {
                ctx.line_to(x, y);
            } else {
                ctx.move_to(x, y);
                started = true;
            }
        }
        ctx.stroke();

        let dash = js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(6.0));
        let no_dash = js_sys::Array::new();
        ctx.set_font("10px sans-serif");
        for line in &annotations.lines {
            let y = plot.y(line.value);
            ctx.set_stroke_style_str(line.color);
            ctx.set_line_width(1.5);
            let _ = ctx.set_line_dash(&dash);
            ctx.begin_path();
            ctx.move_to(plot.left, y);
            ctx.line_to(plot.left + plot.width, y);
            ctx.stroke();
            let _ = ctx.set_line_dash(&no_dash);

            let label_w = ctx
                .measure_text(&line.label)
                .map(|m| m.width())
                .unwrap_or(40.0);
            ctx.set_fill_style_str(line.color);
            ctx.fill_rect(plot.left + 2.0, y - 8.0, label_w + 6.0, 16.0);
            ctx.set_fill_style_str("white");
            let _ = ctx.fill_text(&line.label, plot.left + 5.0, y + 4.0);
        }

        ctx.set_fill_style_str("#555");
        ctx.set_font("11px sans-serif");
        for value in [plot.v_min, (plot.v_min + plot.v_max) / 2.0, plot.v_max] {
            let _ = ctx.fill_text(&format!("{:.0}", value), 4.0, plot.y(value) + 4.0);
        }
        if let (Some(first), Some(last)) = (data.levels.first(), data.levels.last()) {
            for (level, x) in [(first, plot.left), (last, plot.left + plot.width - 60.0)] {
                if let Some(ts) = level.parsed_timestamp() {
                    let label = ts.format("%b %-d").to_string();
                    let _ = ctx.fill_text(&label, x, h - 8.0);
                }
            }
        }

        if let Some((text, color)) = data.subtitle() {
            ctx.set_fill_style_str(color);
            ctx.set_font(if data.compact {
                "bold 12px sans-serif"
            } else {
                "bold 14px sans-serif"
            });
            let _ = ctx.fill_text(&text, MARGIN_LEFT, 20.0);
        }

        Ok(())
    }

    fn destroy(&mut self) {
        if let Ok(ctx) = self.context() {
            ctx.clear_rect(
                0.0,
                0.0,
                f64::from(self.canvas.width()),
                f64::from(self.canvas.height()),
            );
        }
    }
}
