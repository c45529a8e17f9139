//! Character-grid rasterizer presented through crossterm
//!
//! Each terminal cell is one "pixel" whose background carries the fill
//! color; text lands on the cells as glyphs. Logical viewport coordinates
//! are scaled onto the grid, so the scene code never sees the terminal size.

use super::{Paint, Surface, TextAlign, Transform};
use crate::data::{Color, Viewport};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub bg: Color,
    pub fg: Color,
    pub glyph: char,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            bg: Color::BLACK,
            fg: Color::WHITE,
            glyph: ' ',
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Transform,
    alpha: f32,
}

pub struct TerminalSurface {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    base: Transform,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl TerminalSurface {
    /// Grid of `cols` x `rows` cells showing a viewport of logical size `viewport`.
    pub fn new(cols: u16, rows: u16, viewport: Viewport) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let base = Transform::IDENTITY.scale(cols as f32 / viewport.width, rows as f32 / viewport.height);
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); cols as usize * rows as usize],
            base,
            state: DrawState {
                transform: base,
                alpha: 1.0,
            },
            stack: Vec::new(),
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cell(&self, col: u16, row: u16) -> Option<&Cell> {
        if col < self.cols && row < self.rows {
            self.cells.get(row as usize * self.cols as usize + col as usize)
        } else {
            None
        }
    }

    /// Reset every cell and the transform stack for a new frame
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.stack.clear();
        self.state = DrawState {
            transform: self.base,
            alpha: 1.0,
        };
    }

    /// Glyphs of one row as a string (tests and debugging)
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(col, row).map(|c| c.glyph))
            .collect()
    }

    /// Write text directly in grid coordinates, unaffected by transforms.
    pub fn overlay_text(&mut self, col: u16, row: u16, text: &str, fg: Color, bg: Color) {
        for (i, ch) in text.chars().enumerate() {
            let c = col as i32 + i as i32;
            if let Some(cell) = self.cell_mut(c, row as i32) {
                cell.glyph = ch;
                cell.fg = fg;
                cell.bg = bg;
            }
        }
    }

    /// Queue the whole grid to `out` and flush.
    pub fn present<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for row in 0..self.rows {
            queue!(out, MoveTo(0, row))?;
            let mut last: Option<(Color, Color)> = None;
            for col in 0..self.cols {
                let Some(cell) = self.cell(col, row) else { continue };
                if last != Some((cell.bg, cell.fg)) {
                    queue!(
                        out,
                        SetBackgroundColor(to_term_color(cell.bg)),
                        SetForegroundColor(to_term_color(cell.fg))
                    )?;
                    last = Some((cell.bg, cell.fg));
                }
                queue!(out, Print(cell.glyph))?;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()
    }

    fn cell_mut(&mut self, col: i32, row: i32) -> Option<&mut Cell> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        let idx = row as usize * self.cols as usize + col as usize;
        self.cells.get_mut(idx)
    }

    fn blend(&mut self, col: i32, row: i32, color: Color) {
        let alpha = (color.a * self.state.alpha).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        if let Some(cell) = self.cell_mut(col, row) {
            let mixed = cell.bg.lerp(color.with_alpha(1.0), alpha);
            cell.bg = Color { a: 1.0, ..mixed };
        }
    }

    /// Even-odd scanline fill of a polygon given in grid coordinates
    fn fill_grid_polygon(&mut self, points: &[(f32, f32)], color_at: impl Fn(f32, f32) -> Color) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).max(0.0);
        let max_y = points
            .iter()
            .map(|p| p.1)
            .fold(f32::NEG_INFINITY, f32::max)
            .min(self.rows as f32);
        if !min_y.is_finite() || !max_y.is_finite() || min_y >= max_y {
            return;
        }

        let mut crossings = Vec::new();
        for row in min_y.floor() as i32..max_y.ceil() as i32 {
            let sample_y = row as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                if (y0 <= sample_y && y1 > sample_y) || (y1 <= sample_y && y0 > sample_y) {
                    crossings.push(x0 + (sample_y - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks(2) {
                if let [start, end] = pair {
                    let first = (start - 0.5).ceil().max(0.0) as i32;
                    let last = (end - 0.5).floor().min(self.cols as f32 - 1.0) as i32;
                    for col in first..=last {
                        let color = color_at(col as f32 + 0.5, sample_y);
                        self.blend(col, row, color);
                    }
                }
            }
        }
    }

    fn to_grid(&self, x: f32, y: f32) -> (f32, f32) {
        self.state.transform.apply(x, y)
    }
}

impl Surface for TerminalSurface {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.rotate(radians);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.scale(sx, sy);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = (self.state.alpha * alpha).clamp(0.0, 1.0);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        self.fill_polygon(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)], paint);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color) {
        let (gx, gy) = self.to_grid(cx, cy);
        let t = &self.state.transform;
        let rx = (t.a * t.a + t.b * t.b).sqrt() * r;
        let ry = (t.c * t.c + t.d * t.d).sqrt() * r;
        if rx <= 0.0 || ry <= 0.0 || !gx.is_finite() || !gy.is_finite() {
            return;
        }

        let row_min = (gy - ry).floor().max(0.0) as i32;
        let row_max = (gy + ry).ceil().min(self.rows as f32) as i32;
        let col_min = (gx - rx).floor().max(0.0) as i32;
        let col_max = (gx + rx).ceil().min(self.cols as f32) as i32;
        for row in row_min..row_max {
            for col in col_min..col_max {
                let dx = (col as f32 + 0.5 - gx) / rx;
                let dy = (row as f32 + 0.5 - gy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend(col, row, color);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], paint: &Paint) {
        let grid: Vec<(f32, f32)> = points.iter().map(|&(x, y)| self.to_grid(x, y)).collect();
        match paint {
            Paint::Solid { color } => {
                let color = *color;
                self.fill_grid_polygon(&grid, |_, _| color);
            }
            Paint::Vertical { .. } => {
                // Gradients are defined in local space; map grid samples back
                let inverse = invert(&self.state.transform);
                let paint = paint.clone();
                self.fill_grid_polygon(&grid, move |gx, gy| {
                    let local_y = inverse.map(|inv| inv.apply(gx, gy).1).unwrap_or(0.0);
                    paint.color_at(local_y)
                });
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, _width: f32) {
        for pair in points.windows(2) {
            let (x0, y0) = self.to_grid(pair[0].0, pair[0].1);
            let (x1, y1) = self.to_grid(pair[1].0, pair[1].1);
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().clamp(1.0, 4096.0) as i32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let x = x0 + (x1 - x0) * t;
                let y = y0 + (y1 - y0) * t;
                if x.is_finite() && y.is_finite() {
                    self.blend(x.floor() as i32, y.floor() as i32, color);
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, _size: f32, color: Color, align: TextAlign) {
        let (gx, gy) = self.to_grid(x, y);
        if !gx.is_finite() || !gy.is_finite() {
            return;
        }
        let len = text.chars().count() as f32;
        let start = match align {
            TextAlign::Left => gx,
            TextAlign::Center => gx - len / 2.0,
            TextAlign::Right => gx - len,
        };
        let row = gy.floor() as i32;
        let fg = color.with_alpha(1.0);
        for (i, ch) in text.chars().enumerate() {
            let col = start.round() as i32 + i as i32;
            if let Some(cell) = self.cell_mut(col, row) {
                cell.glyph = ch;
                cell.fg = fg;
            }
        }
    }
}

fn invert(t: &Transform) -> Option<Transform> {
    let det = t.a * t.d - t.b * t.c;
    if det.abs() < f32::EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    Some(Transform {
        a: t.d * inv_det,
        b: -t.b * inv_det,
        c: -t.c * inv_det,
        d: t.a * inv_det,
        e: (t.c * t.f - t.d * t.e) * inv_det,
        f: (t.b * t.e - t.a * t.f) * inv_det,
    })
}

fn to_term_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GradientStop;

    fn create_test_surface() -> TerminalSurface {
        // One cell per 10x10 logical units
        TerminalSurface::new(
            20,
            10,
            Viewport {
                width: 200.0,
                height: 100.0,
            },
        )
    }

    #[test]
    fn test_rect_fills_expected_cells() {
        let mut surface = create_test_surface();
        let red = Color::rgb(255, 0, 0);
        surface.fill_rect(20.0, 20.0, 40.0, 30.0, &Paint::solid(red));

        assert_eq!(surface.cell(2, 2).unwrap().bg, red);
        assert_eq!(surface.cell(5, 4).unwrap().bg, red);
        assert_eq!(surface.cell(6, 4).unwrap().bg, Color::BLACK);
        assert_eq!(surface.cell(2, 5).unwrap().bg, Color::BLACK);
    }

    #[test]
    fn test_translate_and_restore() {
        let mut surface = create_test_surface();
        let blue = Color::rgb(0, 0, 255);
        surface.save();
        surface.translate(100.0, 50.0);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0, &Paint::solid(blue));
        surface.restore();
        surface.fill_rect(0.0, 0.0, 10.0, 10.0, &Paint::solid(blue));

        assert_eq!(surface.cell(10, 5).unwrap().bg, blue);
        assert_eq!(surface.cell(0, 0).unwrap().bg, blue);
    }

    #[test]
    fn test_alpha_blends_with_background() {
        let mut surface = create_test_surface();
        surface.fill_circle(100.0, 50.0, 20.0, Color::rgba(200, 200, 200, 0.5));
        let cell = surface.cell(10, 5).unwrap();
        assert_eq!((cell.bg.r, cell.bg.g, cell.bg.b), (100, 100, 100));
    }

    #[test]
    fn test_text_centered() {
        let mut surface = create_test_surface();
        surface.fill_text("GO", 100.0, 55.0, 12.0, Color::WHITE, TextAlign::Center);
        assert_eq!(surface.row_text(5).trim(), "GO");
        assert_eq!(surface.cell(9, 5).unwrap().glyph, 'G');
    }

    #[test]
    fn test_vertical_gradient_follows_local_y() {
        let mut surface = create_test_surface();
        let paint = Paint::vertical(
            0.0,
            100.0,
            &[
                GradientStop::new(0.0, Color::rgb(0, 0, 0)),
                GradientStop::new(1.0, Color::rgb(255, 255, 255)),
            ],
        );
        surface.fill_rect(0.0, 0.0, 200.0, 100.0, &paint);
        let top = surface.cell(0, 0).unwrap().bg;
        let bottom = surface.cell(0, 9).unwrap().bg;
        assert!(bottom.r > top.r, "Gradient should brighten downward");
    }

    #[test]
    fn test_offscreen_drawing_is_clipped() {
        let mut surface = create_test_surface();
        surface.fill_rect(-500.0, -500.0, 100.0, 100.0, &Paint::solid(Color::WHITE));
        surface.stroke_line(-1000.0, 50.0, 5000.0, 50.0, Color::WHITE, 2.0);
        surface.fill_text("far away", 9000.0, 50.0, 12.0, Color::WHITE, TextAlign::Left);
        assert_eq!(surface.cell(0, 0).unwrap().bg, Color::BLACK);
        assert_eq!(surface.cell(0, 5).unwrap().bg, Color::WHITE);
    }
}
