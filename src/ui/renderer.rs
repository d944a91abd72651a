/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Fold the scene's pixel canvas into braille cells (2 × 4 pixels per
///      terminal cell) in the `front` buffer, then print text overlays on top
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The 128 × 96 logical screen becomes 64 × 24 terminal cells, centred in
/// whatever the terminal offers.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::sim::world::ScreenKind;
use super::canvas::{Align, Baseline, PixelCanvas, TextOverlay};

/// Pixels per terminal cell.
pub const CELL_PX_W: usize = 2;
pub const CELL_PX_H: usize = 4;

const BRAILLE_BASE: u32 = 0x2800;
/// Dot bit for each pixel of a cell, indexed `[row][col]`.
const BRAILLE_DOTS: [[u32; 2]; 4] = [
    [0x01, 0x08],
    [0x02, 0x10],
    [0x04, 0x20],
    [0x40, 0x80],
];

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so row gaps on VTE-based
    /// terminals match the cells.
    const BASE_BG: Color = Color::Rgb { r: 12, g: 12, b: 16 };
    const PIXEL_FG: Color = Color::Rgb { r: 230, g: 226, b: 208 };
    const TEXT_FG: Color = Color::Rgb { r: 255, g: 214, b: 120 };

    const BLANK: Cell = Cell { ch: ' ', fg: Cell::PIXEL_FG };

    /// Sentinel used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell { ch, fg });
        }
    }
}

// ── Pixel folding ──

/// The braille glyph for the 2 × 4 pixel block at cell (col, row).
fn braille_at(canvas: &PixelCanvas, col: usize, row: usize) -> char {
    let mut bits = 0;
    for (dy, dots) in BRAILLE_DOTS.iter().enumerate() {
        for (dx, bit) in dots.iter().enumerate() {
            if canvas.pixel(col * CELL_PX_W + dx, row * CELL_PX_H + dy) {
                bits |= bit;
            }
        }
    }
    char::from_u32(BRAILLE_BASE + bits).unwrap_or(' ')
}

/// Top-left cell of a text overlay. A character is one cell wide and tall.
fn text_origin(t: &TextOverlay) -> (i32, i32) {
    let width = (t.text.chars().count() * CELL_PX_W) as f32;
    let height = CELL_PX_H as f32;
    let left = match t.align {
        Align::Left => t.x,
        Align::Center => t.x - width / 2.0,
        Align::Right => t.x - width,
    };
    let top = match t.baseline {
        Baseline::Top => t.y,
        Baseline::Middle => t.y - height / 2.0,
        Baseline::Bottom => t.y - height,
    };
    (
        (left / CELL_PX_W as f32).floor() as i32,
        (top / CELL_PX_H as f32).floor() as i32,
    )
}

/// Compose the canvas into `buf` with its top-left cell at (ox, oy).
fn compose(buf: &mut FrameBuffer, canvas: &PixelCanvas, ox: usize, oy: usize) {
    let cols = canvas.width().div_ceil(CELL_PX_W);
    let rows = canvas.height().div_ceil(CELL_PX_H);
    for row in 0..rows {
        for col in 0..cols {
            let ch = braille_at(canvas, col, row);
            if ch != '\u{2800}' {
                buf.set(ox + col, oy + row, Cell { ch, fg: Cell::PIXEL_FG });
            }
        }
    }

    for t in canvas.texts() {
        let (col, row) = text_origin(t);
        if row < 0 || row as usize >= rows {
            continue;
        }
        // Clip text that starts left of the screen.
        let skip = (-col).max(0) as usize;
        let text: String = t.text.chars().skip(skip).collect();
        let col = col.max(0) as usize;
        if col < cols {
            let visible: String = text.chars().take(cols - col).collect();
            buf.put_str(ox + col, oy + row as usize, &visible, Cell::TEXT_FG);
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<ScreenKind>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, canvas: &PixelCanvas, screen: ScreenKind) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for clean transition
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        let cols = canvas.width().div_ceil(CELL_PX_W);
        let rows = canvas.height().div_ceil(CELL_PX_H);
        let ox = self.term_w.saturating_sub(cols) / 2;
        let oy = self.term_h.saturating_sub(rows) / 2;

        self.front.clear();
        compose(&mut self.front, canvas, ox, oy);

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Cell::PIXEL_FG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal's
        // own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::Canvas;

    fn overlay(text: &str, x: f32, y: f32, align: Align, baseline: Baseline) -> TextOverlay {
        TextOverlay { text: text.into(), x, y, align, baseline }
    }

    #[test]
    fn braille_dot_order() {
        let mut c = PixelCanvas::new(4, 8);
        assert_eq!(braille_at(&c, 0, 0), '\u{2800}');
        c.rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(braille_at(&c, 0, 0), '\u{2801}');
        c.rect(1.0, 3.0, 1.0, 1.0);
        assert_eq!(braille_at(&c, 0, 0), '\u{2881}');
        c.rect(0.0, 0.0, 2.0, 4.0);
        assert_eq!(braille_at(&c, 0, 0), '\u{28FF}');
        assert_eq!(braille_at(&c, 1, 1), '\u{2800}');
    }

    #[test]
    fn text_alignment_in_cells() {
        assert_eq!(text_origin(&overlay("0%", 2.0, 2.0, Align::Left, Baseline::Top)), (1, 0));
        assert_eq!(text_origin(&overlay("level 1", 126.0, 2.0, Align::Right, Baseline::Top)), (56, 0));
        assert_eq!(text_origin(&overlay("game over", 64.0, 80.0, Align::Center, Baseline::Bottom)), (27, 19));
        assert_eq!(text_origin(&overlay("ab", 64.0, 48.0, Align::Center, Baseline::Middle)), (31, 11));
    }

    #[test]
    fn compose_offsets_pixels_and_text() {
        let mut c = PixelCanvas::new(128, 96);
        c.rect(4.0, 8.0, 2.0, 4.0);
        c.text("hi", 0.0, 0.0, Align::Left, Baseline::Top);
        let mut buf = FrameBuffer::new(80, 30);
        compose(&mut buf, &c, 8, 3);

        assert_eq!(buf.get(8 + 2, 3 + 2).ch, '\u{28FF}');
        assert_eq!(buf.get(8, 3).ch, 'h');
        assert_eq!(buf.get(9, 3).ch, 'i');
        assert_eq!(buf.get(9, 3).fg, Cell::TEXT_FG);
        assert_eq!(buf.get(8 + 3, 3 + 2), Cell::BLANK);
    }

    #[test]
    fn text_is_clipped_to_the_screen() {
        let mut c = PixelCanvas::new(8, 4);
        c.text("abcdef", 0.0, 0.0, Align::Center, Baseline::Top);
        let mut buf = FrameBuffer::new(10, 2);
        compose(&mut buf, &c, 0, 0);
        // Starts three cells left of the screen.
        assert_eq!(buf.get(0, 0).ch, 'd');
        assert_eq!(buf.get(2, 0).ch, 'f');
        assert_eq!(buf.get(3, 0), Cell::BLANK);
    }
}
