/// Drawing capability and a monochrome pixel-buffer implementation.
///
/// Scene code draws in world units through `Canvas`; transforms work like
/// a 2D canvas context (`save`/`restore` a stack of affine matrices,
/// `translate` and `rotate` compose onto the current one). `PixelCanvas`
/// rasterises into a `width × height` bitmap, one pixel per world unit,
/// and keeps text as overlays for the terminal presenter to print.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Baseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

pub trait Canvas {
    /// Blank the whole surface.
    fn clear(&mut self);
    /// Blank a rectangle (transformed like any other shape).
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    /// Bresenham line between the floored endpoints; `dotted` keeps every
    /// fourth pixel.
    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, dotted: bool);
    /// Filled rectangle.
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn text(&mut self, text: &str, x: f32, y: f32, align: Align, baseline: Baseline);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, angle: f32);
    fn reset_transform(&mut self);
    /// Map a local point through the current transform.
    fn transform_point(&self, x: f32, y: f32) -> (f32, f32);
}

// ── Affine transform ──

/// `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Affine {
        Affine {
            e: self.a * dx + self.c * dy + self.e,
            f: self.b * dx + self.d * dy + self.f,
            ..*self
        }
    }

    pub fn rotated(&self, angle: f32) -> Affine {
        let (sin, cos) = angle.sin_cos();
        Affine {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..*self
        }
    }

    fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.c == 0.0
    }
}

impl Default for Affine {
    fn default() -> Self {
        Affine::IDENTITY
    }
}

// ── PixelCanvas ──

/// Text drawn this frame, anchored in device pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub align: Align,
    pub baseline: Baseline,
}

#[derive(Clone, Debug)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
    texts: Vec<TextOverlay>,
    transform: Affine,
    stack: Vec<Affine>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        PixelCanvas {
            width,
            height,
            pixels: vec![false; width * height],
            texts: Vec::new(),
            transform: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Is the device pixel at (x, y) lit? Outside reads as dark.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    pub fn texts(&self) -> &[TextOverlay] {
        &self.texts
    }

    /// Light one local-space unit square through the current transform.
    fn plot(&mut self, x: f32, y: f32) {
        let (dx, dy) = self.transform.apply(x, y);
        self.set_device(dx.floor(), dy.floor(), true);
    }

    fn set_device(&mut self, x: f32, y: f32, on: bool) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = on;
        }
    }

    /// Fill (or blank) a local-space rectangle.
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, on: bool) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        if self.transform.is_axis_aligned() {
            let (x0, y0) = self.transform.apply(x, y);
            let (x1, y1) = self.transform.apply(x + w, y + h);
            let (x0, x1) = (x0.min(x1).round(), x0.max(x1).round());
            let (y0, y1) = (y0.min(y1).round(), y0.max(y1).round());
            let mut py = y0;
            while py < y1 {
                let mut px = x0;
                while px < x1 {
                    self.set_device(px, py, on);
                    px += 1.0;
                }
                py += 1.0;
            }
        } else {
            // Rotated: sample at half-unit spacing.
            let steps_x = (w * 2.0).ceil() as u32;
            let steps_y = (h * 2.0).ceil() as u32;
            for j in 0..steps_y {
                for i in 0..steps_x {
                    let (dx, dy) = self.transform.apply(x + i as f32 * 0.5 + 0.25, y + j as f32 * 0.5 + 0.25);
                    self.set_device(dx.floor(), dy.floor(), on);
                }
            }
        }
    }
}

impl Canvas for PixelCanvas {
    fn clear(&mut self) {
        self.pixels.fill(false);
        self.texts.clear();
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.fill(x, y, w, h, false);
        let (x0, y0) = self.transform.apply(x, y);
        let (x1, y1) = self.transform.apply(x + w, y + h);
        let (lx, hx) = (x0.min(x1), x0.max(x1));
        let (ly, hy) = (y0.min(y1), y0.max(y1));
        self.texts.retain(|t| !(t.x >= lx && t.x < hx && t.y >= ly && t.y < hy));
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, dotted: bool) {
        let (x0, y0) = (x0.floor() as i64, y0.floor() as i64);
        let (x1, y1) = (x1.floor() as i64, y1.floor() as i64);

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };

        let mut error = dx + dy;
        let (mut x, mut y) = (x0, y0);
        // A line never needs more than one pixel per unit of its long axis.
        let max_pixels = dx.max(-dy) + 1;

        for i in 0..max_pixels {
            if !dotted || i % 4 == 0 {
                self.plot(x as f32, y as f32);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * error;
            if e2 >= dy {
                if x == x1 {
                    break;
                }
                error += dy;
                x += sx;
            }
            if e2 <= dx {
                if y == y1 {
                    break;
                }
                error += dx;
                y += sy;
            }
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.fill(x, y, w, h, true);
    }

    fn text(&mut self, text: &str, x: f32, y: f32, align: Align, baseline: Baseline) {
        let (x, y) = self.transform.apply(x, y);
        self.texts.push(TextOverlay { text: text.to_string(), x, y, align, baseline });
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.translated(dx, dy);
    }

    fn rotate(&mut self, angle: f32) {
        self.transform = self.transform.rotated(angle);
    }

    fn reset_transform(&mut self) {
        self.transform = Affine::IDENTITY;
    }

    fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        self.transform.apply(x, y)
    }
}
