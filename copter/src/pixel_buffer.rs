/// RGBA8 pixel buffer the renderer draws into and every frontend presents
#[derive(Clone)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>, // RGBA
}

impl PixelBuffer {
    /// Create a black buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; (width * height) as usize],
        }
    }

    /// Reallocate for a new size; contents are reset to black
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![[0, 0, 0, 255]; (width * height) as usize];
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixels.fill(color);
    }

    /// Set pixel at coordinates (x, y) to color
    /// Returns true if pixel was set, false if out of bounds
    pub fn set_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        let index = (y as u32 * self.width + x as u32) as usize;
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => false,
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Draw a line from (x0, y0) to (x1, y1); endpoints may lie off screen
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 4]) {
        let Some((x0, y0, x1, y1)) = self.clip(x0, y0, x1, y1) else {
            return;
        };

        // Bresenham's line algorithm
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Cohen-Sutherland clip against the buffer rectangle
    fn clip(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<(i32, i32, i32, i32)> {
        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const BOTTOM: u8 = 4;
        const TOP: u8 = 8;

        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (xmin, ymin) = (0.0, 0.0);
        let (xmax, ymax) = ((self.width - 1) as f64, (self.height - 1) as f64);
        let code = |x: f64, y: f64| {
            let mut c = 0;
            if x < xmin {
                c |= LEFT;
            } else if x > xmax {
                c |= RIGHT;
            }
            if y < ymin {
                c |= TOP;
            } else if y > ymax {
                c |= BOTTOM;
            }
            c
        };

        let (mut ax, mut ay, mut bx, mut by) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let mut ca = code(ax, ay);
        let mut cb = code(bx, by);
        loop {
            if ca | cb == 0 {
                return Some((ax.round() as i32, ay.round() as i32, bx.round() as i32, by.round() as i32));
            }
            if ca & cb != 0 {
                return None;
            }
            let out = if ca != 0 { ca } else { cb };
            let (x, y) = if out & TOP != 0 {
                (ax + (bx - ax) * (ymin - ay) / (by - ay), ymin)
            } else if out & BOTTOM != 0 {
                (ax + (bx - ax) * (ymax - ay) / (by - ay), ymax)
            } else if out & RIGHT != 0 {
                (xmax, ay + (by - ay) * (xmax - ax) / (bx - ax))
            } else {
                (xmin, ay + (by - ay) * (xmin - ax) / (bx - ax))
            };
            if out == ca {
                (ax, ay) = (x, y);
                ca = code(ax, ay);
            } else {
                (bx, by) = (x, y);
                cb = code(bx, by);
            }
        }
    }

    /// Flatten into the byte layout canvases and GPU textures expect
    pub fn as_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}
