#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn x_max(&self) -> f32 {
        self.x + self.width
    }

    pub fn y_max(&self) -> f32 {
        self.y + self.height
    }

    /// True when either dimension is zero, which is how an unset clip rect looks.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x_max()
            && self.x_max() > other.x
            && self.y < other.y_max()
            && self.y_max() > other.y
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x_max() && y >= self.y && y < self.y_max()
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let x_max = self.x_max().min(other.x_max());
        let y_max = self.y_max().min(other.y_max());
        Rect::new(x, y, (x_max - x).max(0.0), (y_max - y).max(0.0))
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }

    /// Size reported when nothing has been measured yet.
    pub const fn undefined() -> Self {
        Self {
            width: f32::NAN,
            height: f32::NAN,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::zero()
    }
}

/// Reading direction, inherited down the physical tree unless set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageDirection {
    #[default]
    Inherit,
    Ltr,
    Rtl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(50.0, 40.0));
        assert!(rect.contains(10.0, 20.0));
        assert!(!rect.contains(110.0, 70.0));
        assert!(!rect.contains(5.0, 40.0));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 60.0, 100.0, 100.0);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Rect::new(50.0, 60.0, 50.0, 40.0));

        let far = Rect::new(500.0, 500.0, 10.0, 10.0);
        assert!(!a.intersects(&far));
        assert!(a.intersection(&far).is_degenerate());
    }

    #[test]
    fn test_rect_degenerate() {
        assert!(Rect::ZERO.is_degenerate());
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 10.0, 10.0).is_degenerate());
    }

    #[test]
    fn test_color_default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }
}
