/// An axis-aligned rectangle in pixel space, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub pos: (u32, u32),
    pub size: (u32, u32),
}

impl Rect {
    #[inline]
    pub fn new(pos: (u32, u32), size: (u32, u32)) -> Self {
        Self { pos, size }
    }

    /// The exclusive bottom-right corner.
    #[inline]
    pub fn max(&self) -> (u32, u32) {
        (self.pos.0 + self.size.0, self.pos.1 + self.size.1)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        let (self_max, other_max) = (self.max(), other.max());

        let x_overlap = self.pos.0 < other_max.0 && other.pos.0 < self_max.0;
        let y_overlap = self.pos.1 < other_max.1 && other.pos.1 < self_max.1;

        x_overlap && y_overlap
    }

    /// Tells whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        let (self_max, other_max) = (self.max(), other.max());

        other.pos.0 >= self.pos.0
            && other.pos.1 >= self.pos.1
            && other_max.0 <= self_max.0
            && other_max.1 <= self_max.1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new((0, 0), (10, 10));
        let b = Rect::new((10, 0), (10, 10));
        let c = Rect::new((0, 10), (10, 10));

        assert!(!a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn overlapping() {
        let a = Rect::new((0, 0), (10, 10));
        let b = Rect::new((5, 5), (10, 10));

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn containment() {
        let outer = Rect::new((0, 0), (100, 50));

        assert!(outer.contains(&Rect::new((90, 40), (10, 10))));
        assert!(!outer.contains(&Rect::new((91, 40), (10, 10))));
    }
}
