//! Math types used by widget properties and style fragments.
//!
//! Vectors come from [`glam`]; [`Border`] is the integer inset type used for
//! margins and nine-slice background borders.
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{IVec2, UVec2, Vec2};

/// Integer insets on the four sides of a rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub struct Border {
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub right: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub bottom: i32,
}

impl Border {
    pub const ZERO: Border = Border::new(0, 0, 0, 0);

    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Same inset on every side.
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::ZERO
    }

    /// Combined horizontal and vertical inset.
    pub fn total(&self) -> IVec2 {
        IVec2::new(self.left + self.right, self.top + self.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_total() {
        let border = Border::new(1, 2, 3, 4);
        assert_eq!(border.total(), IVec2::new(3, 7));
        assert!(!border.is_empty());
        assert!(Border::default().is_empty());
    }

    #[test]
    fn test_border_partial_json() {
        let border: Border = serde_json::from_str(r#"{"left": 4, "bottom": 2}"#).unwrap();
        assert_eq!(border, Border::new(4, 0, 0, 2));
    }
}
