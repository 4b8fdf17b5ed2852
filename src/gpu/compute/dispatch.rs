//! Workgroup grid sizes.

/// A 1-3 dimensional workgroup count. `y` and `z` default to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchDims {
    pub x: u32,
    pub y: Option<u32>,
    pub z: Option<u32>,
}

impl DispatchDims {
    pub fn x(x: u32) -> Self {
        Self { x, y: None, z: None }
    }

    pub fn xy(x: u32, y: u32) -> Self {
        Self {
            x,
            y: Some(y),
            z: None,
        }
    }

    pub fn xyz(x: u32, y: u32, z: u32) -> Self {
        Self {
            x,
            y: Some(y),
            z: Some(z),
        }
    }

    /// Enough workgroups of `workgroup_size` to cover `elements` along x.
    pub fn covering(elements: u32, workgroup_size: u32) -> Self {
        Self::x(elements.div_ceil(workgroup_size.max(1)))
    }

    /// The full `(x, y, z)` grid with defaults applied.
    pub fn resolved(&self) -> (u32, u32, u32) {
        (self.x, self.y.unwrap_or(1), self.z.unwrap_or(1))
    }

    /// Total number of workgroups launched.
    pub fn total(&self) -> u64 {
        let (x, y, z) = self.resolved();
        x as u64 * y as u64 * z as u64
    }
}

impl From<u32> for DispatchDims {
    fn from(x: u32) -> Self {
        Self::x(x)
    }
}

impl From<(u32, u32)> for DispatchDims {
    fn from((x, y): (u32, u32)) -> Self {
        Self::xy(x, y)
    }
}

impl From<(u32, u32, u32)> for DispatchDims {
    fn from((x, y, z): (u32, u32, u32)) -> Self {
        Self::xyz(x, y, z)
    }
}
