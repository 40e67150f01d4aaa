//! Fixed aspect ratio catalog.

/// Target width:height ratios the crop rectangle can be locked to.
///
/// The catalog is fixed; there are no user-defined ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    R1_33,
    R1_48,
    R1_81,
}

/// All selectable ratios, in menu order.
pub const RATIOS: [AspectRatio; 4] = [
    AspectRatio::Square,
    AspectRatio::R1_33,
    AspectRatio::R1_48,
    AspectRatio::R1_81,
];

impl AspectRatio {
    /// Numeric width/height ratio.
    pub fn value(self) -> f32 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::R1_33 => 1.33,
            AspectRatio::R1_48 => 1.48,
            AspectRatio::R1_81 => 1.81,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::R1_33 => "1.33:1",
            AspectRatio::R1_48 => "1.48:1",
            AspectRatio::R1_81 => "1.81:1",
        }
    }

    /// Label with the colon replaced, for use inside filenames.
    pub fn file_label(self) -> String {
        self.label().replace(':', "x")
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
