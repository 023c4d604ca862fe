use serde::{Deserialize, Serialize};

/// How the model surface is coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Lambert diffuse plus ambient.
    #[default]
    Lit,
    /// Constant colour, no lighting.
    Flat,
    /// World-space normals mapped to RGB.
    Normals,
    /// Triangle edges only. Needs `POLYGON_MODE_LINE`.
    Wireframe,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 4] =
        [ShadingMode::Lit, ShadingMode::Flat, ShadingMode::Normals, ShadingMode::Wireframe];

    pub fn label(self) -> &'static str {
        match self {
            ShadingMode::Lit => "Lit",
            ShadingMode::Flat => "Flat",
            ShadingMode::Normals => "Normals",
            ShadingMode::Wireframe => "Wireframe",
        }
    }

    /// Value of `shading.mode` in the fragment shader.
    pub fn shader_index(self) -> u32 {
        match self {
            ShadingMode::Lit => 0,
            ShadingMode::Flat | ShadingMode::Wireframe => 1,
            ShadingMode::Normals => 2,
        }
    }

    pub fn uses_line_pipeline(self) -> bool {
        self == ShadingMode::Wireframe
    }

    pub fn is_available(self, wireframe_supported: bool) -> bool {
        wireframe_supported || !self.uses_line_pipeline()
    }

    /// Next available mode, wrapping around.
    pub fn next(self, wireframe_supported: bool) -> Self {
        let start = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        (1..=Self::ALL.len())
            .map(|step| Self::ALL[(start + step) % Self::ALL.len()])
            .find(|m| m.is_available(wireframe_supported))
            .unwrap_or(ShadingMode::Lit)
    }

    /// Mode bound to the `n`-th number key (1-based).
    pub fn from_number_key(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        let mut mode = ShadingMode::Lit;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next(true);
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![ShadingMode::Flat, ShadingMode::Normals, ShadingMode::Wireframe, ShadingMode::Lit]
        );
    }

    #[test]
    fn test_cycle_skips_unsupported_wireframe() {
        assert_eq!(ShadingMode::Normals.next(false), ShadingMode::Lit);
        assert_eq!(ShadingMode::Wireframe.next(false), ShadingMode::Lit);
        assert!(!ShadingMode::Wireframe.is_available(false));
    }

    #[test]
    fn test_number_keys() {
        assert_eq!(ShadingMode::from_number_key(1), Some(ShadingMode::Lit));
        assert_eq!(ShadingMode::from_number_key(4), Some(ShadingMode::Wireframe));
        assert_eq!(ShadingMode::from_number_key(0), None);
        assert_eq!(ShadingMode::from_number_key(5), None);
    }

    #[test]
    fn test_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ShadingMode,
        }
        let w: Wrapper = toml::from_str("mode = \"normals\"").unwrap();
        assert_eq!(w.mode, ShadingMode::Normals);
    }
}
