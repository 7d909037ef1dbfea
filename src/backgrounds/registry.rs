use std::collections::BTreeMap;

use crate::backgrounds::{
    fill::{LinearGradient, RadialGradient, RadialShape, SolidBackdrop},
    palette,
    traits::{Backdrop, ColorStop},
};

type BackdropFactory = Box<dyn Fn() -> Box<dyn Backdrop> + Send + Sync>;

/// Registry for the backdrops an export can be composed over
///
/// Backdrops are registered by name. The ten editor presets are available as
/// `preset-0` through `preset-9`, in the order the editor lists them.
pub struct BackdropRegistry {
    backdrops: BTreeMap<String, BackdropFactory>,
}

impl BackdropRegistry {
    /// Create a new registry with all built-in backdrops
    pub fn new() -> Self {
        let mut registry = Self {
            backdrops: BTreeMap::new(),
        };
        registry.register_builtin_backdrops();
        registry
    }

    fn register_builtin_backdrops(&mut self) {
        for index in 0..PRESET_COUNT {
            let name = preset_name(index);
            let factory_name = name.clone();
            self.backdrops.insert(
                name,
                Box::new(move || build_preset(index, &factory_name)),
            );
        }

        self.backdrops.insert(
            "solid".to_string(),
            Box::new(|| Box::new(SolidBackdrop::new("solid", palette::WHITE))),
        );
    }

    /// Register a custom backdrop
    pub fn register<F>(&mut self, name: String, factory: F)
    where
        F: Fn() -> Box<dyn Backdrop> + Send + Sync + 'static,
    {
        self.backdrops.insert(name, Box::new(factory));
    }

    /// Get a backdrop by name
    pub fn get_backdrop(&self, name: &str) -> Option<Box<dyn Backdrop>> {
        self.backdrops.get(name).map(|factory| factory())
    }

    /// Get an editor preset by its position in the picker
    pub fn preset(&self, index: usize) -> Option<Box<dyn Backdrop>> {
        self.get_backdrop(&preset_name(index))
    }

    /// All registered names, sorted
    pub fn available_backdrops(&self) -> Vec<String> {
        self.backdrops.keys().cloned().collect()
    }

    pub fn has_backdrop(&self, name: &str) -> bool {
        self.backdrops.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.backdrops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backdrops.is_empty()
    }
}

impl Default for BackdropRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub const PRESET_COUNT: usize = 10;

pub fn preset_name(index: usize) -> String {
    format!("preset-{}", index)
}

fn stops(colors: &[[u8; 4]]) -> Vec<ColorStop> {
    let last = colors.len().saturating_sub(1).max(1) as f32;
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| ColorStop::new(i as f32 / last, *color))
        .collect()
}

fn build_preset(index: usize, name: &str) -> Box<dyn Backdrop> {
    use palette::*;

    match index {
        // Soft radial with a bluish glow
        0 => Box::new(RadialGradient::new(
            name,
            RadialShape::Ellipse,
            (0.5, 0.5),
            stops(&[with_alpha(BLUE, 0.2), with_alpha(WHITE, 0.1), with_alpha(PURPLE, 0.3)]),
        )),
        // Diagonal blend with light tones
        1 => Box::new(LinearGradient::new(name, 135.0, stops(&[PURPLE_LIGHT, ACCENT]))),
        // Clean horizontal blend
        2 => Box::new(LinearGradient::new(name, 90.0, stops(&[BLUE_LIGHT, PURPLE]))),
        // Energetic left to right blend
        3 => Box::new(LinearGradient::new(name, 90.0, stops(&[BLUE, PURPLE]))),
        // Centre glow
        4 => Box::new(RadialGradient::new(
            name,
            RadialShape::Circle,
            (0.5, 0.5),
            stops(&[with_alpha(ACCENT, 0.3), PURPLE_LIGHT, TRANSPARENT]),
        )),
        // Bottom-right light throw
        5 => Box::new(LinearGradient::new(
            name,
            135.0,
            stops(&[with_alpha(PURPLE, 0.4), with_alpha(ACCENT, 0.3), with_alpha(BLUE, 0.1)]),
        )),
        // Circular gradient with purple core in the top-left
        6 => Box::new(RadialGradient::new(
            name,
            RadialShape::Circle,
            (0.0, 0.0),
            stops(&[PURPLE, with_alpha(BLUE, 0.2)]),
        )),
        // Muted diagonal
        7 => Box::new(LinearGradient::new(
            name,
            45.0,
            stops(&[with_alpha(PURPLE, 0.1), with_alpha(BLUE, 0.3)]),
        )),
        // Radial shimmer from the bottom edge
        8 => Box::new(RadialGradient::new(
            name,
            RadialShape::Ellipse,
            (0.5, 1.0),
            stops(&[with_alpha(ACCENT, 0.4), PURPLE_LIGHT, with_alpha(BLUE, 0.1)]),
        )),
        // Top-down bold blend
        _ => Box::new(LinearGradient::new(
            name,
            180.0,
            stops(&[with_alpha(BLUE, 0.3), PURPLE, ACCENT]),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::Frame;

    #[test]
    fn test_builtin_backdrops_available() {
        let registry = BackdropRegistry::new();

        for index in 0..PRESET_COUNT {
            assert!(registry.has_backdrop(&preset_name(index)));
        }
        assert!(registry.has_backdrop("solid"));
        assert_eq!(registry.len(), PRESET_COUNT + 1);
    }

    #[test]
    fn test_preset_lookup_keeps_name() {
        let registry = BackdropRegistry::new();
        let backdrop = registry.preset(3).unwrap();
        assert_eq!(backdrop.name(), "preset-3");
        assert!(registry.preset(PRESET_COUNT).is_none());
        assert!(registry.get_backdrop("unknown").is_none());
    }

    #[test]
    fn test_every_preset_paints() {
        let registry = BackdropRegistry::new();
        for name in registry.available_backdrops() {
            let backdrop = registry.get_backdrop(&name).unwrap();
            let mut frame = Frame::new_filled(16, 9, palette::WHITE);
            backdrop.paint(&mut frame).unwrap();
        }
    }

    #[test]
    fn test_custom_backdrop_registration() {
        let mut registry = BackdropRegistry::new();
        registry.register("black".to_string(), || {
            Box::new(SolidBackdrop::new("black", [0, 0, 0, 255]))
        });

        assert!(registry.has_backdrop("black"));
        assert_eq!(registry.len(), PRESET_COUNT + 2);
    }
}
