//! Zoom state for page rendering
//!
//! Keeps the zoom mode (a fixed preset or one of the fitting modes) and turns
//! it into the absolute scale handed to page surfaces. Fitting scales depend
//! on the container and page geometry, so they are computed lazily on the
//! first `factor()` call and cached until the geometry changes.

use serde::{Deserialize, Serialize};

use super::types::Size;

/// Preset zoom scales from 25% to 400%
pub const DEFAULT_PRESETS: [f32; 11] = [0.25, 0.33, 0.5, 0.66, 0.75, 0.9, 1.0, 1.25, 1.5, 2.0, 4.0];

/// Horizontal space reserved for the scrollbar when fitting
pub const DEFAULT_HORIZONTAL_MARGIN: f32 = 45.0;

/// Vertical padding reserved when fitting a whole page
pub const DEFAULT_VERTICAL_MARGIN: f32 = 30.0;

/// CSS pixels per PDF point (96 / 72)
pub const DEFAULT_UNIT_CONVERSION: f32 = 96.0 / 72.0;

/// How the zoom factor is chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// One of the preset scales
    Preset,
    /// Page width fills the container
    FitWidth,
    /// Whole page fits into the container
    #[default]
    FitPage,
}

impl ZoomMode {
    pub fn is_fitting(self) -> bool {
        !matches!(self, Self::Preset)
    }
}

/// Value snapshot of the zoom selection, used in task identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoomDescriptor {
    Preset(usize),
    FitWidth,
    FitPage,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PresetError {
    #[error("preset list is empty")]
    Empty,

    #[error("preset {value} at position {index} is not a positive finite scale")]
    Invalid { index: usize, value: f32 },

    #[error("presets must be strictly ascending (position {index})")]
    NotAscending { index: usize },
}

/// Non-empty, strictly ascending list of positive scales
#[derive(Clone, Debug, PartialEq)]
pub struct PresetScales(Vec<f32>);

impl PresetScales {
    pub fn new(scales: Vec<f32>) -> Result<Self, PresetError> {
        if scales.is_empty() {
            return Err(PresetError::Empty);
        }
        for (index, &value) in scales.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(PresetError::Invalid { index, value });
            }
            if index > 0 && scales[index - 1] >= value {
                return Err(PresetError::NotAscending { index });
            }
        }
        Ok(Self(scales))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, index: usize) -> f32 {
        self.0[index.min(self.0.len() - 1)]
    }

    fn last_index(&self) -> usize {
        self.0.len() - 1
    }

    /// Index of the first preset strictly greater than `scale`
    fn first_above(&self, scale: f32) -> Option<usize> {
        self.0.iter().position(|&preset| preset > scale)
    }

    fn index_of(&self, scale: f32) -> Option<usize> {
        self.0
            .iter()
            .position(|&preset| (preset - scale).abs() <= f32::EPSILON)
    }
}

impl Default for PresetScales {
    fn default() -> Self {
        Self(DEFAULT_PRESETS.to_vec())
    }
}

/// Geometry constants used by the fitting modes
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomConfig {
    pub presets: PresetScales,
    pub horizontal_margin: f32,
    pub vertical_margin: f32,
    pub unit_conversion: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            presets: PresetScales::default(),
            horizontal_margin: DEFAULT_HORIZONTAL_MARGIN,
            vertical_margin: DEFAULT_VERTICAL_MARGIN,
            unit_conversion: DEFAULT_UNIT_CONVERSION,
        }
    }
}

/// Zoom mode and scale for the document view
#[derive(Debug, Clone)]
pub struct Zoom {
    mode: ZoomMode,
    /// Index into the presets, used when mode is `Preset`
    preset_index: usize,
    /// Cached scale for the fitting modes
    fitting_scale: Option<f32>,
    config: ZoomConfig,
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl Zoom {
    /// Smallest fitting scale, used when the container is smaller than the margins
    pub const MIN_FITTING_SCALE: f32 = 0.1;

    #[must_use]
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            mode: ZoomMode::FitPage,
            preset_index: 0,
            fitting_scale: None,
            config,
        }
    }

    pub fn mode(&self) -> ZoomMode {
        self.mode
    }

    pub fn preset_index(&self) -> usize {
        self.preset_index
    }

    pub fn presets(&self) -> &[f32] {
        self.config.presets.as_slice()
    }

    /// Cached fitting scale, if computed since the last geometry change
    pub fn fitting_scale(&self) -> Option<f32> {
        self.fitting_scale
    }

    pub fn descriptor(&self) -> ZoomDescriptor {
        match self.mode {
            ZoomMode::Preset => ZoomDescriptor::Preset(self.preset_index),
            ZoomMode::FitWidth => ZoomDescriptor::FitWidth,
            ZoomMode::FitPage => ZoomDescriptor::FitPage,
        }
    }

    /// Current scale in percents, for display purposes
    pub fn current_percent(&self) -> u32 {
        let effective = match self.mode {
            ZoomMode::Preset => self.config.presets.get(self.preset_index),
            ZoomMode::FitWidth | ZoomMode::FitPage => self.fitting_scale.unwrap_or(1.0),
        };
        (100.0 * effective).round() as u32
    }

    /// Absolute render scale for a page of `page` intrinsic size shown in `container`.
    ///
    /// Fitting scales are computed on the first call and reused until
    /// [`Zoom::on_geometry_change`] or a mode switch.
    pub fn factor(&mut self, page: Size, container: Size) -> f32 {
        let value = match self.mode {
            ZoomMode::Preset => self.config.presets.get(self.preset_index),
            mode => *self
                .fitting_scale
                .get_or_insert_with(|| Self::fit(mode, page, container, &self.config)),
        };
        value / self.config.unit_conversion
    }

    fn fit(mode: ZoomMode, page: Size, container: Size, config: &ZoomConfig) -> f32 {
        let width_scale = (container.width - config.horizontal_margin) / page.width;
        let scale = if mode == ZoomMode::FitWidth {
            width_scale
        } else {
            let height_scale = (container.height - config.vertical_margin) / page.height;
            height_scale.min(width_scale)
        };
        Self::clamp_fitting(scale)
    }

    /// Clamp fitting scale to a usable value, handling NaN/Inf
    fn clamp_fitting(scale: f32) -> f32 {
        if !scale.is_finite() {
            1.0
        } else {
            scale.max(Self::MIN_FITTING_SCALE)
        }
    }

    /// Zoom in one step. Returns false when already at the largest preset.
    ///
    /// From a fitting mode this switches to the first preset greater than the
    /// fitting scale.
    pub fn zoom_in(&mut self) -> bool {
        if self.mode.is_fitting() {
            self.preset_index = self
                .fitting_scale
                .and_then(|scale| self.config.presets.first_above(scale))
                .unwrap_or(0);
            self.mode = ZoomMode::Preset;
            return true;
        }
        if self.preset_index < self.config.presets.last_index() {
            self.preset_index += 1;
            return true;
        }
        false
    }

    /// Zoom out one step. Returns false when already at the smallest preset.
    ///
    /// From a fitting mode this switches to the preset just below the first
    /// preset greater than the fitting scale.
    pub fn zoom_out(&mut self) -> bool {
        if self.mode.is_fitting() {
            self.preset_index = match self
                .fitting_scale
                .and_then(|scale| self.config.presets.first_above(scale))
            {
                Some(above) => above.saturating_sub(1),
                None => self.config.presets.last_index(),
            };
            self.mode = ZoomMode::Preset;
            return true;
        }
        if self.preset_index > 0 {
            self.preset_index -= 1;
            return true;
        }
        false
    }

    /// Switch to a fitting mode; the scale is recomputed on the next `factor()` call.
    ///
    /// Returns false when already in `mode`, the cached scale is kept then.
    pub fn set_fitting(&mut self, mode: ZoomMode) -> bool {
        if !mode.is_fitting() || self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.fitting_scale = None;
        true
    }

    /// Select the preset equal to `scale`. Values that are not presets are ignored.
    pub fn set_preset(&mut self, scale: f32) -> bool {
        match self.config.presets.index_of(scale) {
            Some(index) => {
                self.preset_index = index;
                self.mode = ZoomMode::Preset;
                true
            }
            None => false,
        }
    }

    /// Container geometry changed; fitting scales must be recomputed
    pub fn on_geometry_change(&mut self) {
        if self.mode.is_fitting() {
            self.fitting_scale = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoom_with(presets: &[f32]) -> Zoom {
        Zoom::new(ZoomConfig {
            presets: PresetScales::new(presets.to_vec()).unwrap(),
            ..ZoomConfig::default()
        })
    }

    #[test]
    fn starts_in_fit_page() {
        let zoom = Zoom::default();
        assert_eq!(zoom.mode(), ZoomMode::FitPage);
        assert_eq!(zoom.fitting_scale(), None);
        assert_eq!(zoom.current_percent(), 100);
    }

    #[test]
    fn zoom_in_stops_at_largest_preset() {
        let mut zoom = zoom_with(&[0.25, 0.5, 1.0, 2.0]);
        assert!(zoom.set_preset(1.0));
        assert_eq!(zoom.preset_index(), 2);

        assert!(zoom.zoom_in());
        assert_eq!(zoom.preset_index(), 3);
        assert_eq!(zoom.current_percent(), 200);

        assert!(!zoom.zoom_in());
        assert_eq!(zoom.preset_index(), 3);
        assert_eq!(zoom.current_percent(), 200);
    }

    #[test]
    fn repeated_steps_never_leave_bounds() {
        let mut zoom = Zoom::default();
        zoom.set_preset(0.25);
        let mut steps = 0;
        while zoom.zoom_in() {
            steps += 1;
            assert!(zoom.preset_index() < DEFAULT_PRESETS.len());
        }
        assert_eq!(steps, DEFAULT_PRESETS.len() - 1);
        assert_eq!(zoom.preset_index(), DEFAULT_PRESETS.len() - 1);

        let mut steps = 0;
        while zoom.zoom_out() {
            steps += 1;
        }
        assert_eq!(steps, DEFAULT_PRESETS.len() - 1);
        assert_eq!(zoom.preset_index(), 0);
        assert!(!zoom.zoom_out());
    }

    #[test]
    fn fit_page_uses_smaller_of_both_axes() {
        let mut zoom = Zoom::default();
        let page = Size::new(400.0, 300.0);
        let container = Size::new(800.0, 600.0);

        let first = zoom.factor(page, container);
        assert_eq!(zoom.fitting_scale(), Some(1.8875));
        assert_eq!(first, 1.8875 / DEFAULT_UNIT_CONVERSION);

        let second = zoom.factor(page, Size::new(1600.0, 1200.0));
        assert_eq!(first, second);
    }

    #[test]
    fn geometry_change_forces_recompute() {
        let mut zoom = Zoom::default();
        let page = Size::new(400.0, 300.0);
        let before = zoom.factor(page, Size::new(800.0, 600.0));

        zoom.on_geometry_change();
        assert_eq!(zoom.fitting_scale(), None);

        let after = zoom.factor(page, Size::new(445.0, 600.0));
        assert_eq!(zoom.fitting_scale(), Some(1.0));
        assert_ne!(before, after);
    }

    #[test]
    fn fit_width_ignores_height() {
        let mut zoom = Zoom::default();
        zoom.set_fitting(ZoomMode::FitWidth);
        zoom.factor(Size::new(400.0, 300.0), Size::new(845.0, 100.0));
        assert_eq!(zoom.fitting_scale(), Some(2.0));
        assert_eq!(zoom.current_percent(), 200);
    }

    #[test]
    fn reselecting_fitting_mode_keeps_cached_scale() {
        let mut zoom = Zoom::default();
        zoom.factor(Size::new(400.0, 300.0), Size::new(800.0, 600.0));

        assert!(!zoom.set_fitting(ZoomMode::FitPage));
        assert_eq!(zoom.fitting_scale(), Some(1.8875));
        assert_eq!(zoom.current_percent(), 189);

        assert!(zoom.set_fitting(ZoomMode::FitWidth));
        assert_eq!(zoom.fitting_scale(), None);
    }

    #[test]
    fn preset_mode_ignores_geometry_change() {
        let mut zoom = Zoom::default();
        zoom.set_preset(1.5);
        zoom.on_geometry_change();
        let scale = zoom.factor(Size::new(1.0, 1.0), Size::new(1.0, 1.0));
        assert_eq!(scale, 1.5 / DEFAULT_UNIT_CONVERSION);
    }

    #[test]
    fn zoom_in_from_fitting_picks_next_greater_preset() {
        let mut zoom = Zoom::default();
        zoom.factor(Size::new(400.0, 300.0), Size::new(800.0, 600.0));

        assert!(zoom.zoom_in());
        assert_eq!(zoom.mode(), ZoomMode::Preset);
        assert_eq!(zoom.presets()[zoom.preset_index()], 2.0);
    }

    #[test]
    fn zoom_out_from_fitting_picks_preset_below() {
        let mut zoom = Zoom::default();
        zoom.factor(Size::new(400.0, 300.0), Size::new(800.0, 600.0));

        assert!(zoom.zoom_out());
        assert_eq!(zoom.presets()[zoom.preset_index()], 1.5);
    }

    #[test]
    fn zoom_from_uncomputed_fitting_falls_back_to_ends() {
        let mut zoom = Zoom::default();
        assert!(zoom.zoom_in());
        assert_eq!(zoom.preset_index(), 0);

        let mut zoom = Zoom::default();
        assert!(zoom.zoom_out());
        assert_eq!(zoom.preset_index(), DEFAULT_PRESETS.len() - 1);
    }

    #[test]
    fn zoom_out_below_smallest_preset_stays_in_bounds() {
        let mut zoom = Zoom::default();
        zoom.factor(Size::new(1000.0, 1000.0), Size::new(245.0, 230.0));
        assert_eq!(zoom.fitting_scale(), Some(0.2));

        assert!(zoom.zoom_out());
        assert_eq!(zoom.preset_index(), 0);
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let mut zoom = Zoom::default();
        assert!(!zoom.set_preset(0.8));
        assert_eq!(zoom.mode(), ZoomMode::FitPage);
    }

    #[test]
    fn degenerate_geometry_does_not_poison_scale() {
        let mut zoom = Zoom::default();
        let scale = zoom.factor(Size::new(0.0, 0.0), Size::new(800.0, 600.0));
        assert!(scale.is_finite());

        zoom.on_geometry_change();
        zoom.factor(Size::new(400.0, 300.0), Size::new(10.0, 10.0));
        assert_eq!(zoom.fitting_scale(), Some(Zoom::MIN_FITTING_SCALE));
    }

    #[test]
    fn presets_must_ascend() {
        assert_eq!(PresetScales::new(vec![]), Err(PresetError::Empty));
        assert_eq!(
            PresetScales::new(vec![1.0, 0.5]),
            Err(PresetError::NotAscending { index: 1 })
        );
        assert!(matches!(
            PresetScales::new(vec![0.0]),
            Err(PresetError::Invalid { index: 0, .. })
        ));
    }
}
