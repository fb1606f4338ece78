//! # Colour thresholding
//!
//! Classifies every pixel of a camera frame into a binary mask using per-channel exclusive bounds.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize};

use super::Mask;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One bound for each colour channel. A channel without a bound is unconstrained on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBounds {
    #[serde(default)]
    pub r: Option<u8>,
    #[serde(default)]
    pub g: Option<u8>,
    #[serde(default)]
    pub b: Option<u8>,
}

/// Colour threshold for one semantic class.
///
/// A pixel belongs to the class if, for every channel, the value is strictly greater than the lower
/// bound and strictly less than the upper bound. Both ends are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourThresh {
    pub lower: ChannelBounds,
    pub upper: ChannelBounds,
}

/// A class threshold as written in a parameter file, where either bound may be left out.
#[derive(Debug, Deserialize)]
struct ThreshOverride {
    lower: Option<ChannelBounds>,
    upper: Option<ChannelBounds>,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

// Each class keeps its default for a bound the parameter file leaves out. A bound that is given
// replaces the default whole, so channels missing from it are unconstrained.

pub fn terrain_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<ColourThresh, D::Error> {
    ThreshOverride::deserialize(d).map(|o| o.over(ColourThresh::default_terrain()))
}

pub fn wall_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<ColourThresh, D::Error> {
    ThreshOverride::deserialize(d).map(|o| o.over(ColourThresh::default_wall()))
}

pub fn rock_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<ColourThresh, D::Error> {
    ThreshOverride::deserialize(d).map(|o| o.over(ColourThresh::default_rock()))
}

pub fn sky_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<ColourThresh, D::Error> {
    ThreshOverride::deserialize(d).map(|o| o.over(ColourThresh::default_sky()))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ThreshOverride {
    fn over(self, default: ColourThresh) -> ColourThresh {
        ColourThresh {
            lower: self.lower.unwrap_or(default.lower),
            upper: self.upper.unwrap_or(default.upper),
        }
    }
}

impl ChannelBounds {
    pub fn new(r: Option<u8>, g: Option<u8>, b: Option<u8>) -> Self {
        Self { r, g, b }
    }

    /// Bounds on all three channels.
    pub fn all(r: u8, g: u8, b: u8) -> Self {
        Self::new(Some(r), Some(g), Some(b))
    }

    fn as_array(&self) -> [Option<u8>; 3] {
        [self.r, self.g, self.b]
    }
}

impl ColourThresh {
    pub fn new(lower: ChannelBounds, upper: ChannelBounds) -> Self {
        Self { lower, upper }
    }

    /// Bright, near-white ground the rover can drive on.
    pub fn default_terrain() -> Self {
        Self::new(ChannelBounds::all(120, 150, 130), ChannelBounds::default())
    }

    /// Dark rock walls and boulders.
    pub fn default_wall() -> Self {
        Self::new(ChannelBounds::default(), ChannelBounds::all(120, 120, 90))
    }

    /// Yellow rock samples. Blue only has an upper bound.
    pub fn default_rock() -> Self {
        Self::new(
            ChannelBounds::new(Some(100), Some(100), None),
            ChannelBounds::all(220, 190, 80),
        )
    }

    /// Sky, before it's clipped to the region above the skyline.
    pub fn default_sky() -> Self {
        Self::new(ChannelBounds::all(90, 90, 90), ChannelBounds::default())
    }

    /// True if the pixel lies strictly inside the bounds on every channel.
    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        let lower = self.lower.as_array();
        let upper = self.upper.as_array();

        pixel.0.iter().enumerate().all(|(i, &v)| {
            lower[i].map_or(true, |l| v > l) && upper[i].map_or(true, |u| v < u)
        })
    }

    /// Classify every pixel in the image, giving a mask with one row per image row.
    pub fn classify(&self, image: &RgbImage) -> Mask {
        let (width, height) = image.dimensions();

        Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
            self.contains(image.get_pixel(col as u32, row as u32))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exclusive_bounds() {
        let thresh = ColourThresh::default_rock();

        assert!(thresh.contains(&Rgb([180, 150, 20])));
        assert!(thresh.contains(&Rgb([101, 101, 0])));
        assert!(thresh.contains(&Rgb([219, 189, 79])));

        // On a bound is outside
        assert!(!thresh.contains(&Rgb([100, 150, 20])));
        assert!(!thresh.contains(&Rgb([220, 150, 20])));
        assert!(!thresh.contains(&Rgb([180, 190, 20])));
        assert!(!thresh.contains(&Rgb([180, 150, 80])));
    }

    #[test]
    fn test_unconstrained() {
        // No upper bound, so 255 passes
        let terrain = ColourThresh::default_terrain();
        assert!(terrain.contains(&Rgb([255, 255, 255])));
        assert!(!terrain.contains(&Rgb([255, 150, 255])));

        // No lower bound, so 0 passes
        let wall = ColourThresh::default_wall();
        assert!(wall.contains(&Rgb([0, 0, 0])));
        assert!(!wall.contains(&Rgb([0, 0, 90])));

        // Nothing bounded at all accepts everything
        assert!(ColourThresh::default().contains(&Rgb([0, 255, 0])));
    }

    #[test]
    fn test_classify() {
        let mut image = RgbImage::from_pixel(4, 3, Rgb([200, 200, 200]));
        image.put_pixel(3, 0, Rgb([50, 40, 30]));
        image.put_pixel(0, 2, Rgb([50, 40, 30]));

        let wall = ColourThresh::default_wall().classify(&image);
        assert_eq!(wall.dim(), (3, 4));
        assert!(wall[[0, 3]]);
        assert!(wall[[2, 0]]);
        assert_eq!(wall.iter().filter(|&&v| v).count(), 2);

        let terrain = ColourThresh::default_terrain().classify(&image);
        assert_eq!(terrain.iter().filter(|&&v| v).count(), 10);
    }

    #[derive(Deserialize)]
    struct RockOnly {
        #[serde(deserialize_with = "rock_or_default")]
        rock: ColourThresh,
    }

    #[test]
    fn test_override_one_bound() {
        let parsed: RockOnly = util::params::from_str("[rock.upper]\nr = 200\ng = 190\nb = 80")
            .unwrap();
        assert_eq!(parsed.rock.lower, ColourThresh::default_rock().lower);
        assert_eq!(parsed.rock.upper, ChannelBounds::all(200, 190, 80));

        // Dark wall is still rejected
        assert!(!parsed.rock.contains(&Rgb([50, 40, 30])));

        // Channels left out of a given bound are unconstrained
        let parsed: RockOnly = util::params::from_str("[rock.lower]\nr = 50").unwrap();
        assert_eq!(parsed.rock.lower, ChannelBounds::new(Some(50), None, None));
        assert_eq!(parsed.rock.upper, ColourThresh::default_rock().upper);

        // An empty table keeps the class default entirely
        let parsed: RockOnly = util::params::from_str("[rock]").unwrap();
        assert_eq!(parsed.rock, ColourThresh::default_rock());
    }
}
