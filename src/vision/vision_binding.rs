use super::vision_error::Result;
use crate::{camera_manager::PixelFormat, dictionary::DictionaryToken};

/// Color-space conversions the engine asks the library for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorConversion {
    RgbaToGray,
}

/// Constants for the refinement-parameter object used by the fallback
/// detector constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineConfig {
    pub min_rep_distance: f32,
    pub error_correction_rate: f32,
    pub check_all_orders: bool,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            min_rep_distance: 10.0,
            error_correction_rate: 3.0,
            check_all_orders: true,
        }
    }
}

/// Output of one `detect_markers` call. Corners are carried through but not
/// interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetections {
    pub ids: Vec<i32>,
    pub corners: Vec<[(f32, f32); 4]>,
}

/// Any handle the library allocated, handed back for release.
pub enum NativeObject<B: VisionBinding + ?Sized> {
    Buffer(B::Buffer),
    Dictionary(B::Dictionary),
    Params(B::Params),
    RefineParams(B::RefineParams),
    Detector(B::Detector),
}

impl<B: VisionBinding + ?Sized> NativeObject<B> {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Dictionary(_) => "dictionary",
            Self::Params(_) => "detector parameters",
            Self::RefineParams(_) => "refine parameters",
            Self::Detector(_) => "detector",
        }
    }
}

/// Capability set of a stateful native vision library.
///
/// Every value returned by a `make_*`/`get_*` method is a native handle the
/// caller owns and must pass to [`VisionBinding::release`] exactly once.
/// Use the [`super::ScopedVision`] helpers instead of calling these directly.
pub trait VisionBinding {
    type Buffer;
    type Dictionary;
    type Params;
    type RefineParams;
    type Detector;

    /// Whether the library finished loading.
    fn is_ready(&self) -> bool {
        true
    }

    fn make_image_buffer(&self, width: u32, height: u32, format: PixelFormat)
    -> Result<Self::Buffer>;

    /// Copies tightly packed pixels into `buffer`.
    fn write_pixels(&self, buffer: &mut Self::Buffer, pixels: &[u8]) -> Result<()>;

    fn convert_color(
        &self,
        src: &Self::Buffer,
        dst: &mut Self::Buffer,
        code: ColorConversion,
    ) -> Result<()>;

    fn get_dictionary(&self, token: DictionaryToken) -> Result<Self::Dictionary>;

    fn make_detector_parameters(&self) -> Result<Self::Params>;

    fn make_refine_parameters(&self, config: &RefineConfig) -> Result<Self::RefineParams>;

    /// Constructs a detector. `refine: None` is the preferred two-argument
    /// shape; `Some` is the three-argument shape older/newer library builds
    /// may require instead.
    fn make_detector(
        &self,
        dictionary: &Self::Dictionary,
        params: &Self::Params,
        refine: Option<&Self::RefineParams>,
    ) -> Result<Self::Detector>;

    fn detect_markers(
        &self,
        detector: &mut Self::Detector,
        gray: &Self::Buffer,
    ) -> Result<RawDetections>;

    fn release(&self, object: NativeObject<Self>);
}
