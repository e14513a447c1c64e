//! [`VisionBinding`] over the OpenCV `objdetect` ArUco API.

use std::sync::OnceLock;

use opencv::{
    core::{self, AlgorithmHint, Mat, Point2f, Scalar, Vector},
    imgproc,
    objdetect::{self, ArucoDetector, DetectorParameters, Dictionary, RefineParameters},
    prelude::*,
};

use super::{
    vision_binding::{ColorConversion, NativeObject, RawDetections, RefineConfig, VisionBinding},
    vision_error::{Result, VisionError},
};
use crate::{camera_manager::PixelFormat, dictionary::DictionaryToken};

/// Binding to the linked OpenCV build.
///
/// OpenCV objects free their memory when dropped, so `release` is the single
/// place where a handle's drop happens.
#[derive(Debug, Default)]
pub struct OpenCvBinding {
    build_info: OnceLock<bool>,
}

impl OpenCvBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn cv<T>(op: &'static str, res: opencv::Result<T>) -> Result<T> {
    res.map_err(|e| VisionError::call(op, e))
}

const fn mat_type(format: PixelFormat) -> i32 {
    match format {
        PixelFormat::Rgba8 => core::CV_8UC4,
        PixelFormat::Gray8 => core::CV_8UC1,
    }
}

impl VisionBinding for OpenCvBinding {
    type Buffer = Mat;
    type Dictionary = Dictionary;
    type Params = DetectorParameters;
    type RefineParams = RefineParameters;
    type Detector = ArucoDetector;

    fn is_ready(&self) -> bool {
        *self
            .build_info
            .get_or_init(|| core::get_build_information().is_ok_and(|info| !info.is_empty()))
    }

    fn make_image_buffer(&self, width: u32, height: u32, format: PixelFormat) -> Result<Mat> {
        let rows = i32::try_from(height).map_err(|e| VisionError::call("make_image_buffer", e))?;
        let cols = i32::try_from(width).map_err(|e| VisionError::call("make_image_buffer", e))?;
        cv(
            "make_image_buffer",
            Mat::new_rows_cols_with_default(rows, cols, mat_type(format), Scalar::all(0.0)),
        )
    }

    fn write_pixels(&self, buffer: &mut Mat, pixels: &[u8]) -> Result<()> {
        let dst = cv("write_pixels", buffer.data_bytes_mut())?;
        let expected = dst.len();
        let src = pixels.get(..expected).ok_or(VisionError::InvalidBuffer {
            expected,
            actual: pixels.len(),
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn convert_color(&self, src: &Mat, dst: &mut Mat, code: ColorConversion) -> Result<()> {
        let code = match code {
            ColorConversion::RgbaToGray => imgproc::COLOR_RGBA2GRAY,
        };
        cv(
            "cvt_color",
            imgproc::cvt_color(src, dst, code, 0, AlgorithmHint::ALGO_HINT_DEFAULT),
        )
    }

    fn get_dictionary(&self, token: DictionaryToken) -> Result<Dictionary> {
        cv(
            "get_predefined_dictionary",
            objdetect::get_predefined_dictionary_i32(token.0),
        )
    }

    fn make_detector_parameters(&self) -> Result<DetectorParameters> {
        cv("detector_parameters", DetectorParameters::default())
    }

    fn make_refine_parameters(&self, config: &RefineConfig) -> Result<RefineParameters> {
        cv(
            "refine_parameters",
            RefineParameters::new(
                config.min_rep_distance,
                config.error_correction_rate,
                config.check_all_orders,
            ),
        )
    }

    fn make_detector(
        &self,
        dictionary: &Dictionary,
        params: &DetectorParameters,
        refine: Option<&RefineParameters>,
    ) -> Result<ArucoDetector> {
        match refine {
            None => {
                let mut detector = cv("make_detector", ArucoDetector::new_def())?;
                cv("make_detector", detector.set_dictionary(dictionary))?;
                cv("make_detector", detector.set_detector_parameters(params))?;
                Ok(detector)
            }
            Some(refine) => cv(
                "make_detector",
                ArucoDetector::new(dictionary, params, refine.clone()),
            ),
        }
    }

    fn detect_markers(&self, detector: &mut ArucoDetector, gray: &Mat) -> Result<RawDetections> {
        let mut corners = Vector::<Vector<Point2f>>::new();
        let mut ids = Vector::<i32>::new();
        cv(
            "detect_markers",
            detector.detect_markers_def(gray, &mut corners, &mut ids),
        )?;

        let corners = corners
            .iter()
            .map(|quad| {
                let mut out = [(0.0, 0.0); 4];
                for (slot, p) in out.iter_mut().zip(quad.iter()) {
                    *slot = (p.x, p.y);
                }
                out
            })
            .collect();
        Ok(RawDetections {
            ids: ids.to_vec(),
            corners,
        })
    }

    fn release(&self, object: NativeObject<Self>) {
        drop(object);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::vision::ScopedVision;

    const DICT_6X6_250: DictionaryToken = DictionaryToken(10);

    /// Gray image of marker `id` with a white quiet zone around it.
    fn marker_image(binding: &OpenCvBinding, id: i32) -> Mat {
        let dictionary = binding.get_dictionary(DICT_6X6_250).unwrap();
        let mut marker = Mat::default();
        objdetect::generate_image_marker_def(&dictionary, id, 120, &mut marker).unwrap();
        let mut padded = Mat::default();
        core::copy_make_border(
            &marker,
            &mut padded,
            40,
            40,
            40,
            40,
            core::BORDER_CONSTANT,
            Scalar::all(255.0),
        )
        .unwrap();
        padded
    }

    fn detect_with(binding: &OpenCvBinding, gray: &Mat, refine: Option<&RefineConfig>) -> Vec<i32> {
        let dictionary = binding.scoped_dictionary(DICT_6X6_250).unwrap();
        let params = binding.scoped_detector_parameters().unwrap();
        let refine = refine.map(|config| binding.scoped_refine_parameters(config).unwrap());
        let mut detector = binding
            .scoped_detector(&dictionary, &params, refine.as_deref())
            .unwrap();
        binding.detect_markers(&mut detector, gray).unwrap().ids
    }

    #[test]
    fn preferred_detector_is_bound_to_the_requested_dictionary() {
        let binding = OpenCvBinding::new();
        let dictionary = binding.get_dictionary(DICT_6X6_250).unwrap();
        let params = binding.make_detector_parameters().unwrap();
        let detector = binding.make_detector(&dictionary, &params, None).unwrap();
        assert_eq!(detector.get_dictionary().unwrap().marker_size(), 6);
    }

    #[test]
    fn both_detector_shapes_find_a_generated_marker() {
        let binding = OpenCvBinding::new();
        assert!(binding.is_ready());
        let gray = marker_image(&binding, 23);

        assert_eq!(detect_with(&binding, &gray, None), vec![23]);
        assert_eq!(
            detect_with(&binding, &gray, Some(&RefineConfig::default())),
            vec![23]
        );
    }

    #[test]
    fn blank_image_has_no_markers() {
        let binding = OpenCvBinding::new();
        let gray = binding.make_image_buffer(64, 64, PixelFormat::Gray8).unwrap();
        assert!(detect_with(&binding, &gray, None).is_empty());
    }
}
