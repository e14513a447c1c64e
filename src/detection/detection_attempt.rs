use std::sync::Arc;

use super::detection_result::DetectionResult;
use crate::{
    dictionary::DictionarySpec,
    log::log_sink::LogSink,
    sink_debug,
    vision::{Native, RefineConfig, ScopedVision, VisionBinding, VisionError},
};

/// Runs one dictionary against an intensity image.
///
/// Every handle allocated here (dictionary, parameters, detector and, on the
/// fallback path, refine parameters) is released before returning, on the
/// error paths too. The outcome depends only on the image and the
/// dictionary.
///
/// # Errors
/// Returns the [`VisionError`] of the first native call that failed; the
/// caller treats it as a non-match for this dictionary only.
pub fn attempt_detection<B: VisionBinding>(
    binding: &B,
    gray: &B::Buffer,
    spec: &DictionarySpec,
    refine: &RefineConfig,
    logger: &Arc<dyn LogSink>,
) -> Result<DetectionResult, VisionError> {
    let dictionary = binding.scoped_dictionary(spec.token)?;
    let params = binding.scoped_detector_parameters()?;
    let mut detector = make_detector(binding, &dictionary, &params, refine, logger)?;

    let found = binding.detect_markers(&mut detector, gray)?;
    Ok(DetectionResult::from_ids(&spec.key, found.ids))
}

/// Builds a detector with the preferred constructor, falling back to the
/// constructor that also takes refinement parameters when the running
/// library rejects the first shape.
fn make_detector<'b, B: VisionBinding>(
    binding: &'b B,
    dictionary: &B::Dictionary,
    params: &B::Params,
    refine: &RefineConfig,
    logger: &Arc<dyn LogSink>,
) -> Result<Native<'b, B, B::Detector>, VisionError> {
    match binding.scoped_detector(dictionary, params, None) {
        Ok(detector) => Ok(detector),
        Err(primary) => {
            sink_debug!(
                logger,
                "[Detector] preferred constructor failed ({primary}), retrying with refine parameters"
            );
            let refine = binding.scoped_refine_parameters(refine)?;
            binding.scoped_detector(dictionary, params, Some(&refine))
        }
    }
}
