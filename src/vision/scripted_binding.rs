//! Deterministic in-memory [`VisionBinding`].
//!
//! Instead of decoding pixels, the binding reads a scene: which marker ids
//! are visible for which dictionary token. It keeps a ledger of every
//! handle it hands out so callers can check that nothing leaks and nothing
//! is released twice. Used for the synthetic demo mode and in tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU32, Ordering},
};

use super::{
    vision_binding::{ColorConversion, NativeObject, RawDetections, RefineConfig, VisionBinding},
    vision_error::{Result, VisionError},
};
use crate::{camera_manager::PixelFormat, dictionary::DictionaryToken};

#[derive(Debug)]
pub struct ScriptedBuffer {
    id: u64,
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl ScriptedBuffer {
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }
}

#[derive(Debug)]
pub struct ScriptedDictionary {
    id: u64,
    token: DictionaryToken,
}

#[derive(Debug)]
pub struct ScriptedParams {
    id: u64,
}

#[derive(Debug)]
pub struct ScriptedRefine {
    id: u64,
    config: RefineConfig,
}

#[derive(Debug)]
pub struct ScriptedDetector {
    id: u64,
    token: DictionaryToken,
    refine: Option<RefineConfig>,
}

impl ScriptedDetector {
    /// Refinement constants the detector was built with, if the fallback
    /// constructor was used.
    #[must_use]
    pub const fn refine(&self) -> Option<RefineConfig> {
        self.refine
    }
}

/// Allocation bookkeeping snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Every call into the binding other than `is_ready` and `release`.
    pub native_calls: usize,
    pub allocations: usize,
    pub releases: usize,
    /// Handles currently allocated and not yet released.
    pub live: usize,
    pub double_releases: usize,
    /// Tokens passed to `get_dictionary`, in call order.
    pub dictionary_requests: Vec<i32>,
    /// Detectors built through the fallback (refine) constructor.
    pub fallback_detectors: usize,
}

#[derive(Debug, Default)]
struct Scene {
    markers: HashMap<i32, Vec<i32>>,
    failing_detect: HashSet<i32>,
    failing_dictionary: HashSet<i32>,
    reject_primary_detector: bool,
    reject_fallback_detector: bool,
    fail_conversion: bool,
}

#[derive(Debug, Default)]
struct State {
    scene: Scene,
    next_id: u64,
    live: BTreeMap<u64, &'static str>,
    ledger: Ledger,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    ready_after: AtomicU32,
    ready_polls: AtomicU32,
}

/// Cheap to clone; clones share scene and ledger.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBinding {
    inner: Arc<Inner>,
}

impl ScriptedBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ids` visible to detectors built for `token`.
    #[must_use]
    pub fn with_markers(self, token: i32, ids: &[i32]) -> Self {
        self.set_markers(token, ids);
        self
    }

    /// `detect_markers` fails for detectors built for `token`.
    #[must_use]
    pub fn with_failing_detect(self, token: i32) -> Self {
        self.state().scene.failing_detect.insert(token);
        self
    }

    /// `get_dictionary` fails for `token`.
    #[must_use]
    pub fn with_failing_dictionary(self, token: i32) -> Self {
        self.state().scene.failing_dictionary.insert(token);
        self
    }

    /// The two-argument detector constructor reports itself unsupported.
    #[must_use]
    pub fn with_primary_detector_rejected(self) -> Self {
        self.state().scene.reject_primary_detector = true;
        self
    }

    /// The three-argument detector constructor fails too.
    #[must_use]
    pub fn with_fallback_detector_rejected(self) -> Self {
        self.state().scene.reject_fallback_detector = true;
        self
    }

    #[must_use]
    pub fn with_failing_conversion(self) -> Self {
        self.state().scene.fail_conversion = true;
        self
    }

    /// `is_ready` returns false for the first `polls` calls.
    #[must_use]
    pub fn with_ready_after(self, polls: u32) -> Self {
        self.inner.ready_after.store(polls, Ordering::SeqCst);
        self
    }

    /// Replaces the ids visible for `token`; an empty slice hides them.
    pub fn set_markers(&self, token: i32, ids: &[i32]) {
        let mut state = self.state();
        if ids.is_empty() {
            state.scene.markers.remove(&token);
        } else {
            state.scene.markers.insert(token, ids.to_vec());
        }
    }

    /// Hides every marker.
    pub fn clear_markers(&self) {
        self.state().scene.markers.clear();
    }

    #[must_use]
    pub fn ledger(&self) -> Ledger {
        self.state().ledger.clone()
    }

    /// True when every handle handed out has been released exactly once.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let ledger = self.ledger();
        ledger.live == 0
            && ledger.double_releases == 0
            && ledger.allocations == ledger.releases
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves the data usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn call(&self) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.ledger.native_calls += 1;
        state
    }
}

impl State {
    fn allocate(&mut self, kind: &'static str) -> u64 {
        self.next_id += 1;
        self.live.insert(self.next_id, kind);
        self.ledger.allocations += 1;
        self.ledger.live = self.live.len();
        self.next_id
    }

    fn release(&mut self, id: u64) {
        if self.live.remove(&id).is_some() {
            self.ledger.releases += 1;
        } else {
            self.ledger.double_releases += 1;
        }
        self.ledger.live = self.live.len();
    }
}

impl VisionBinding for ScriptedBinding {
    type Buffer = ScriptedBuffer;
    type Dictionary = ScriptedDictionary;
    type Params = ScriptedParams;
    type RefineParams = ScriptedRefine;
    type Detector = ScriptedDetector;

    fn is_ready(&self) -> bool {
        let polls = self.inner.ready_polls.fetch_add(1, Ordering::SeqCst);
        polls >= self.inner.ready_after.load(Ordering::SeqCst)
    }

    fn make_image_buffer(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<ScriptedBuffer> {
        let id = self.call().allocate("buffer");
        let len = width as usize * height as usize * format.channels();
        Ok(ScriptedBuffer {
            id,
            width,
            height,
            format,
            pixels: vec![0; len],
        })
    }

    fn write_pixels(&self, buffer: &mut ScriptedBuffer, pixels: &[u8]) -> Result<()> {
        drop(self.call());
        let expected = buffer.pixels.len();
        let src = pixels.get(..expected).ok_or(VisionError::InvalidBuffer {
            expected,
            actual: pixels.len(),
        })?;
        buffer.pixels.copy_from_slice(src);
        Ok(())
    }

    fn convert_color(
        &self,
        src: &ScriptedBuffer,
        dst: &mut ScriptedBuffer,
        code: ColorConversion,
    ) -> Result<()> {
        if self.call().scene.fail_conversion {
            return Err(VisionError::call("cvt_color", "scripted conversion failure"));
        }
        match code {
            ColorConversion::RgbaToGray => {
                if src.format != PixelFormat::Rgba8
                    || dst.format != PixelFormat::Gray8
                    || (src.width, src.height) != (dst.width, dst.height)
                {
                    return Err(VisionError::call("cvt_color", "incompatible buffers"));
                }
                for (gray, px) in dst.pixels.iter_mut().zip(src.pixels.chunks_exact(4)) {
                    let luma = (299 * u32::from(px[0])
                        + 587 * u32::from(px[1])
                        + 114 * u32::from(px[2]))
                        / 1_000;
                    *gray = u8::try_from(luma).unwrap_or(u8::MAX);
                }
            }
        }
        Ok(())
    }

    fn get_dictionary(&self, token: DictionaryToken) -> Result<ScriptedDictionary> {
        let mut state = self.call();
        state.ledger.dictionary_requests.push(token.0);
        if state.scene.failing_dictionary.contains(&token.0) {
            return Err(VisionError::call(
                "get_dictionary",
                format!("no predefined dictionary {}", token.0),
            ));
        }
        let id = state.allocate("dictionary");
        Ok(ScriptedDictionary { id, token })
    }

    fn make_detector_parameters(&self) -> Result<ScriptedParams> {
        let id = self.call().allocate("detector parameters");
        Ok(ScriptedParams { id })
    }

    fn make_refine_parameters(&self, config: &RefineConfig) -> Result<ScriptedRefine> {
        let id = self.call().allocate("refine parameters");
        Ok(ScriptedRefine {
            id,
            config: *config,
        })
    }

    fn make_detector(
        &self,
        dictionary: &ScriptedDictionary,
        _params: &ScriptedParams,
        refine: Option<&ScriptedRefine>,
    ) -> Result<ScriptedDetector> {
        let mut state = self.call();
        match refine {
            None if state.scene.reject_primary_detector => Err(VisionError::Unsupported {
                op: "make_detector",
                reason: "two-argument constructor not available".into(),
            }),
            Some(_) if state.scene.reject_fallback_detector => Err(VisionError::call(
                "make_detector",
                "three-argument constructor failed",
            )),
            _ => {
                if refine.is_some() {
                    state.ledger.fallback_detectors += 1;
                }
                let id = state.allocate("detector");
                Ok(ScriptedDetector {
                    id,
                    token: dictionary.token,
                    refine: refine.map(|r| r.config),
                })
            }
        }
    }

    fn detect_markers(
        &self,
        detector: &mut ScriptedDetector,
        gray: &ScriptedBuffer,
    ) -> Result<RawDetections> {
        let state = self.call();
        if state.scene.failing_detect.contains(&detector.token.0) {
            return Err(VisionError::call(
                "detect_markers",
                format!("dictionary {} rejected", detector.token.0),
            ));
        }
        if gray.format != PixelFormat::Gray8 || gray.pixels.is_empty() {
            return Err(VisionError::call("detect_markers", "expected a gray image"));
        }
        let ids = state
            .scene
            .markers
            .get(&detector.token.0)
            .cloned()
            .unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        let corners = ids
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let x = (i * 10) as f32;
                [(x, 0.0), (x + 8.0, 0.0), (x + 8.0, 8.0), (x, 8.0)]
            })
            .collect();
        Ok(RawDetections { ids, corners })
    }

    fn release(&self, object: NativeObject<Self>) {
        let id = match &object {
            NativeObject::Buffer(b) => b.id,
            NativeObject::Dictionary(d) => d.id,
            NativeObject::Params(p) => p.id,
            NativeObject::RefineParams(r) => r.id,
            NativeObject::Detector(d) => d.id,
        };
        self.state().release(id);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn detection_follows_the_scene() {
        let binding = ScriptedBinding::new().with_markers(2, &[7, 3]);
        let dict = binding.get_dictionary(DictionaryToken(2)).unwrap();
        let params = binding.make_detector_parameters().unwrap();
        let mut detector = binding.make_detector(&dict, &params, None).unwrap();
        let gray = binding.make_image_buffer(2, 2, PixelFormat::Gray8).unwrap();

        let found = binding.detect_markers(&mut detector, &gray).unwrap();
        assert_eq!(found.ids, vec![7, 3]);
        assert_eq!(found.corners.len(), 2);

        binding.set_markers(2, &[]);
        let found = binding.detect_markers(&mut detector, &gray).unwrap();
        assert!(found.ids.is_empty());

        for obj in [
            NativeObject::Buffer(gray),
            NativeObject::Detector(detector),
            NativeObject::Params(params),
            NativeObject::Dictionary(dict),
        ] {
            binding.release(obj);
        }
        assert!(binding.is_balanced());
    }

    #[test]
    fn double_release_is_counted() {
        let binding = ScriptedBinding::new();
        let params = binding.make_detector_parameters().unwrap();
        let id = params.id;
        binding.release(NativeObject::Params(params));
        binding.release(NativeObject::Params(ScriptedParams { id }));
        let ledger = binding.ledger();
        assert_eq!(ledger.double_releases, 1);
        assert!(!binding.is_balanced());
    }

    #[test]
    fn rgba_to_gray_uses_luma_weights() {
        let binding = ScriptedBinding::new();
        let mut rgba = binding.make_image_buffer(2, 1, PixelFormat::Rgba8).unwrap();
        binding
            .write_pixels(&mut rgba, &[255, 255, 255, 255, 0, 0, 0, 255])
            .unwrap();
        let mut gray = binding.make_image_buffer(2, 1, PixelFormat::Gray8).unwrap();
        binding
            .convert_color(&rgba, &mut gray, ColorConversion::RgbaToGray)
            .unwrap();
        assert_eq!(gray.pixels(), &[255, 0]);
    }

    #[test]
    fn short_pixel_slice_is_rejected() {
        let binding = ScriptedBinding::new();
        let mut rgba = binding.make_image_buffer(2, 2, PixelFormat::Rgba8).unwrap();
        let err = binding.write_pixels(&mut rgba, &[0; 3]).unwrap_err();
        assert_eq!(
            err,
            VisionError::InvalidBuffer {
                expected: 16,
                actual: 3
            }
        );
    }

    #[test]
    fn readiness_after_polls() {
        let binding = ScriptedBinding::new().with_ready_after(2);
        assert!(!binding.is_ready());
        assert!(!binding.is_ready());
        assert!(binding.is_ready());
    }

    #[test]
    fn primary_constructor_rejection_leaves_fallback_available() {
        let binding = ScriptedBinding::new().with_primary_detector_rejected();
        let dict = binding.get_dictionary(DictionaryToken(0)).unwrap();
        let params = binding.make_detector_parameters().unwrap();
        assert!(matches!(
            binding.make_detector(&dict, &params, None),
            Err(VisionError::Unsupported { .. })
        ));
        let refine = binding
            .make_refine_parameters(&RefineConfig::default())
            .unwrap();
        let detector = binding.make_detector(&dict, &params, Some(&refine)).unwrap();
        assert_eq!(detector.refine(), Some(RefineConfig::default()));
        assert_eq!(binding.ledger().fallback_detectors, 1);
    }
}
