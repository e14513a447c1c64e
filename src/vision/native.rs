use std::ops::{Deref, DerefMut};

use super::{
    vision_binding::{ColorConversion, NativeObject, RefineConfig, VisionBinding},
    vision_error::Result,
};
use crate::{camera_manager::PixelFormat, dictionary::DictionaryToken};

/// Scoped owner of one native handle.
///
/// Dropping the guard hands the handle back to its binding's `release`, so a
/// handle is released exactly once whichever way the owning scope exits
/// (normal return, `?`, early `break`).
pub struct Native<'b, B: VisionBinding + ?Sized, T> {
    binding: &'b B,
    value: Option<T>,
    wrap: fn(T) -> NativeObject<B>,
}

impl<'b, B: VisionBinding + ?Sized, T> Native<'b, B, T> {
    /// Takes ownership of `value`; `wrap` tags it for [`VisionBinding::release`].
    pub fn new(binding: &'b B, value: T, wrap: fn(T) -> NativeObject<B>) -> Self {
        Self {
            binding,
            value: Some(value),
            wrap,
        }
    }
}

impl<B: VisionBinding + ?Sized, T> Deref for Native<'_, B, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value
            .as_ref()
            .unwrap_or_else(|| unreachable!("native handle used after release"))
    }
}

impl<B: VisionBinding + ?Sized, T> DerefMut for Native<'_, B, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value
            .as_mut()
            .unwrap_or_else(|| unreachable!("native handle used after release"))
    }
}

impl<B: VisionBinding + ?Sized, T> Drop for Native<'_, B, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.binding.release((self.wrap)(value));
        }
    }
}

/// Allocation helpers that return [`Native`] guards instead of bare handles.
pub trait ScopedVision: VisionBinding {
    fn scoped_image_buffer(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Native<'_, Self, Self::Buffer>> {
        let buffer = self.make_image_buffer(width, height, format)?;
        Ok(Native::new(self, buffer, NativeObject::Buffer))
    }

    fn scoped_dictionary(
        &self,
        token: DictionaryToken,
    ) -> Result<Native<'_, Self, Self::Dictionary>> {
        let dictionary = self.get_dictionary(token)?;
        Ok(Native::new(self, dictionary, NativeObject::Dictionary))
    }

    fn scoped_detector_parameters(&self) -> Result<Native<'_, Self, Self::Params>> {
        let params = self.make_detector_parameters()?;
        Ok(Native::new(self, params, NativeObject::Params))
    }

    fn scoped_refine_parameters(
        &self,
        config: &RefineConfig,
    ) -> Result<Native<'_, Self, Self::RefineParams>> {
        let refine = self.make_refine_parameters(config)?;
        Ok(Native::new(self, refine, NativeObject::RefineParams))
    }

    fn scoped_detector(
        &self,
        dictionary: &Self::Dictionary,
        params: &Self::Params,
        refine: Option<&Self::RefineParams>,
    ) -> Result<Native<'_, Self, Self::Detector>> {
        let detector = self.make_detector(dictionary, params, refine)?;
        Ok(Native::new(self, detector, NativeObject::Detector))
    }

    /// Allocates a buffer of `format` and converts `src` into it.
    fn scoped_converted(
        &self,
        src: &Self::Buffer,
        width: u32,
        height: u32,
        format: PixelFormat,
        code: ColorConversion,
    ) -> Result<Native<'_, Self, Self::Buffer>> {
        let mut dst = self.scoped_image_buffer(width, height, format)?;
        self.convert_color(src, &mut dst, code)?;
        Ok(dst)
    }
}

impl<B: VisionBinding + ?Sized> ScopedVision for B {}
