use opencv::core::Mat;
use opencv::prelude::*;

/// Copies `mat` into a tightly packed buffer (`rows * cols * channels`
/// bytes), dropping any row padding.
pub fn tight_bytes(mat: &Mat) -> opencv::Result<Vec<u8>> {
    // A deep copy is always continuous.
    let owned;
    let src = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };

    let rows = usize::try_from(src.rows()).unwrap_or(0);
    let cols = usize::try_from(src.cols()).unwrap_or(0);
    let ch = usize::try_from(src.channels()).unwrap_or(0);
    let expected = rows * cols * ch;

    let data = src.data_bytes()?;
    Ok(data.get(..expected).unwrap_or(data).to_vec())
}
