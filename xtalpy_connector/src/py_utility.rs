use pyo3::exceptions;
use pyo3::prelude::*;
use numpy::{Element, PyArray3, PyReadonlyArray3};
use numpy::ndarray::Array3;
use xtalcore::data::shoebox::Shoebox;
use xtalcore::error::XtalError;

/// Maps a core error onto the closest Python exception.
pub fn to_py_err(err: XtalError) -> PyErr {
    match err {
        XtalError::IndexOutOfRange { .. } => exceptions::PyIndexError::new_err(err.to_string()),
        XtalError::Io { .. } => exceptions::PyIOError::new_err(err.to_string()),
        XtalError::StateArity { .. }
        | XtalError::InvalidShape { .. }
        | XtalError::UnsupportedVersion { .. }
        | XtalError::Encode(_)
        | XtalError::Decode(_)
        | XtalError::Json(_)
        | XtalError::Config(_) => exceptions::PyValueError::new_err(err.to_string()),
    }
}

/// Copies a shoebox into a new `(z, y, x)` numpy array.
pub fn shoebox_to_py<T: Element + Clone>(py: Python<'_>, shoebox: &Shoebox<T>) -> PyResult<Py<PyArray3<T>>> {
    let [z, y, x] = shoebox.shape();
    let array = Array3::from_shape_vec((z, y, x), shoebox.data().to_vec())
        .map_err(|e| exceptions::PyValueError::new_err(format!("shape error: {e}")))?;
    Ok(PyArray3::from_owned_array_bound(py, array).unbind())
}

/// Reads any 3D numpy array of the matching dtype, contiguous or not.
pub fn shoebox_from_py<T: Element + Copy>(array: PyReadonlyArray3<'_, T>) -> PyResult<Shoebox<T>> {
    let view = array.as_array();
    let (z, y, x) = view.dim();
    Shoebox::new([z, y, x], view.iter().copied().collect()).map_err(to_py_err)
}

/// Python style index: negative counts from the end.
pub fn normalize_index(index: isize, len: usize) -> PyResult<usize> {
    let resolved = if index < 0 { index + len as isize } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(exceptions::PyIndexError::new_err("ReflectionList index out of range"));
    }
    Ok(resolved as usize)
}

#[pyfunction]
pub fn init_logging() {
    // a second call only reports that a logger is already set
    let _ = env_logger::try_init();
}
