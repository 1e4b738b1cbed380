use pyo3::prelude::*;
use xtalcore::config::StorageParams;
use xtalcore::io::reflection_file as rio;

use crate::py_reflection_list::PyReflectionList;
use crate::py_utility::to_py_err;

#[pyfunction]
#[pyo3(signature = (path, reflections, compress=true, compression_level=3))]
pub fn save_reflections(
    path: &str,
    reflections: PyRef<'_, PyReflectionList>,
    compress: bool,
    compression_level: i32,
) -> PyResult<()> {
    let params = StorageParams::new(compress, compression_level).map_err(to_py_err)?;
    rio::save_bincode(path, &reflections.inner, &params).map_err(to_py_err)
}

#[pyfunction]
pub fn load_reflections(path: &str) -> PyResult<PyReflectionList> {
    let inner = rio::load_bincode(path).map_err(to_py_err)?;
    Ok(PyReflectionList { inner })
}

#[pyfunction]
pub fn save_reflections_json(path: &str, reflections: PyRef<'_, PyReflectionList>) -> PyResult<()> {
    rio::save_json(path, &reflections.inner).map_err(to_py_err)
}

#[pyfunction]
pub fn load_reflections_json(path: &str) -> PyResult<PyReflectionList> {
    let inner = rio::load_json(path).map_err(to_py_err)?;
    Ok(PyReflectionList { inner })
}
