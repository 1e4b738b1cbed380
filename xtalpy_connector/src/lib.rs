mod py_io;
mod py_reflection;
mod py_reflection_list;
mod py_utility;

use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::py_reflection::{PyReflection, PyReflectionBase};
use crate::py_reflection_list::PyReflectionList;

#[pymodule]
fn xtalpy_connector(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyReflectionBase>()?;
    m.add_class::<PyReflection>()?;
    m.add_class::<PyReflectionList>()?;
    m.add_function(wrap_pyfunction!(py_io::save_reflections, m)?)?;
    m.add_function(wrap_pyfunction!(py_io::load_reflections, m)?)?;
    m.add_function(wrap_pyfunction!(py_io::save_reflections_json, m)?)?;
    m.add_function(wrap_pyfunction!(py_io::load_reflections_json, m)?)?;
    m.add_function(wrap_pyfunction!(py_utility::init_logging, m)?)?;
    Ok(())
}
