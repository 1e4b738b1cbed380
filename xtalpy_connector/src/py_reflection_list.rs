use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyInt, PyIterator, PyList, PySlice};
use xtalcore::data::reflection::Reflection;
use xtalcore::data::reflection_list::ReflectionList;

use crate::py_reflection::PyReflection;
use crate::py_utility::{normalize_index, to_py_err};

fn reflection_from_py(item: &Bound<'_, PyAny>) -> PyResult<Reflection> {
    let reflection = item.downcast::<PyReflection>()?;
    let inner = reflection.try_borrow()?.inner.clone();
    Ok(inner)
}

fn reflections_from_iterable(iterable: &Bound<'_, PyAny>) -> PyResult<Vec<Reflection>> {
    if let Ok(list) = iterable.downcast::<PyReflectionList>() {
        return Ok(list.try_borrow()?.inner.iter().cloned().collect());
    }
    iterable.iter()?
        .map(|item| reflection_from_py(&item?))
        .collect()
}

/// List of reflections that pickles as one encoded buffer.
///
/// Items are copied in and out, so `refl_list[0].panel_number = 2` edits a
/// temporary; assign the record back to change the list.
#[pyclass(sequence, name = "ReflectionList", module = "xtalpy_connector")]
#[derive(Clone, Default)]
pub struct PyReflectionList {
    pub inner: ReflectionList,
}

#[pymethods]
impl PyReflectionList {
    /// `ReflectionList()`, `ReflectionList(n)` with n blank records, or
    /// `ReflectionList(iterable_of_reflections)`.
    #[new]
    #[pyo3(signature = (items=None))]
    pub fn new(items: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let inner = match items {
            None => ReflectionList::new(),
            Some(arg) if arg.is_instance_of::<PyInt>() => {
                let n: usize = arg.extract()?;
                std::iter::repeat_with(Reflection::default).take(n).collect()
            }
            Some(arg) => reflections_from_iterable(arg)?.into(),
        };
        Ok(PyReflectionList { inner })
    }

    pub fn __len__(&self) -> usize {
        self.inner.len()
    }

    pub fn size(&self) -> usize {
        self.inner.len()
    }

    pub fn __getitem__(&self, py: Python<'_>, index: &Bound<'_, PyAny>) -> PyResult<PyObject> {
        if let Ok(slice) = index.downcast::<PySlice>() {
            let indices = slice.indices(self.inner.len() as _)?;
            let (start, step) = (indices.start as isize, indices.step as isize);
            let selected: ReflectionList = (0..indices.slicelength as isize)
                .map(|i| self.inner[(start + i * step) as usize].clone())
                .collect();
            return Ok(Py::new(py, PyReflectionList { inner: selected })?.into_any());
        }
        let index: isize = index.extract()
            .map_err(|_| PyTypeError::new_err("ReflectionList indices must be integers or slices"))?;
        let i = normalize_index(index, self.inner.len())?;
        Ok(PyReflection::create(py, self.inner[i].clone())?.into_any())
    }

    pub fn __setitem__(&mut self, index: isize, reflection: &Bound<'_, PyAny>) -> PyResult<()> {
        let i = normalize_index(index, self.inner.len())?;
        self.inner.set(i, reflection_from_py(reflection)?).map_err(to_py_err)
    }

    pub fn __delitem__(&mut self, index: isize) -> PyResult<()> {
        let i = normalize_index(index, self.inner.len())?;
        self.inner.remove(i).map_err(to_py_err)?;
        Ok(())
    }

    pub fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        let items = self.inner.iter()
            .map(|r| PyReflection::create(py, r.clone()))
            .collect::<PyResult<Vec<_>>>()?;
        PyList::new_bound(py, items).as_any().iter()
    }

    pub fn append(&mut self, reflection: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.push(reflection_from_py(reflection)?);
        Ok(())
    }

    pub fn extend(&mut self, items: &Bound<'_, PyAny>) -> PyResult<()> {
        let reflections = reflections_from_iterable(items)?;
        self.inner.extend(reflections);
        Ok(())
    }

    pub fn insert(&mut self, index: isize, reflection: &Bound<'_, PyAny>) -> PyResult<()> {
        let len = self.inner.len() as isize;
        let position = if index < 0 { (index + len).max(0) } else { index.min(len) };
        self.inner.insert(position as usize, reflection_from_py(reflection)?);
        Ok(())
    }

    #[pyo3(signature = (index=-1))]
    pub fn pop(&mut self, py: Python<'_>, index: isize) -> PyResult<Py<PyReflection>> {
        let i = normalize_index(index, self.inner.len())?;
        let reflection = self.inner.remove(i).map_err(to_py_err)?;
        PyReflection::create(py, reflection)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn __repr__(&self) -> String {
        format!("ReflectionList(len={})", self.inner.len())
    }

    pub fn __getstate__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = self.inner.to_bytes().map_err(to_py_err)?;
        Ok(PyBytes::new_bound(py, &bytes))
    }

    pub fn __setstate__(&mut self, state: &Bound<'_, PyBytes>) -> PyResult<()> {
        self.inner = ReflectionList::from_bytes(state.as_bytes()).map_err(to_py_err)?;
        Ok(())
    }
}
