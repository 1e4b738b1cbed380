use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::PyClassInitializer;
use pyo3::types::{PyDict, PyMapping, PyTuple};
use numpy::{PyArray3, PyReadonlyArray3};
use xtalcore::data::geometry::{BoundingBox, Vec2, Vec3};
use xtalcore::data::miller::MillerIndex;
use xtalcore::data::reflection::{check_state_arity, Reflection, ReflectionBase, ReflectionState, REFLECTION_STATE_ARITY};
use xtalcore::error::XtalError;

use crate::py_utility::{shoebox_from_py, shoebox_to_py, to_py_err};

type Int6 = (i32, i32, i32, i32, i32, i32);

fn vec3_to_py(v: Vec3) -> (f64, f64, f64) {
    (v.x, v.y, v.z)
}

fn vec2_to_py(v: Vec2) -> (f64, f64) {
    (v.x, v.y)
}

fn vec3_from_py((x, y, z): (f64, f64, f64)) -> Vec3 {
    Vec3::new(x, y, z)
}

fn vec2_from_py((x, y): (f64, f64)) -> Vec2 {
    Vec2::new(x, y)
}

#[pyclass(subclass, name = "ReflectionBase", module = "xtalpy_connector")]
#[derive(Clone)]
pub struct PyReflectionBase {
    pub inner: ReflectionBase,
}

#[pymethods]
impl PyReflectionBase {
    #[new]
    #[pyo3(signature = (miller_index=(0, 0, 0)))]
    pub fn new(miller_index: (i32, i32, i32)) -> Self {
        PyReflectionBase { inner: ReflectionBase::new(miller_index.into()) }
    }

    #[getter]
    pub fn miller_index(&self) -> (i32, i32, i32) {
        self.inner.miller_index().into()
    }

    #[setter]
    pub fn set_miller_index(&mut self, miller_index: (i32, i32, i32)) {
        self.inner.set_miller_index(miller_index.into());
    }

    pub fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }

    pub fn __getnewargs__(&self) -> ((i32, i32, i32),) {
        (self.miller_index(),)
    }

    pub fn __repr__(&self) -> String {
        format!("ReflectionBase(miller_index={})", self.inner.miller_index())
    }
}

/// Python view of a `Reflection`.
///
/// The whole record, Miller index included, lives in `inner`. Every write of
/// the index also goes to the `ReflectionBase` part, so the base class
/// accessors always see the current value.
#[pyclass(extends = PyReflectionBase, dict, name = "Reflection", module = "xtalpy_connector")]
pub struct PyReflection {
    pub inner: Reflection,
}

impl PyReflection {
    pub fn create(py: Python<'_>, inner: Reflection) -> PyResult<Py<PyReflection>> {
        let base = PyReflectionBase { inner: *inner.base() };
        Py::new(py, PyClassInitializer::from(base).add_subclass(PyReflection { inner }))
    }

    fn extract_state(state: &Bound<'_, PyTuple>) -> PyResult<ReflectionState> {
        let miller_index: (i32, i32, i32) = state.get_item(1)?.extract()?;
        let bounding_box: Int6 = state.get_item(8)?.extract()?;
        let shoebox: PyReadonlyArray3<i32> = state.get_item(11)?.extract()?;
        let shoebox_weights: PyReadonlyArray3<f64> = state.get_item(12)?.extract()?;
        let transformed_shoebox: PyReadonlyArray3<f64> = state.get_item(13)?.extract()?;
        Ok(ReflectionState {
            miller_index: MillerIndex::from(miller_index),
            rotation_angle: state.get_item(2)?.extract()?,
            beam_vector: vec3_from_py(state.get_item(3)?.extract()?),
            image_coord_mm: vec2_from_py(state.get_item(4)?.extract()?),
            image_coord_px: vec2_from_py(state.get_item(5)?.extract()?),
            frame_number: state.get_item(6)?.extract()?,
            panel_number: state.get_item(7)?.extract()?,
            bounding_box: BoundingBox::from(bounding_box),
            centroid_position: vec3_from_py(state.get_item(9)?.extract()?),
            centroid_variance: vec3_from_py(state.get_item(10)?.extract()?),
            shoebox: shoebox_from_py(shoebox)?,
            shoebox_weights: shoebox_from_py(shoebox_weights)?,
            transformed_shoebox: shoebox_from_py(transformed_shoebox)?,
        })
    }
}

#[pymethods]
impl PyReflection {
    /// `Reflection()`, `Reflection(miller_index)` or the copy form `Reflection(other)`.
    #[new]
    #[pyo3(signature = (miller_index=None))]
    pub fn new(miller_index: Option<&Bound<'_, PyAny>>) -> PyResult<(Self, PyReflectionBase)> {
        let inner = match miller_index {
            None => Reflection::default(),
            Some(arg) => match arg.downcast::<PyReflection>() {
                Ok(other) => other.borrow().inner.clone(),
                Err(_) => Reflection::new(arg.extract::<(i32, i32, i32)>()?.into()),
            },
        };
        let base = PyReflectionBase { inner: *inner.base() };
        Ok((PyReflection { inner }, base))
    }

    #[getter]
    pub fn miller_index(&self) -> (i32, i32, i32) {
        self.inner.miller_index().into()
    }

    #[setter]
    pub fn set_miller_index(mut slf: PyRefMut<'_, Self>, miller_index: (i32, i32, i32)) {
        let index = MillerIndex::from(miller_index);
        slf.inner.set_miller_index(index);
        slf.into_super().inner.set_miller_index(index);
    }

    pub fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }

    #[getter]
    pub fn rotation_angle(&self) -> f64 { self.inner.rotation_angle() }

    #[setter]
    pub fn set_rotation_angle(&mut self, rotation_angle: f64) { self.inner.set_rotation_angle(rotation_angle); }

    #[getter]
    pub fn beam_vector(&self) -> (f64, f64, f64) { vec3_to_py(self.inner.beam_vector()) }

    #[setter]
    pub fn set_beam_vector(&mut self, beam_vector: (f64, f64, f64)) { self.inner.set_beam_vector(vec3_from_py(beam_vector)); }

    #[getter]
    pub fn image_coord_mm(&self) -> (f64, f64) { vec2_to_py(self.inner.image_coord_mm()) }

    #[setter]
    pub fn set_image_coord_mm(&mut self, image_coord_mm: (f64, f64)) { self.inner.set_image_coord_mm(vec2_from_py(image_coord_mm)); }

    #[getter]
    pub fn image_coord_px(&self) -> (f64, f64) { vec2_to_py(self.inner.image_coord_px()) }

    #[setter]
    pub fn set_image_coord_px(&mut self, image_coord_px: (f64, f64)) { self.inner.set_image_coord_px(vec2_from_py(image_coord_px)); }

    #[getter]
    pub fn frame_number(&self) -> f64 { self.inner.frame_number() }

    #[setter]
    pub fn set_frame_number(&mut self, frame_number: f64) { self.inner.set_frame_number(frame_number); }

    #[getter]
    pub fn panel_number(&self) -> i32 { self.inner.panel_number() }

    #[setter]
    pub fn set_panel_number(&mut self, panel_number: i32) { self.inner.set_panel_number(panel_number); }

    #[getter]
    pub fn bounding_box(&self) -> Int6 { self.inner.bounding_box().into() }

    #[setter]
    pub fn set_bounding_box(&mut self, bounding_box: Int6) { self.inner.set_bounding_box(bounding_box.into()); }

    /// Raw counts as an int32 array of shape `(z, y, x)`.
    #[getter]
    pub fn shoebox(&self, py: Python<'_>) -> PyResult<Py<PyArray3<i32>>> {
        shoebox_to_py(py, self.inner.shoebox())
    }

    #[setter]
    pub fn set_shoebox<'py>(&mut self, shoebox: PyReadonlyArray3<'py, i32>) -> PyResult<()> {
        self.inner.set_shoebox(shoebox_from_py(shoebox)?);
        Ok(())
    }

    #[getter]
    pub fn shoebox_weights(&self, py: Python<'_>) -> PyResult<Py<PyArray3<f64>>> {
        shoebox_to_py(py, self.inner.shoebox_weights())
    }

    #[setter]
    pub fn set_shoebox_weights<'py>(&mut self, shoebox_weights: PyReadonlyArray3<'py, f64>) -> PyResult<()> {
        self.inner.set_shoebox_weights(shoebox_from_py(shoebox_weights)?);
        Ok(())
    }

    #[getter]
    pub fn transformed_shoebox(&self, py: Python<'_>) -> PyResult<Py<PyArray3<f64>>> {
        shoebox_to_py(py, self.inner.transformed_shoebox())
    }

    #[setter]
    pub fn set_transformed_shoebox<'py>(&mut self, transformed_shoebox: PyReadonlyArray3<'py, f64>) -> PyResult<()> {
        self.inner.set_transformed_shoebox(shoebox_from_py(transformed_shoebox)?);
        Ok(())
    }

    #[getter]
    pub fn centroid_position(&self) -> (f64, f64, f64) { vec3_to_py(self.inner.centroid_position()) }

    #[setter]
    pub fn set_centroid_position(&mut self, centroid_position: (f64, f64, f64)) { self.inner.set_centroid_position(vec3_from_py(centroid_position)); }

    #[getter]
    pub fn centroid_variance(&self) -> (f64, f64, f64) { vec3_to_py(self.inner.centroid_variance()) }

    #[setter]
    pub fn set_centroid_variance(&mut self, centroid_variance: (f64, f64, f64)) { self.inner.set_centroid_variance(vec3_from_py(centroid_variance)); }

    pub fn __str__(&self) -> String {
        self.inner.to_string()
    }

    pub fn __repr__(&self) -> String {
        format!("Reflection(miller_index={})", self.inner.miller_index())
    }

    /// `(__dict__, miller_index, rotation_angle, beam_vector, image_coord_mm,
    /// image_coord_px, frame_number, panel_number, bounding_box,
    /// centroid_position, centroid_variance, shoebox, shoebox_weights,
    /// transformed_shoebox)`
    pub fn __getstate__<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, PyTuple>> {
        let py = slf.py();
        let dict = slf.getattr("__dict__")?;
        let state = slf.borrow().inner.state();
        let items: Vec<PyObject> = vec![
            dict.unbind(),
            state.miller_index.as_tuple().into_py(py),
            state.rotation_angle.into_py(py),
            vec3_to_py(state.beam_vector).into_py(py),
            vec2_to_py(state.image_coord_mm).into_py(py),
            vec2_to_py(state.image_coord_px).into_py(py),
            state.frame_number.into_py(py),
            state.panel_number.into_py(py),
            state.bounding_box.as_tuple().into_py(py),
            vec3_to_py(state.centroid_position).into_py(py),
            vec3_to_py(state.centroid_variance).into_py(py),
            shoebox_to_py(py, &state.shoebox)?.into_any(),
            shoebox_to_py(py, &state.shoebox_weights)?.into_any(),
            shoebox_to_py(py, &state.transformed_shoebox)?.into_any(),
        ];
        debug_assert_eq!(items.len(), REFLECTION_STATE_ARITY);
        Ok(PyTuple::new_bound(py, items))
    }

    /// Every item is converted before anything is written, so a bad state
    /// leaves the object untouched.
    pub fn __setstate__(slf: &Bound<'_, Self>, state: &Bound<'_, PyTuple>) -> PyResult<()> {
        match check_state_arity(state.len()) {
            Ok(()) => {}
            Err(XtalError::StateArity { expected, .. }) => {
                return Err(PyValueError::new_err(format!(
                    "expected {}-item tuple in call to __setstate__; got {}",
                    expected,
                    state.repr()?
                )));
            }
            Err(e) => return Err(to_py_err(e)),
        }

        let native = Self::extract_state(state)?;
        let saved_dict = state.get_item(0)?;
        let saved_dict = saved_dict.downcast::<PyMapping>()?;

        let dict = slf.getattr("__dict__")?;
        dict.downcast::<PyDict>()?.update(saved_dict)?;
        let mut this = slf.borrow_mut();
        this.inner.restore_state(native);
        let index = this.inner.miller_index();
        this.into_super().inner.set_miller_index(index);
        Ok(())
    }
}
