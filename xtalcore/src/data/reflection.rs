use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use bincode::{Decode, Encode};
use serde::{Serialize, Deserialize};

use crate::data::geometry::{BoundingBox, Vec2, Vec3};
use crate::data::miller::MillerIndex;
use crate::data::shoebox::{FloatShoebox, IntShoebox};
use crate::error::{Result, XtalError};

/// Number of items in a pickled reflection: the instance `__dict__` followed
/// by the thirteen native fields of `ReflectionState`.
pub const REFLECTION_STATE_ARITY: usize = 14;

/// Checks the length of a pickled reflection state before anything is restored.
///
/// # Example
///
/// ```rust
/// # use xtalcore::data::reflection::check_state_arity;
/// assert!(check_state_arity(14).is_ok());
/// assert!(check_state_arity(13).is_err());
/// ```
pub fn check_state_arity(len: usize) -> Result<()> {
    if len != REFLECTION_STATE_ARITY {
        log::warn!("rejecting reflection state with {} items", len);
        return Err(XtalError::StateArity { expected: REFLECTION_STATE_ARITY, got: len });
    }
    Ok(())
}

/// The part of a reflection that only knows its Miller index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ReflectionBase {
    miller_index: MillerIndex,
}

impl ReflectionBase {
    pub fn new(miller_index: MillerIndex) -> Self {
        ReflectionBase { miller_index }
    }

    pub fn miller_index(&self) -> MillerIndex {
        self.miller_index
    }

    pub fn set_miller_index(&mut self, miller_index: MillerIndex) {
        self.miller_index = miller_index;
    }

    pub fn is_zero(&self) -> bool {
        self.miller_index.is_zero()
    }
}

/// A single diffraction spot: its index, predicted geometry, frame and panel,
/// bounding box, centroid statistics and shoeboxes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    base: ReflectionBase,
    rotation_angle: f64,
    beam_vector: Vec3,
    image_coord_mm: Vec2,
    image_coord_px: Vec2,
    frame_number: f64,
    panel_number: i32,
    bounding_box: BoundingBox,
    centroid_position: Vec3,
    centroid_variance: Vec3,
    shoebox: IntShoebox,
    shoebox_weights: FloatShoebox,
    transformed_shoebox: FloatShoebox,
}

/// The native fields of a `Reflection` in pickle order.
#[derive(Clone, Debug, PartialEq)]
pub struct ReflectionState {
    pub miller_index: MillerIndex,
    pub rotation_angle: f64,
    pub beam_vector: Vec3,
    pub image_coord_mm: Vec2,
    pub image_coord_px: Vec2,
    pub frame_number: f64,
    pub panel_number: i32,
    pub bounding_box: BoundingBox,
    pub centroid_position: Vec3,
    pub centroid_variance: Vec3,
    pub shoebox: IntShoebox,
    pub shoebox_weights: FloatShoebox,
    pub transformed_shoebox: FloatShoebox,
}

impl Default for Reflection {
    fn default() -> Self {
        Reflection {
            base: ReflectionBase::default(),
            rotation_angle: 0.0,
            beam_vector: Vec3::zeros(),
            image_coord_mm: Vec2::zeros(),
            image_coord_px: Vec2::zeros(),
            frame_number: 0.0,
            panel_number: 0,
            bounding_box: BoundingBox::default(),
            centroid_position: Vec3::zeros(),
            centroid_variance: Vec3::zeros(),
            shoebox: IntShoebox::empty(),
            shoebox_weights: FloatShoebox::empty(),
            transformed_shoebox: FloatShoebox::empty(),
        }
    }
}

impl Reflection {
    /// Creates a new `Reflection` with the given Miller index and every other
    /// field zeroed.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::data::reflection::Reflection;
    /// # use xtalcore::data::miller::MillerIndex;
    /// let reflection = Reflection::new(MillerIndex::new(1, 2, 3));
    /// assert!(!reflection.is_zero());
    /// assert_eq!(reflection.rotation_angle(), 0.0);
    /// assert!(reflection.shoebox().is_empty());
    /// ```
    pub fn new(miller_index: MillerIndex) -> Self {
        Reflection { base: ReflectionBase::new(miller_index), ..Default::default() }
    }

    pub fn from_state(state: ReflectionState) -> Self {
        let mut reflection = Reflection::default();
        reflection.restore_state(state);
        reflection
    }

    pub fn base(&self) -> &ReflectionBase {
        &self.base
    }

    pub fn rotation_angle(&self) -> f64 { self.rotation_angle }
    pub fn set_rotation_angle(&mut self, rotation_angle: f64) { self.rotation_angle = rotation_angle; }

    pub fn beam_vector(&self) -> Vec3 { self.beam_vector }
    pub fn set_beam_vector(&mut self, beam_vector: Vec3) { self.beam_vector = beam_vector; }

    pub fn image_coord_mm(&self) -> Vec2 { self.image_coord_mm }
    pub fn set_image_coord_mm(&mut self, image_coord_mm: Vec2) { self.image_coord_mm = image_coord_mm; }

    pub fn image_coord_px(&self) -> Vec2 { self.image_coord_px }
    pub fn set_image_coord_px(&mut self, image_coord_px: Vec2) { self.image_coord_px = image_coord_px; }

    pub fn frame_number(&self) -> f64 { self.frame_number }
    pub fn set_frame_number(&mut self, frame_number: f64) { self.frame_number = frame_number; }

    pub fn panel_number(&self) -> i32 { self.panel_number }
    pub fn set_panel_number(&mut self, panel_number: i32) { self.panel_number = panel_number; }

    pub fn bounding_box(&self) -> BoundingBox { self.bounding_box }
    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) { self.bounding_box = bounding_box; }

    pub fn centroid_position(&self) -> Vec3 { self.centroid_position }
    pub fn set_centroid_position(&mut self, centroid_position: Vec3) { self.centroid_position = centroid_position; }

    pub fn centroid_variance(&self) -> Vec3 { self.centroid_variance }
    pub fn set_centroid_variance(&mut self, centroid_variance: Vec3) { self.centroid_variance = centroid_variance; }

    pub fn shoebox(&self) -> &IntShoebox { &self.shoebox }
    pub fn set_shoebox(&mut self, shoebox: IntShoebox) { self.shoebox = shoebox; }

    pub fn shoebox_weights(&self) -> &FloatShoebox { &self.shoebox_weights }
    pub fn set_shoebox_weights(&mut self, shoebox_weights: FloatShoebox) { self.shoebox_weights = shoebox_weights; }

    pub fn transformed_shoebox(&self) -> &FloatShoebox { &self.transformed_shoebox }
    pub fn set_transformed_shoebox(&mut self, transformed_shoebox: FloatShoebox) { self.transformed_shoebox = transformed_shoebox; }

    /// Snapshot of every native field, in pickle order.
    pub fn state(&self) -> ReflectionState {
        ReflectionState {
            miller_index: self.miller_index(),
            rotation_angle: self.rotation_angle,
            beam_vector: self.beam_vector,
            image_coord_mm: self.image_coord_mm,
            image_coord_px: self.image_coord_px,
            frame_number: self.frame_number,
            panel_number: self.panel_number,
            bounding_box: self.bounding_box,
            centroid_position: self.centroid_position,
            centroid_variance: self.centroid_variance,
            shoebox: self.shoebox.clone(),
            shoebox_weights: self.shoebox_weights.clone(),
            transformed_shoebox: self.transformed_shoebox.clone(),
        }
    }

    /// Overwrites every native field from `state`.
    pub fn restore_state(&mut self, state: ReflectionState) {
        self.set_miller_index(state.miller_index);
        self.rotation_angle = state.rotation_angle;
        self.beam_vector = state.beam_vector;
        self.image_coord_mm = state.image_coord_mm;
        self.image_coord_px = state.image_coord_px;
        self.frame_number = state.frame_number;
        self.panel_number = state.panel_number;
        self.bounding_box = state.bounding_box;
        self.centroid_position = state.centroid_position;
        self.centroid_variance = state.centroid_variance;
        self.shoebox = state.shoebox;
        self.shoebox_weights = state.shoebox_weights;
        self.transformed_shoebox = state.transformed_shoebox;
    }

    /// Checks the shoeboxes of a record that did not come through `Shoebox::new`.
    pub fn validate(&self) -> Result<()> {
        self.shoebox.validate()?;
        self.shoebox_weights.validate()?;
        self.transformed_shoebox.validate()
    }
}

impl Deref for Reflection {
    type Target = ReflectionBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for Reflection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl From<ReflectionState> for Reflection {
    fn from(state: ReflectionState) -> Self {
        Reflection::from_state(state)
    }
}

fn fmt_vec3(v: &Vec3) -> String {
    format!("({}, {}, {})", v.x, v.y, v.z)
}

fn fmt_vec2(v: &Vec2) -> String {
    format!("({}, {})", v.x, v.y)
}

impl Display for Reflection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reflection:")?;
        writeln!(f, "  miller index:        {}", self.miller_index())?;
        writeln!(f, "  rotation angle:      {}", self.rotation_angle)?;
        writeln!(f, "  beam vector:         {}", fmt_vec3(&self.beam_vector))?;
        writeln!(f, "  image coord (mm):    {}", fmt_vec2(&self.image_coord_mm))?;
        writeln!(f, "  image coord (px):    {}", fmt_vec2(&self.image_coord_px))?;
        writeln!(f, "  frame number:        {}", self.frame_number)?;
        writeln!(f, "  panel number:        {}", self.panel_number)?;
        writeln!(f, "  bounding box:        {}", self.bounding_box)?;
        writeln!(f, "  centroid position:   {}", fmt_vec3(&self.centroid_position))?;
        writeln!(f, "  centroid variance:   {}", fmt_vec3(&self.centroid_variance))?;
        writeln!(f, "  shoebox:             {}", self.shoebox)?;
        writeln!(f, "  shoebox weights:     {}", self.shoebox_weights)?;
        write!(f, "  transformed shoebox: {}", self.transformed_shoebox)
    }
}

// Manual bincode implementation, nalgebra vectors are written as raw components
fn encode_vec3<E: bincode::enc::Encoder>(v: &Vec3, encoder: &mut E) -> std::result::Result<(), bincode::error::EncodeError> {
    bincode::Encode::encode(&[v.x, v.y, v.z], encoder)
}

fn encode_vec2<E: bincode::enc::Encoder>(v: &Vec2, encoder: &mut E) -> std::result::Result<(), bincode::error::EncodeError> {
    bincode::Encode::encode(&[v.x, v.y], encoder)
}

fn decode_vec3<D: bincode::de::Decoder>(decoder: &mut D) -> std::result::Result<Vec3, bincode::error::DecodeError> {
    let [x, y, z]: [f64; 3] = bincode::Decode::decode(decoder)?;
    Ok(Vec3::new(x, y, z))
}

fn decode_vec2<D: bincode::de::Decoder>(decoder: &mut D) -> std::result::Result<Vec2, bincode::error::DecodeError> {
    let [x, y]: [f64; 2] = bincode::Decode::decode(decoder)?;
    Ok(Vec2::new(x, y))
}

impl Encode for Reflection {
    fn encode<E: bincode::enc::Encoder>(&self, encoder: &mut E) -> std::result::Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&self.base, encoder)?;
        bincode::Encode::encode(&self.rotation_angle, encoder)?;
        encode_vec3(&self.beam_vector, encoder)?;
        encode_vec2(&self.image_coord_mm, encoder)?;
        encode_vec2(&self.image_coord_px, encoder)?;
        bincode::Encode::encode(&self.frame_number, encoder)?;
        bincode::Encode::encode(&self.panel_number, encoder)?;
        bincode::Encode::encode(&self.bounding_box, encoder)?;
        encode_vec3(&self.centroid_position, encoder)?;
        encode_vec3(&self.centroid_variance, encoder)?;
        bincode::Encode::encode(&self.shoebox, encoder)?;
        bincode::Encode::encode(&self.shoebox_weights, encoder)?;
        bincode::Encode::encode(&self.transformed_shoebox, encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for Reflection {
    fn decode<D: bincode::de::Decoder<Context = Context>>(decoder: &mut D) -> std::result::Result<Self, bincode::error::DecodeError> {
        Ok(Reflection {
            base: bincode::Decode::decode(decoder)?,
            rotation_angle: bincode::Decode::decode(decoder)?,
            beam_vector: decode_vec3(decoder)?,
            image_coord_mm: decode_vec2(decoder)?,
            image_coord_px: decode_vec2(decoder)?,
            frame_number: bincode::Decode::decode(decoder)?,
            panel_number: bincode::Decode::decode(decoder)?,
            bounding_box: bincode::Decode::decode(decoder)?,
            centroid_position: decode_vec3(decoder)?,
            centroid_variance: decode_vec3(decoder)?,
            shoebox: bincode::Decode::decode(decoder)?,
            shoebox_weights: bincode::Decode::decode(decoder)?,
            transformed_shoebox: bincode::Decode::decode(decoder)?,
        })
    }
}

impl<'de, Context> bincode::BorrowDecode<'de, Context> for Reflection {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = Context>>(decoder: &mut D) -> std::result::Result<Self, bincode::error::DecodeError> {
        <Self as Decode<Context>>::decode(decoder)
    }
}
