pub mod error;
pub mod config;

// data module
pub mod data {
    pub mod miller;
    pub mod geometry;
    pub mod shoebox;
    pub mod reflection;
    pub mod reflection_list;
}

// io module
pub mod io {
    pub mod reflection_file;
}

pub use error::{Result, XtalError};
