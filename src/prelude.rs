//! Common traits and types that are useful for working with `idefix`
#![allow(unused_imports)]

pub use crate::dataset::IdefixDataset;
pub use crate::hierarchy::{IdefixGrid, IdefixHierarchy};
pub use crate::io::IoHandler;
pub use crate::parse::FileFormat;
pub use crate::traits::{FromBuffer, GridIndex};

pub(crate) use crate::{Error, ParseError};
pub(crate) use std::io::{BufRead, Read, Seek, SeekFrom};

pub(crate) use derive_more::{Constructor, Deref, DerefMut, Display, From};

pub(crate) use ndarray::Array3;
