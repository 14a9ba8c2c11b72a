//! # Traits
//!
//! General purpose traits shared by the readers and the grid index.

use crate::parse::error;

/// Build a container from a flat buffer of values read from a file
///
/// The buffer is always in file order (x1 fastest) and `dims` holds the
/// extent of the three axes. Implementors check that the buffer length
/// matches the shape.
pub trait FromBuffer<T>: Sized {
    fn from_buffer(buffer: Vec<T>, dims: [usize; 3]) -> Result<Self, error::PayloadLength>;
}

/// The steps that turn a parsed dataset into a set of grids that can be
/// read from.
///
/// Implementors only need to provide the four steps; [`GridIndex::setup`]
/// runs them in the order they depend on each other: the field list is
/// detected, grids are counted, the index (grid geometry and the field offset
/// index) is parsed, and finally the grid objects are created.
pub trait GridIndex {
    /// populate the list of fields that can be read from the file
    fn detect_output_fields(&mut self);

    /// set the number of grids in the index
    fn count_grids(&mut self);

    /// fill in the geometry of every grid and everything later reads need
    fn parse_index(&mut self) -> Result<(), crate::Error>;

    /// construct the grid objects from the parsed index
    fn populate_grid_objects(&mut self);

    fn setup(&mut self) -> Result<(), crate::Error> {
        self.detect_output_fields();
        self.count_grids();
        self.parse_index()?;
        self.populate_grid_objects();
        Ok(())
    }
}
