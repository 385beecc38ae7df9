//! GPU-ready triangle geometry.
//!
//! A [`Mesh`] holds flat, index-expanded attribute arrays: every triangle
//! vertex has its own position, normal and texture coordinate, so the arrays
//! can be bound as vertex attributes and drawn with a plain triangle list.

use std::path::Path;

use thiserror::Error;

use crate::obj::{self, ParseError};

/// Errors from building a mesh out of caller-supplied arrays.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error(
        "attribute arrays disagree: {positions} positions, {normals} normals, {texcoords} texcoords"
    )]
    LengthMismatch {
        positions: usize,
        normals: usize,
        texcoords: usize,
    },
}

/// Errors from loading a mesh from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read mesh file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Immutable, index-expanded triangle geometry.
///
/// - `positions`: 3 floats per vertex
/// - `normals`: 3 floats per vertex
/// - `texcoords`: 2 floats per vertex, V already flipped to a top-left origin
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<f32>,
    normals: Vec<f32>,
    texcoords: Vec<f32>,
}

impl Mesh {
    /// Build a mesh from flat attribute arrays.
    ///
    /// Fails when the arrays describe different vertex counts or when the
    /// vertex count is not a whole number of triangles.
    pub fn new(
        positions: Vec<f32>,
        normals: Vec<f32>,
        texcoords: Vec<f32>,
    ) -> Result<Self, MeshError> {
        let vertices = positions.len() / 3;
        let consistent = positions.len() % 3 == 0
            && normals.len() == vertices * 3
            && texcoords.len() == vertices * 2
            && vertices % 3 == 0;

        if !consistent {
            return Err(MeshError::LengthMismatch {
                positions: positions.len(),
                normals: normals.len(),
                texcoords: texcoords.len(),
            });
        }

        Ok(Self {
            positions,
            normals,
            texcoords,
        })
    }

    /// Build a mesh whose lengths the caller has already checked.
    ///
    /// # Panics
    /// Panics if the arrays disagree; only the parser calls this.
    pub(crate) fn from_expanded(positions: Vec<f32>, normals: Vec<f32>, texcoords: Vec<f32>) -> Self {
        let vertices = positions.len() / 3;
        assert_eq!(positions.len(), vertices * 3, "positions should use all");
        assert_eq!(normals.len(), vertices * 3, "normals should use all");
        assert_eq!(texcoords.len(), vertices * 2, "texcoords should use all");

        Self {
            positions,
            normals,
            texcoords,
        }
    }

    /// Parse geometry text with the default options.
    pub fn from_obj_str(text: &str) -> Result<Self, ParseError> {
        obj::parse(text)
    }

    /// Read and parse a geometry file.
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(obj::parse(&text)?)
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[f32] {
        &self.texcoords
    }

    /// Number of drawable vertices (three per triangle).
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
