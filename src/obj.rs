//! Parser for the polygon subset of the Wavefront OBJ text format.
//!
//! Only what the overlay needs is understood:
//!
//! | command | effect |
//! |---|---|
//! | `v`  | append floats to the position pool |
//! | `vn` | append floats to the normal pool |
//! | `vt` | append floats to the texture-coordinate pool |
//! | `f`  | triangle or quad of `v/vt/vn` references (1-based) |
//! | `mtllib`, `usemtl`, `g`, `s`, `o` | accepted and ignored |
//!
//! Anything else is an error. Blank lines and `#` comments are skipped.
//!
//! Faces are expanded into flat arrays (one position/normal/texcoord per
//! triangle corner) so the result can be drawn without an index buffer.
//! Quads are split with the fixed fan `[0, 1, 2, 2, 3, 0]`, and every V
//! coordinate is flipped (`1 - v`) because camera images and uploaded
//! textures use a top-left origin while OBJ uses bottom-left.

use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::mesh::Mesh;

/// Commands that are valid OBJ but have no geometric effect here.
const IGNORED_COMMANDS: [&str; 5] = ["mtllib", "usemtl", "g", "s", "o"];

/// Corner order for a quad split into two triangles.
const QUAD_FAN: [usize; 6] = [0, 1, 2, 2, 3, 0];
const TRIANGLE: [usize; 3] = [0, 1, 2];

/// The vertex attribute a face reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texture coordinate",
            Attribute::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Reasons a geometry description cannot become a [`Mesh`].
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: unrecognized command `{command}`")]
    UnrecognizedCommand { line: usize, command: String },

    #[error("line {line}: malformed face reference `{reference}`, expected `v/vt/vn`")]
    MalformedFaceReference { line: usize, reference: String },

    #[error("line {line}: {attribute} index {index} is out of range ({available} defined)")]
    IndexOutOfRange {
        line: usize,
        attribute: Attribute,
        /// The index as written in the file (1-based).
        index: usize,
        available: usize,
    },

    #[error("line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: faces with {vertices} vertices are not supported")]
    UnsupportedFace { line: usize, vertices: usize },
}

/// What to do with faces that are neither triangles nor quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacePolicy {
    /// Drop the face and log it.
    #[default]
    Lenient,
    /// Fail with [`ParseError::UnsupportedFace`].
    Strict,
}

/// Parser settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub face_policy: FacePolicy,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            face_policy: FacePolicy::Strict,
        }
    }

    pub fn with_face_policy(mut self, face_policy: FacePolicy) -> Self {
        self.face_policy = face_policy;
        self
    }
}

/// Parse geometry text with [`ParseOptions::default`].
pub fn parse(text: &str) -> Result<Mesh, ParseError> {
    parse_with(text, &ParseOptions::default())
}

/// Parse geometry text into an index-expanded [`Mesh`].
///
/// Nothing is returned on failure; a bad file never yields a partial mesh.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Mesh, ParseError> {
    let pools = RawVertexPools::collect(text, options)?;
    debug!(
        "parsed {} positions, {} normals, {} texcoords, {} face vertices",
        pools.positions.len() / 3,
        pools.normals.len() / 3,
        pools.texcoords.len() / 2,
        pools.face_vertices.len()
    );
    pools.expand()
}

/// One triangle corner as written in an `f` record (indices still 1-based).
#[derive(Debug, Clone, Copy)]
struct FaceVertex {
    position: usize,
    texcoord: usize,
    normal: usize,
    line: usize,
}

impl FaceVertex {
    fn parse(reference: &str, line: usize) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedFaceReference {
            line,
            reference: reference.to_string(),
        };

        let fields: Vec<&str> = reference.split('/').collect();
        if fields.len() < 3 {
            return Err(malformed());
        }

        let index = |field: &str| field.parse::<usize>().map_err(|_| malformed());

        Ok(Self {
            position: index(fields[0])?,
            texcoord: index(fields[1])?,
            normal: index(fields[2])?,
            line,
        })
    }
}

/// Raw floats as declared plus the ordered triangle corners that reference them.
#[derive(Debug, Default)]
struct RawVertexPools {
    positions: Vec<f32>,
    normals: Vec<f32>,
    texcoords: Vec<f32>,
    face_vertices: Vec<FaceVertex>,
}

impl RawVertexPools {
    fn collect(text: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        let mut pools = Self::default();
        let mut reported: Vec<&str> = Vec::new();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let mut tokens = raw.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };
            if command.starts_with('#') {
                continue;
            }

            match command {
                "v" => push_floats(&mut pools.positions, tokens, line)?,
                "vn" => push_floats(&mut pools.normals, tokens, line)?,
                "vt" => push_floats(&mut pools.texcoords, tokens, line)?,
                "f" => {
                    let args: Vec<&str> = tokens.collect();
                    pools.push_face(&args, line, options.face_policy)?;
                }
                ignored if IGNORED_COMMANDS.contains(&ignored) => {
                    if !reported.contains(&ignored) {
                        warn!("line {line}: `{ignored}` is not supported and will be ignored");
                        reported.push(ignored);
                    }
                }
                other => {
                    return Err(ParseError::UnrecognizedCommand {
                        line,
                        command: other.to_string(),
                    })
                }
            }
        }

        Ok(pools)
    }

    fn push_face(&mut self, args: &[&str], line: usize, policy: FacePolicy) -> Result<(), ParseError> {
        let corners: &[usize] = match args.len() {
            3 => &TRIANGLE,
            4 => &QUAD_FAN,
            vertices => {
                return match policy {
                    FacePolicy::Lenient => {
                        warn!("line {line}: dropping face with {vertices} vertices");
                        Ok(())
                    }
                    FacePolicy::Strict => Err(ParseError::UnsupportedFace { line, vertices }),
                };
            }
        };

        let parsed = args
            .iter()
            .map(|reference| FaceVertex::parse(reference, line))
            .collect::<Result<Vec<_>, _>>()?;

        self.face_vertices
            .extend(corners.iter().map(|&corner| parsed[corner]));
        Ok(())
    }

    fn expand(self) -> Result<Mesh, ParseError> {
        let count = self.face_vertices.len();
        let mut positions = Vec::with_capacity(count * 3);
        let mut normals = Vec::with_capacity(count * 3);
        let mut texcoords = Vec::with_capacity(count * 2);

        for corner in &self.face_vertices {
            let line = corner.line;

            positions.extend_from_slice(lookup(
                &self.positions,
                3,
                corner.position,
                Attribute::Position,
                line,
            )?);

            let uv = lookup(&self.texcoords, 2, corner.texcoord, Attribute::TexCoord, line)?;
            texcoords.push(uv[0]);
            texcoords.push(1.0 - uv[1]);

            normals.extend_from_slice(lookup(
                &self.normals,
                3,
                corner.normal,
                Attribute::Normal,
                line,
            )?);
        }

        assert_eq!(positions.len(), count * 3, "positions should use all");
        assert_eq!(normals.len(), count * 3, "normals should use all");
        assert_eq!(texcoords.len(), count * 2, "texcoords should use all");

        Ok(Mesh::from_expanded(positions, normals, texcoords))
    }
}

fn push_floats<'a>(
    pool: &mut Vec<f32>,
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<(), ParseError> {
    for token in tokens {
        let value = token.parse::<f32>().map_err(|_| ParseError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
        pool.push(value);
    }
    Ok(())
}

/// The `width` floats of the 1-based `index`-th record in `pool`.
fn lookup(
    pool: &[f32],
    width: usize,
    index: usize,
    attribute: Attribute,
    line: usize,
) -> Result<&[f32], ParseError> {
    index
        .checked_sub(1)
        .and_then(|i| i.checked_mul(width))
        .and_then(|start| pool.get(start..start.checked_add(width)?))
        .ok_or(ParseError::IndexOutOfRange {
            line,
            attribute,
            index,
            available: pool.len() / width,
        })
}
