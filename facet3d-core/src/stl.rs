//! STL loading into an [`IndexedMesh`].
//!
//! Both the binary and ASCII forms are parsed with nom. Bit-identical
//! vertices are welded into the shared vertex array. Facet normals that are
//! zero or not finite are replaced by the geometric normal of the facet.

use std::collections::HashMap;

use log::debug;
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{double, le_f32, le_u16},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{MeshError, MeshResult};
use crate::geometry::{Face, IndexedMesh, Triangle};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// A facet as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawFacet {
    normal: Vector3<f64>,
    vertices: [Point3<f64>; 3],
}

/// Detect and parse STL data (binary or ASCII).
pub fn parse_stl(data: &[u8]) -> MeshResult<IndexedMesh> {
    // Binary files may also start with "solid", so fall back on failure
    let ascii_error = match std::str::from_utf8(data) {
        Ok(text) if text.starts_with("solid") => match parse_ascii_stl(text) {
            Ok(mesh) => return Ok(mesh),
            Err(e) => Some(e),
        },
        _ => None,
    };
    parse_binary_stl(data).map_err(|binary_error| {
        debug!("binary STL parse failed: {binary_error}");
        ascii_error.unwrap_or(binary_error)
    })
}

/// Parse a binary STL file.
pub fn parse_binary_stl(data: &[u8]) -> MeshResult<IndexedMesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(MeshError::TooShort { len: data.len() });
    }
    let body = &data[HEADER_LEN..];
    let expected = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
    let body = &body[4..];

    let actual = body.len() / FACET_LEN;
    if actual < expected {
        return Err(MeshError::Truncated { expected, actual });
    }

    let (_, facets) = count(binary_facet, expected)(body)
        .map_err(|e: nom::Err<nom::error::Error<&[u8]>>| MeshError::Parse(format!("{e:?}")))?;
    Ok(build_mesh(&facets))
}

fn binary_vec3(input: &[u8]) -> IResult<&[u8], [f64; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x as f64, y as f64, z as f64]))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], RawFacet> {
    let (input, normal) = binary_vec3(input)?;
    let (input, vertices) = count(binary_vec3, 3)(input)?;
    // Attribute byte count
    let (input, _) = le_u16(input)?;
    Ok((
        input,
        RawFacet {
            normal: Vector3::from(normal),
            vertices: [
                Point3::from(vertices[0]),
                Point3::from(vertices[1]),
                Point3::from(vertices[2]),
            ],
        },
    ))
}

/// Parse an ASCII STL file.
pub fn parse_ascii_stl(input: &str) -> MeshResult<IndexedMesh> {
    match ascii_solid(input) {
        Ok((rest, facets)) if rest.trim().is_empty() => Ok(build_mesh(&facets)),
        Ok((rest, _)) => Err(MeshError::Parse(format!(
            "trailing input: {:?}",
            rest.chars().take(32).collect::<String>()
        ))),
        Err(e) => Err(MeshError::Parse(format!("{e:?}"))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<RawFacet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional name
    let (input, _) = not_line_ending(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, facets))
}

fn ascii_facet(input: &str) -> IResult<&str, RawFacet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((
        input,
        RawFacet {
            normal: Vector3::from(normal),
            vertices: [Point3::from(a), Point3::from(b), Point3::from(c)],
        },
    ))
}

fn ascii_vertex(input: &str) -> IResult<&str, [f64; 3]> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vec3)(input)
}

fn ascii_vec3(input: &str) -> IResult<&str, [f64; 3]> {
    let (input, x) = preceded(multispace0, double)(input)?;
    let (input, y) = preceded(multispace1, double)(input)?;
    let (input, z) = preceded(multispace1, double)(input)?;
    Ok((input, [x, y, z]))
}

fn build_mesh(facets: &[RawFacet]) -> IndexedMesh {
    let mut mesh = IndexedMesh::with_capacity(facets.len() / 2, facets.len());
    let mut welded: HashMap<[u64; 3], u32> = HashMap::new();
    let mut repaired = 0usize;

    for facet in facets {
        let indices = facet.vertices.map(|v| {
            // -0.0 and 0.0 weld together
            let key = [(v.x + 0.0).to_bits(), (v.y + 0.0).to_bits(), (v.z + 0.0).to_bits()];
            *welded.entry(key).or_insert_with(|| {
                mesh.vertices.push(v);
                (mesh.vertices.len() - 1) as u32
            })
        });

        let normal = match facet.normal.try_normalize(0.0) {
            Some(n) if n.iter().all(|c| c.is_finite()) => n,
            _ => {
                repaired += 1;
                Triangle::from_vertices(facet.vertices).normal
            }
        };
        mesh.faces.push(Face::new(indices, normal));
    }

    debug!(
        "loaded {} facets, {} unique vertices, {} normals recomputed",
        mesh.faces.len(),
        mesh.vertices.len(),
        repaired
    );
    mesh
}
