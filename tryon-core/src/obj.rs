//! Wavefront OBJ decoding into flat triangle lists

use nom::{
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, opt},
    multi::many1,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

use crate::geometry::{MeshData, MeshError};

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("line {line}: malformed `{keyword}` record")]
    Malformed { line: usize, keyword: &'static str },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// One face corner: position index, optional texture index. OBJ indices are
/// 1-based; negative values count back from the latest element.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    tex_coord: Option<i64>,
}

/// Parse OBJ text into a triangle list.
///
/// Faces with more than three corners are fan-triangulated. A corner without
/// a usable texture index gets `(0, 0)`. A triangle referencing a missing
/// position is dropped whole so positions and texture coordinates stay
/// aligned.
pub fn parse_obj(text: &str) -> Result<MeshData, ObjError> {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut positions = Vec::new();
    let mut tex_coords = Vec::new();
    let mut dropped = 0usize;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        let (keyword, rest) = match line.split_once(|c: char| c.is_whitespace()) {
            Some((keyword, rest)) => (keyword, rest),
            None => (line, ""),
        };

        match keyword {
            "v" => {
                let (_, v) = parse_vector3(rest).map_err(|_| ObjError::Malformed {
                    line: number + 1,
                    keyword: "v",
                })?;
                vertices.push(v);
            }
            "vt" => {
                let (_, uv) = parse_uv(rest).map_err(|_| ObjError::Malformed {
                    line: number + 1,
                    keyword: "vt",
                })?;
                uvs.push(uv);
            }
            "f" => {
                let (_, corners) = parse_face(rest).map_err(|_| ObjError::Malformed {
                    line: number + 1,
                    keyword: "f",
                })?;
                if corners.len() < 3 {
                    return Err(ObjError::Malformed {
                        line: number + 1,
                        keyword: "f",
                    });
                }

                for i in 1..corners.len() - 1 {
                    let triangle = [corners[0], corners[i], corners[i + 1]];
                    let resolved: Option<Vec<[f32; 3]>> = triangle
                        .iter()
                        .map(|c| resolve(c.position, vertices.len()).map(|idx| vertices[idx]))
                        .collect();
                    let Some(resolved) = resolved else {
                        dropped += 1;
                        continue;
                    };

                    for (corner, position) in triangle.iter().zip(resolved) {
                        positions.extend_from_slice(&position);
                        let uv = corner
                            .tex_coord
                            .and_then(|t| resolve(t, uvs.len()))
                            .map(|idx| uvs[idx])
                            .unwrap_or([0.0, 0.0]);
                        tex_coords.extend_from_slice(&uv);
                    }
                }
            }
            _ => {}
        }
    }

    if dropped > 0 {
        log::debug!("obj: dropped {dropped} triangles with out-of-range positions");
    }

    Ok(MeshData::new(positions, tex_coords)?)
}

fn resolve(index: i64, len: usize) -> Option<usize> {
    let idx = if index > 0 {
        index - 1
    } else if index < 0 {
        len as i64 + index
    } else {
        return None;
    };
    (0..len as i64).contains(&idx).then_some(idx as usize)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = space0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = space1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = space1(input)?;
    let (input, z) = float(input)?;
    // Optional w is ignored.
    Ok((input, [x, y, z]))
}

fn parse_uv(input: &str) -> IResult<&str, [f32; 2]> {
    let (input, _) = space0(input)?;
    let (input, u) = float(input)?;
    let (input, v) = opt(preceded(space1, float))(input)?;
    Ok((input, [u, v.unwrap_or(0.0)]))
}

fn parse_corner(input: &str) -> IResult<&str, Corner> {
    let (input, position) = integer(input)?;
    let (input, tex_coord) = opt(preceded(char('/'), opt(integer)))(input)?;
    // Normal index is not used by the renderer.
    let (input, _) = opt(preceded(char('/'), opt(integer)))(input)?;
    Ok((
        input,
        Corner {
            position,
            tex_coord: tex_coord.flatten(),
        },
    ))
}

fn parse_face(input: &str) -> IResult<&str, Vec<Corner>> {
    let (input, _) = space0(input)?;
    let (input, first) = parse_corner(input)?;
    let (input, mut rest) = all_consuming(parse_face_tail)(input)?;
    rest.insert(0, first);
    Ok((input, rest))
}

fn parse_face_tail(input: &str) -> IResult<&str, Vec<Corner>> {
    let (input, corners) = many1(preceded(space1, parse_corner))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, corners))
}
