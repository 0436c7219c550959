//! Binary STL export.
//!
//! Layout: an 80-byte header, a little-endian `u32` triangle count, then per
//! triangle a facet normal, three vertices (all `f32` triples) and a `u16`
//! attribute byte count.

use std::path::Path;

use crate::{CadError, Part};

const HEADER: &[u8] = b"planecad binary STL";

/// Bytes per triangle record.
const RECORD_LEN: usize = 50;

/// Encode a part as binary STL.
///
/// # Errors
///
/// Returns [`CadError::EmptyGeometry`] if the part has no triangles.
pub fn to_stl_bytes(part: &Part) -> Result<Vec<u8>, CadError> {
    let mesh = part.to_mesh();
    let num_triangles = mesh.num_triangles();
    if num_triangles == 0 {
        return Err(CadError::EmptyGeometry);
    }
    let vertices = &mesh.vertices;
    let mut data = Vec::with_capacity(84 + num_triangles * RECORD_LEN);

    let mut header = [b' '; 80];
    header[..HEADER.len()].copy_from_slice(HEADER);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.indices.chunks(3) {
        let corner = |i: u32| {
            let i = i as usize * 3;
            [vertices[i], vertices[i + 1], vertices[i + 2]]
        };
        let (v0, v1, v2) = (corner(tri[0]), corner(tri[1]), corner(tri[2]));

        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let nx = e1[1] * e2[2] - e1[2] * e2[1];
        let ny = e1[2] * e2[0] - e1[0] * e2[2];
        let nz = e1[0] * e2[1] - e1[1] * e2[0];
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        let normal = if len > 1e-10 {
            [nx / len, ny / len, nz / len]
        } else {
            [0.0, 0.0, 1.0]
        };

        for v in [normal, v0, v1, v2] {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(data)
}

/// Write a part to a binary STL file.
pub fn export_stl(part: &Part, path: impl AsRef<Path>) -> Result<(), CadError> {
    let path = path.as_ref();
    let bytes = to_stl_bytes(part)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), part = %part.name, "wrote STL");
    Ok(())
}
