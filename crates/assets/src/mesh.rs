use std::path::Path;

use vantage_common::Vertex;

use crate::{AssetError, ImageData, decode_image};

/// Immutable vertex list for a triangle mesh.
///
/// Produced once at import time by flattening every face of every mesh in
/// the source file into a flat triangle list. The list is never reordered
/// after construction; whoever loaded it owns it.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    vertices: Vec<Vertex>,
}

impl MeshData {
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Import a triangle mesh from a glTF file.
///
/// Every triangle primitive of every mesh is flattened into one list, in
/// file order. Only positions and the first texture-coordinate set are read;
/// indexed primitives are expanded so the result is a plain triangle list.
/// Primitives without positions, and primitive modes other than triangles,
/// are skipped with a warning.
pub fn import_mesh(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let (document, buffers, _images) = gltf::import(path.as_ref())?;

    let mut vertices = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!(
                    "skipping non-triangle primitive (mode {:?}) in {:?}",
                    primitive.mode(),
                    path.as_ref()
                );
                continue;
            }

            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| b.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                tracing::warn!("skipping primitive without positions in {:?}", path.as_ref());
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_default();
            let uv_at = |i: usize| uvs.get(i).copied().unwrap_or([0.0, 0.0]);

            match reader.read_indices() {
                Some(indices) => {
                    for index in indices.into_u32() {
                        let i = index as usize;
                        if let Some(&position) = positions.get(i) {
                            vertices.push(Vertex::new(position, uv_at(i)));
                        }
                    }
                }
                None => {
                    for (i, &position) in positions.iter().enumerate() {
                        vertices.push(Vertex::new(position, uv_at(i)));
                    }
                }
            }
        }
    }

    if vertices.is_empty() {
        return Err(AssetError::MeshImport(format!(
            "no triangle data in {:?}",
            path.as_ref()
        )));
    }

    tracing::info!("imported {} vertices from {:?}", vertices.len(), path.as_ref());
    Ok(MeshData::from_vertices(vertices))
}

/// Cubemap face names in layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBEMAP_FACE_NAMES: [&str; 6] = ["+x", "-x", "+y", "-y", "+z", "-z"];

/// Load the six faces of a cubemap, in +X, -X, +Y, -Y, +Z, -Z order.
///
/// Any single face failing to decode aborts the whole set, so a partial
/// cubemap never reaches the GPU. Faces must all be squares of the same
/// size; the first offending face is reported.
pub fn load_cubemap_faces(paths: &[impl AsRef<Path>; 6]) -> Result<[ImageData; 6], AssetError> {
    let load = |i: usize| -> Result<ImageData, AssetError> {
        decode_image(paths[i].as_ref()).map_err(|e| AssetError::CubemapFace {
            face: CUBEMAP_FACE_NAMES[i],
            source: Box::new(e),
        })
    };
    let faces = [load(0)?, load(1)?, load(2)?, load(3)?, load(4)?, load(5)?];

    let side = faces[0].width;
    for (face, name) in faces.iter().zip(CUBEMAP_FACE_NAMES) {
        if face.width != side || face.height != side {
            return Err(AssetError::CubemapFaceMismatch {
                face: name,
                width: face.width,
                height: face.height,
            });
        }
    }
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // One indexed triangle: positions (0,0,0) (1,0,0) (0,1,0), matching UVs,
    // u16 indices 0 1 2, packed little-endian into a data URI.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIA",
            "byteLength": 66
        }],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 24},
            {"buffer": 0, "byteOffset": 60, "byteLength": 6}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2"},
            {"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ],
        "meshes": [{
            "primitives": [{
                "attributes": {"POSITION": 0, "TEXCOORD_0": 1},
                "indices": 2
            }]
        }]
    }"#;

    fn write_gltf(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".gltf")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn imports_indexed_triangle() {
        let file = write_gltf(TRIANGLE_GLTF);
        let mesh = import_mesh(file.path()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[0], Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]));
        assert_eq!(mesh.vertices()[1], Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0]));
        assert_eq!(mesh.vertices()[2], Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0]));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(import_mesh("/definitely/not/here.gltf").is_err());
    }

    #[test]
    fn empty_document_is_an_error() {
        let file = write_gltf(r#"{"asset": {"version": "2.0"}}"#);
        let err = import_mesh(file.path());
        assert!(matches!(err, Err(AssetError::MeshImport(_))));
    }

    #[test]
    fn cubemap_failure_names_the_face() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]))
            .save(&good)
            .unwrap();
        let missing = dir.path().join("missing.png");

        let paths = [&good, &good, &good, &missing, &good, &good];
        let err = load_cubemap_faces(&paths).unwrap_err();
        match err {
            AssetError::CubemapFace { face, .. } => assert_eq!(face, "-y"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cubemap_faces_must_match_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.png");
        let large = dir.path().join("large.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]))
            .save(&small)
            .unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save(&large)
            .unwrap();

        let paths = [&small, &small, &large, &small, &small, &small];
        let err = load_cubemap_faces(&paths).unwrap_err();
        assert!(matches!(
            err,
            AssetError::CubemapFaceMismatch { face: "+y", width: 4, height: 4 }
        ));
    }

    #[test]
    fn cubemap_loads_all_six_faces() {
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]))
            .save(&face)
            .unwrap();

        let paths = [&face, &face, &face, &face, &face, &face];
        let faces = load_cubemap_faces(&paths).unwrap();
        assert!(faces.iter().all(|f| f.width == 2 && f.height == 2));
    }
}
