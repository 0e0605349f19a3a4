//! Mesh asset boundary
//!
//! Collider meshes come from a [`MeshSource`]. The source hands back raw
//! positions, an index stream of whatever width the asset uses, and the
//! position extents the asset reports. [`GltfMeshSource`] reads glTF 2.0
//! (`.gltf` and `.glb`) files.

use gltf::accessor::{DataType, Iter as AccessorIter};
use gltf::mesh::util::ReadIndices;
use gltf::mesh::Mode;
use gltf::Semantic;
use void_math::Vec3;

use crate::error::{CollisionError, Result};

/// Index stream of a primitive, in the width the asset stores it
#[derive(Debug, Clone, PartialEq)]
pub enum IndexData {
    /// No index buffer: vertices are consumed in order
    Implicit,
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// Widen to `u32`, checking every index against the vertex count
    pub fn resolve(&self, vertex_count: usize) -> Result<Vec<u32>> {
        fn widen<T: Copy + Into<i64>>(indices: &[T], vertex_count: usize) -> Result<Vec<u32>> {
            indices
                .iter()
                .map(|&i| {
                    let index: i64 = i.into();
                    if index < 0 || index as usize >= vertex_count {
                        Err(CollisionError::IndexOutOfRange { index, vertex_count })
                    } else {
                        Ok(index as u32)
                    }
                })
                .collect()
        }

        let indices = match self {
            IndexData::Implicit => (0..vertex_count as u32).collect(),
            IndexData::I8(i) => widen(i, vertex_count)?,
            IndexData::U8(i) => widen(i, vertex_count)?,
            IndexData::I16(i) => widen(i, vertex_count)?,
            IndexData::U16(i) => widen(i, vertex_count)?,
            IndexData::U32(i) => widen(i, vertex_count)?,
        };

        if indices.len() % 3 != 0 {
            return Err(CollisionError::MalformedMesh(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }
        Ok(indices)
    }

    /// Number of indices, or `None` when implicit
    pub fn len(&self) -> Option<usize> {
        match self {
            IndexData::Implicit => None,
            IndexData::I8(i) => Some(i.len()),
            IndexData::U8(i) => Some(i.len()),
            IndexData::I16(i) => Some(i.len()),
            IndexData::U16(i) => Some(i.len()),
            IndexData::U32(i) => Some(i.len()),
        }
    }
}

/// One triangle list
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub indices: IndexData,
    /// Position extents as reported by the asset
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshPrimitive {
    /// Build a primitive, computing the extents from the positions
    pub fn new(positions: Vec<[f32; 3]>, indices: IndexData) -> Self {
        let (min, max) = extents(&positions);
        Self {
            positions,
            indices,
            min,
            max,
        }
    }

    /// Triangle corners, three per triangle
    pub fn triangles(&self) -> Result<Vec<[Vec3; 3]>> {
        let indices = self.indices.resolve(self.positions.len())?;
        Ok(indices
            .chunks_exact(3)
            .map(|tri| {
                let corner = |i: u32| Vec3::from_array(self.positions[i as usize]);
                [corner(tri[0]), corner(tri[1]), corner(tri[2])]
            })
            .collect())
    }
}

/// Everything a collider mesh is built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub primitives: Vec<MeshPrimitive>,
}

/// Resolves an asset path to mesh data
pub trait MeshSource {
    fn load(&self, path: &str) -> Result<MeshData>;
}

impl<S: MeshSource + ?Sized> MeshSource for &S {
    fn load(&self, path: &str) -> Result<MeshData> {
        (**self).load(path)
    }
}

fn extents(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in positions {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    (min, max)
}

/// Loader for glTF/GLB collider meshes
///
/// Every triangle-list primitive of every mesh in the document is read.
/// Other topologies are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfMeshSource;

impl GltfMeshSource {
    pub fn new() -> Self {
        Self
    }

    /// Load from file bytes (GLB or glTF JSON with embedded buffers)
    pub fn load_slice(&self, data: &[u8], name: &str) -> Result<MeshData> {
        let (document, buffers, _) = gltf::import_slice(data).map_err(|e| CollisionError::MeshLoad {
            path: name.to_string(),
            reason: e.to_string(),
        })?;
        read_document(&document, &buffers, name)
    }
}

impl MeshSource for GltfMeshSource {
    fn load(&self, path: &str) -> Result<MeshData> {
        let (document, buffers, _) = gltf::import(path).map_err(|e| CollisionError::MeshLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        read_document(&document, &buffers, path)
    }
}

fn read_document(document: &gltf::Document, buffers: &[gltf::buffer::Data], path: &str) -> Result<MeshData> {
    let malformed = |reason: String| CollisionError::MeshLoad {
        path: path.to_string(),
        reason,
    };

    let mut primitives = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                log::debug!(
                    "{}: skipping {:?} primitive {} of mesh {}",
                    path,
                    primitive.mode(),
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }

            let get_buffer = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|data| &data.0[..]);
            let reader = primitive.reader(get_buffer);

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| malformed(format!("mesh {} has a primitive without positions", mesh.index())))?
                .collect();

            let indices = match primitive.indices() {
                None => IndexData::Implicit,
                Some(accessor) => match accessor.data_type() {
                    DataType::U8 | DataType::U16 | DataType::U32 => match reader.read_indices() {
                        Some(ReadIndices::U8(iter)) => IndexData::U8(iter.collect()),
                        Some(ReadIndices::U16(iter)) => IndexData::U16(iter.collect()),
                        Some(ReadIndices::U32(iter)) => IndexData::U32(iter.collect()),
                        None => return Err(malformed("index buffer is unreadable".to_string())),
                    },
                    DataType::I8 => IndexData::I8(
                        AccessorIter::<i8>::new(accessor, get_buffer)
                            .ok_or_else(|| malformed("index buffer is unreadable".to_string()))?
                            .collect(),
                    ),
                    DataType::I16 => IndexData::I16(
                        AccessorIter::<i16>::new(accessor, get_buffer)
                            .ok_or_else(|| malformed("index buffer is unreadable".to_string()))?
                            .collect(),
                    ),
                    other => return Err(CollisionError::UnsupportedIndexFormat(format!("{:?}", other))),
                },
            };

            let (min, max) = match primitive.get(&Semantic::Positions).and_then(|a| reported_extents(&a)) {
                Some(extents) => extents,
                None => extents(&positions),
            };

            primitives.push(MeshPrimitive {
                positions,
                indices,
                min,
                max,
            });
        }
    }

    Ok(MeshData { primitives })
}

/// Min/max the asset declares for an accessor
fn reported_extents(accessor: &gltf::Accessor<'_>) -> Option<([f32; 3], [f32; 3])> {
    fn vec3(value: gltf::json::Value) -> Option<[f32; 3]> {
        let values = value.as_array()?;
        if values.len() != 3 {
            return None;
        }
        let mut out = [0.0; 3];
        for (slot, v) in out.iter_mut().zip(values) {
            *slot = v.as_f64()? as f32;
        }
        Some(out)
    }
    Some((vec3(accessor.min()?)?, vec3(accessor.max()?)?))
}
