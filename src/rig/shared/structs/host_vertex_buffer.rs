use glam::Vec3;
use std::collections::HashMap;

use crate::rig::shared::enums::AttributeName;
use crate::rig::shared::traits::VertexBuffer;

/// CPU-side vertex buffer that keeps the last upload of each attribute.
#[derive(Clone, Debug, Default)]
pub struct HostVertexBuffer {
    streams: HashMap<AttributeName, Vec<u8>>,
    indices: Option<Vec<u32>>,
    upload_count: usize,
}

impl HostVertexBuffer {
    pub fn new() -> Self {
        HostVertexBuffer {
            streams: HashMap::new(),
            indices: None,
            upload_count: 0,
        }
    }

    pub fn bytes(&self, attribute: AttributeName) -> Option<&[u8]> {
        self.streams.get(&attribute).map(Vec::as_slice)
    }

    pub fn read_vec3(&self, attribute: AttributeName) -> Vec<Vec3> {
        self.bytes(attribute)
            .map(bytemuck::allocation::pod_collect_to_vec::<u8, Vec3>)
            .unwrap_or_default()
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Number of attribute uploads so far.
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }
}

impl VertexBuffer for HostVertexBuffer {
    fn update(&mut self, attribute: AttributeName, data: &[u8]) {
        let stream = self.streams.entry(attribute).or_insert_with(Vec::new);
        stream.clear();
        stream.extend_from_slice(data);
        self.upload_count += 1;
    }

    fn update_indices(&mut self, indices: &[u32]) {
        self.indices = Some(indices.to_vec());
    }
}
