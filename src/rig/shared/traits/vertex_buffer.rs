use crate::rig::shared::enums::AttributeName;

/// GPU-facing vertex storage that accepts bulk uploads of one attribute
/// stream at a time.
pub trait VertexBuffer {
    fn update(&mut self, attribute: AttributeName, data: &[u8]);

    /// Called once with the primitive's triangle indices, if it has any.
    fn update_indices(&mut self, indices: &[u32]);
}
