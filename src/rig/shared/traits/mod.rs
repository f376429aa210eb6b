pub mod disposable;
pub mod path_mapping;
pub mod vertex_buffer;
pub use disposable::Disposable;
pub use path_mapping::PathMapping;
pub use vertex_buffer::VertexBuffer;
