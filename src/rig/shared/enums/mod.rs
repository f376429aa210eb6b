pub mod attribute_name;
pub mod path_segment;
pub use attribute_name::AttributeName;
pub use path_segment::PathSegment;
