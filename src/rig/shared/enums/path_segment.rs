/// One element of an animation track's target path.
///
/// Only `Hierarchy` segments refer to joints and take part in retargeting;
/// the others address a component or property on the resolved node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Hierarchy(String),
    Component(String),
    Property(String),
}

impl PathSegment {
    pub fn hierarchy_path(&self) -> Option<&str> {
        match self {
            PathSegment::Hierarchy(path) => Some(path.as_str()),
            _ => None,
        }
    }
}
