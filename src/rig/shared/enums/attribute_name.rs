#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub enum AttributeName {
    Position,
    Normal,
}
