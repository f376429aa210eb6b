/// Maps a source joint path onto the corresponding target joint path.
///
/// `None` (or an empty string) means the source path has no counterpart.
pub trait PathMapping {
    fn map_path(&self, source: &str) -> Option<String>;
}

impl<F> PathMapping for F
where
    F: Fn(&str) -> Option<String>,
{
    fn map_path(&self, source: &str) -> Option<String> {
        self(source)
    }
}
