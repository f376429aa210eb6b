use crate::rig::shared::SceneGraph;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type SceneHandle = Rc<RefCell<SceneGraph>>;

pub type SceneWeak = Weak<RefCell<SceneGraph>>;
