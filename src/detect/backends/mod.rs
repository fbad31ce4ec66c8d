mod scripted;
mod stub;

pub use scripted::ScriptedDetector;
pub use stub::StubDetector;
