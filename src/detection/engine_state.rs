/// Scheduling state of the [`super::DetectionEngine`].
///
/// `WaitingForFrame` and `Detecting` are re-evaluated every tick: a camera
/// that stops delivering frames sends the engine back to waiting. There is
/// no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    WaitingForLibrary,
    WaitingForFrame,
    Detecting,
}
