/// Events emitted during a simulation step.
/// The world consumes these for screen transitions; the host loop logs them.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    TorchLit,
    /// The enemy was given a fresh route of `steps` tiles.
    EnemyRepathed { steps: usize },
    /// The enemy came within the proximity trigger.
    EnemySensed,
    PlayerCaught,
    /// Every edge tile has been seen. Fires once per level.
    LevelExplored,
    HeartBeat { bpm: u32 },
}
