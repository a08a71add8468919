/// Draw-call types and the `Renderer` trait.
pub mod backend;
/// `vello_cpu` rasterizer.
pub mod cpu;
/// In-memory renderer used for inspection.
pub mod recording;
