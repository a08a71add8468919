/// Scene document model.
pub mod document;
/// Graph loading, rendering and inspection.
pub mod graph;
/// Composite scene nodes.
pub mod node;
/// Drawable nodes and the primitive registry.
pub mod primitive;
pub(crate) mod shapes;
