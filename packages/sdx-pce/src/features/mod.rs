pub mod path_graph;
pub mod te;
pub mod topology;
