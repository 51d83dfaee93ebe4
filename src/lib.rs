pub mod error;
pub mod grid;
pub mod movement;
pub mod phylogeny;
pub mod reconstruct;
pub mod scenario;
pub mod snapshot;
pub mod speciation;

pub use error::ModelError;
pub use grid::Grid;
pub use movement::{propagate, step, RateParameters};
pub use phylogeny::{Phylogeny, TreeSpec};
pub use reconstruct::{Reconstruction, Reconstructor, StepRule};
pub use speciation::combine;
