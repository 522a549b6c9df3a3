pub mod linear;
pub mod tree;

pub use linear::LinearModel;
pub use tree::TreeEnsembleModel;
