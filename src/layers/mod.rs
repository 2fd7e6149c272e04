pub mod dense;
pub mod dropout;
pub mod sequential;
pub mod traits;

pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use sequential::Sequential;
pub use traits::Layer as LayerTrait;
