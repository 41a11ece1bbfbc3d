pub use post_date::*;
pub use sort::*;
pub use validation::*;
pub use video::*;

mod post_date;
mod sort;
mod validation;
mod video;
