pub mod studio;
pub mod xfund;

pub use studio::{RectangleValue, StudioResult, StudioTask};
pub use xfund::{XfundDataset, XfundDocument, XfundEntity, XfundGenerator, XfundImage};
