pub mod annuli;
pub mod constants;
pub mod image;
pub mod lemon_errors;
pub mod offsets;
pub mod passband;
pub mod time;
pub mod xml;

pub use annuli::CandidateAnnuli;
pub use constants::AnnuliMap;
pub use image::ImageDescriptor;
pub use lemon_errors::LemonError;
pub use offsets::{XmlOffset, XmlOffsetFile};
pub use passband::Passband;
pub use xml::XmlEncoding;
